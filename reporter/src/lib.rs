mod error;
pub mod inventory;
pub mod reporter;
pub mod store;
pub mod workbook;

pub use crate::error::{Error as ReportError, Result};
pub use crate::inventory::ClusterInventory;
pub use crate::reporter::ClusterReporter;
pub use crate::store::{report_object_key, ReportStore, S3ReportStore};
