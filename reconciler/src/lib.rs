mod error;
pub mod reconciler;

pub use crate::error::{Error as ReconcileError, Result};
pub use crate::reconciler::{AccessReconciler, ClusterOutcome, ReconcileSummary};
