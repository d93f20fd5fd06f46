use snafu::Snafu;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Opaque upload failure, so that stores other than S3 (and mocks) can report errors.
pub type StoreSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The crate-wide error type.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Unable to write {} to the report: '{}'", item, source))]
    WriteCell {
        item: String,
        source: rust_xlsxwriter::XlsxError,
    },

    #[snafu(display("Unable to serialize the report workbook: '{}'", source))]
    SaveWorkbook { source: rust_xlsxwriter::XlsxError },

    #[snafu(display("Unable to upload report to '{}/{}': '{}'", bucket, key, source))]
    UploadReport {
        bucket: String,
        key: String,
        source: StoreSource,
    },
}
