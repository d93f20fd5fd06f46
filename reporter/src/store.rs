use crate::error::{self, Result, StoreSource};
use models::constants::{REPORT_EXTENSION, REPORT_TIMESTAMP_FORMAT, XLSX_CONTENT_TYPE};

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use snafu::ResultExt;
use tracing::instrument;

#[cfg(test)]
use mockall::mock;

#[async_trait]
/// A trait providing an interface to wherever finished reports are kept. This is provided as a trait
/// in order to allow mocks to be used for testing purposes.
pub trait ReportStore: Send + Sync {
    /// Stores the serialized workbook under `key`, replacing anything already there.
    async fn put_report(&self, key: &str, report: Vec<u8>) -> Result<()>;
}

#[cfg(test)]
mock! {
    /// A Mock ReportStore for use in tests.
    pub ReportStore {}
    #[async_trait]
    impl ReportStore for ReportStore {
        async fn put_report(&self, key: &str, report: Vec<u8>) -> Result<()>;
    }
}

/// Builds the object key for a report generated at `now`: `<prefix>_<YYYYMMDD_HHMMSS>.xlsx`.
pub fn report_object_key(prefix: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        now.format(REPORT_TIMESTAMP_FORMAT),
        REPORT_EXTENSION
    )
}

#[derive(Clone, Debug)]
/// Uploads reports to a single S3 bucket.
pub struct S3ReportStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ReportStore {
    pub fn new<S: Into<String>>(client: aws_sdk_s3::Client, bucket: S) -> Self {
        S3ReportStore {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ReportStore for S3ReportStore {
    #[instrument(skip(self, report), fields(bucket = %self.bucket, bytes = report.len()), err)]
    async fn put_report(&self, key: &str, report: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(XLSX_CONTENT_TYPE)
            .body(ByteStream::from(report))
            .send()
            .await
            .map_err(|err| -> StoreSource { DisplayErrorContext(&err).to_string().into() })
            .context(error::UploadReportSnafu {
                bucket: &self.bucket,
                key,
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_object_key() {
        let mut test_cases = vec![
            (
                "eks-cluster-info/cluster_info_global",
                Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap(),
                "eks-cluster-info/cluster_info_global_20240307_090501.xlsx",
            ),
            (
                "reports/weekly",
                Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap(),
                "reports/weekly_20251231_235959.xlsx",
            ),
        ];

        for (prefix, now, expected) in test_cases.drain(..) {
            assert_eq!(report_object_key(prefix, now), expected);
        }
    }
}
