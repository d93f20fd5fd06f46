use crate::error::Result;
use crate::inventory::ClusterInventory;
use crate::store::{report_object_key, ReportStore};
use crate::workbook::render_workbook;
use models::eks::EksClientProvider;
use models::kubernetes::KubeClientFactory;
use models::response::InvocationResponse;

use chrono::{DateTime, Utc};
use tracing::{event, instrument, Level};

/// Inventories every cluster, renders the workbook and stores it under a timestamped key.
pub struct ClusterReporter<P: EksClientProvider, K: KubeClientFactory, S: ReportStore> {
    inventory: ClusterInventory<P, K>,
    store: S,
    key_prefix: String,
}

impl<P, K, S> ClusterReporter<P, K, S>
where
    P: EksClientProvider,
    K: KubeClientFactory,
    S: ReportStore,
{
    pub fn new<T: Into<String>>(inventory: ClusterInventory<P, K>, store: S, key_prefix: T) -> Self {
        ClusterReporter {
            inventory,
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Produces one report stamped with `now`, returning the key it was stored under.
    #[instrument(skip(self), err)]
    pub async fn run(&self, now: DateTime<Utc>) -> Result<String> {
        let reports = self.inventory.collect().await;
        event!(Level::INFO, clusters = reports.len(), "Collected cluster inventory.");

        let workbook = render_workbook(&reports)?;
        let key = report_object_key(&self.key_prefix, now);
        self.store.put_report(&key, workbook).await?;

        event!(Level::INFO, %key, "Cluster report stored.");
        Ok(key)
    }

    /// Runs one report for a Lambda invocation. Failures are logged by `run()` and do not change the response.
    pub async fn handle(&self, now: DateTime<Utc>) -> InvocationResponse {
        let _ = self.run(now).await;
        InvocationResponse::success()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::inventory::test::{fake_config, healthy_eks, provider_with};
    use crate::store::MockReportStore;
    use chrono::TimeZone;
    use mockall::predicate::eq;
    use models::kubernetes::MockKubeClientFactory;

    fn fake_inventory() -> ClusterInventory<models::eks::MockEksClientProvider, MockKubeClientFactory> {
        ClusterInventory::new(
            provider_with(vec![("us-east-1", healthy_eks("us-east-1", &["demo"]))]),
            MockKubeClientFactory::new(),
            &fake_config(&["us-east-1"], &[]),
        )
    }

    #[tokio::test]
    async fn test_run_uploads_timestamped_report() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 14, 3, 9).unwrap();

        let mut store = MockReportStore::new();
        store
            .expect_put_report()
            .withf(|key, report| {
                key == "eks-cluster-info/cluster_info_global_20240517_140309.xlsx"
                    && report.starts_with(b"PK")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let reporter = ClusterReporter::new(
            fake_inventory(),
            store,
            "eks-cluster-info/cluster_info_global",
        );
        let key = reporter.run(now).await.unwrap();

        assert_eq!(key, "eks-cluster-info/cluster_info_global_20240517_140309.xlsx");
    }

    #[tokio::test]
    async fn test_upload_failure_still_succeeds() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 14, 3, 9).unwrap();

        let mut store = MockReportStore::new();
        store
            .expect_put_report()
            .with(eq("reports/global_20240517_140309.xlsx"), mockall::predicate::always())
            .times(1)
            .returning(|key, _| {
                Err(Error::UploadReport {
                    bucket: "cluster-reports".to_string(),
                    key: key.to_string(),
                    source: "AccessDenied".into(),
                })
            });

        let reporter = ClusterReporter::new(fake_inventory(), store, "reports/global");
        let response = reporter.handle(now).await;

        assert_eq!(response, InvocationResponse::success());
    }
}
