use crate::error::{self, Result};
use models::cluster::{ClusterRef, ClusterVersion};
use models::config::ReconcilerConfig;
use models::eks::{AccessEntryOutcome, AccessGrant, EksClient, EksClientProvider};
use models::response::InvocationResponse;

use snafu::ResultExt;
use tracing::{event, instrument, Level};

/// What happened to a single cluster during reconciliation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClusterOutcome {
    /// The access entry exists (newly created or pre-existing) and the policy was associated.
    Granted(AccessEntryOutcome),
    /// The cluster is too old for access entries and was left untouched.
    UnsupportedVersion(String),
}

/// Tallies for the closing log line of an invocation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub already_existed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unlisted_regions: usize,
}

impl ReconcileSummary {
    fn record(&mut self, outcome: &ClusterOutcome) {
        match outcome {
            ClusterOutcome::Granted(AccessEntryOutcome::Created) => self.created += 1,
            ClusterOutcome::Granted(AccessEntryOutcome::AlreadyExists) => {
                self.already_existed += 1
            }
            ClusterOutcome::UnsupportedVersion(_) => self.skipped += 1,
        }
    }
}

/// Grants a principal read-only access to every EKS cluster in a set of regions.
///
/// Each call is attempted exactly once per invocation. Convergence relies on the function being re-invoked on a
/// schedule, which is safe because an existing access entry is treated the same as a newly created one.
pub struct AccessReconciler<P: EksClientProvider> {
    provider: P,
    config: ReconcilerConfig,
}

impl<P: EksClientProvider> AccessReconciler<P> {
    pub fn new(provider: P, config: ReconcilerConfig) -> Self {
        AccessReconciler { provider, config }
    }

    /// Runs one full reconciliation for a Lambda invocation.
    pub async fn handle(&self) -> InvocationResponse {
        let summary = self.reconcile_all().await;
        event!(
            Level::INFO,
            created = summary.created,
            already_existed = summary.already_existed,
            skipped = summary.skipped,
            failed = summary.failed,
            unlisted_regions = summary.unlisted_regions,
            "Access reconciliation finished."
        );
        InvocationResponse::success()
    }

    /// Reconciles every cluster of every configured region, strictly in order.
    ///
    /// Failures are logged and confined to the region or cluster they occur in.
    pub async fn reconcile_all(&self) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        for region in &self.config.regions {
            let eks = self.provider.client_for_region(region);

            let cluster_names = match eks.list_clusters().await {
                Ok(cluster_names) => cluster_names,
                Err(err) => {
                    event!(Level::ERROR, %region, error = %err, "Unable to list clusters; skipping region.");
                    summary.unlisted_regions += 1;
                    continue;
                }
            };
            event!(Level::INFO, %region, clusters = cluster_names.len(), "Listed clusters.");

            for cluster_name in cluster_names {
                let cluster = ClusterRef::new(cluster_name, region.as_str());
                match self.reconcile_cluster(&eks, &cluster).await {
                    Ok(outcome) => summary.record(&outcome),
                    // Logged by instrumentation in `reconcile_cluster()`.
                    Err(_) => summary.failed += 1,
                }
            }
        }

        summary
    }

    /// Ensures the configured principal has a read-only access entry and policy association on one cluster.
    #[instrument(skip(self, eks), fields(cluster = %cluster), err)]
    pub async fn reconcile_cluster(
        &self,
        eks: &P::Client,
        cluster: &ClusterRef,
    ) -> Result<ClusterOutcome> {
        let details = eks
            .describe_cluster(&cluster.name)
            .await
            .context(error::DescribeClusterSnafu {
                cluster: cluster.clone(),
            })?;

        if !self.supports_access_entries(&details.version) {
            event!(
                Level::INFO,
                version = %details.version,
                minimum = %self.config.min_access_entry_version,
                "Cluster version does not support access entries; skipping."
            );
            return Ok(ClusterOutcome::UnsupportedVersion(details.version));
        }

        let grant = AccessGrant::read_only(
            cluster.clone(),
            &self.config.principal_arn,
            &self.config.policy_arn,
            &self.config.namespace,
        );

        let entry_outcome = eks
            .create_access_entry(&grant)
            .await
            .context(error::CreateAccessEntrySnafu {
                cluster: cluster.clone(),
            })?;
        match entry_outcome {
            AccessEntryOutcome::Created => {
                event!(Level::INFO, principal = %grant.principal_arn, "Access entry created.")
            }
            AccessEntryOutcome::AlreadyExists => {
                event!(Level::INFO, principal = %grant.principal_arn, "Access entry already exists.")
            }
        }

        eks.associate_access_policy(&grant)
            .await
            .context(error::AssociateAccessPolicySnafu {
                cluster: cluster.clone(),
            })?;
        event!(
            Level::INFO,
            policy = %grant.policy_arn,
            namespace = %grant.scope_namespace,
            "Access policy associated."
        );

        Ok(ClusterOutcome::Granted(entry_outcome))
    }

    /// Versions that cannot be parsed are treated as unsupported, so nothing is written to an unknown cluster.
    fn supports_access_entries(&self, version: &str) -> bool {
        match version.parse::<ClusterVersion>() {
            Ok(version) => version >= self.config.min_access_entry_version,
            Err(err) => {
                event!(Level::WARN, %version, error = %err, "Unable to parse cluster version.");
                false
            }
        }
    }
}
