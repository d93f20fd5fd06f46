use models::cluster::{ClusterDetails, ClusterRef};
use models::config::ReporterConfig;
use models::eks::{EksClient, EksClientError, EksClientProvider};
use models::inventory::{AddonInfo, ClusterReport, TrackedDeployment};
use models::kubernetes::{KubeClientFactory, WorkloadClient};

use tracing::{event, instrument, Level};

/// Gathers a `ClusterReport` for every cluster in the configured regions.
///
/// Nothing here fails as a whole: a region that cannot be listed, or a cluster that cannot be described, is logged
/// and left out of the result.
pub struct ClusterInventory<P: EksClientProvider, K: KubeClientFactory> {
    provider: P,
    kube_clients: K,
    regions: Vec<String>,
    namespace: String,
    tracked_deployments: Vec<String>,
}

impl<P: EksClientProvider, K: KubeClientFactory> ClusterInventory<P, K> {
    pub fn new(provider: P, kube_clients: K, config: &ReporterConfig) -> Self {
        ClusterInventory {
            provider,
            kube_clients,
            regions: config.regions.clone(),
            namespace: config.namespace.clone(),
            tracked_deployments: config.tracked_deployments.clone(),
        }
    }

    /// Reports for every cluster that could be described, in region order and then in listing order.
    pub async fn collect(&self) -> Vec<ClusterReport> {
        let mut reports = Vec::new();

        for region in &self.regions {
            let eks = self.provider.client_for_region(region);

            let cluster_names = match eks.list_clusters().await {
                Ok(cluster_names) => cluster_names,
                Err(err) => {
                    event!(Level::ERROR, %region, error = %err, "Unable to list clusters; skipping region.");
                    continue;
                }
            };

            for cluster_name in cluster_names {
                let cluster = ClusterRef::new(cluster_name, region.as_str());
                let mut report = match self.control_plane_report(&eks, &cluster).await {
                    Ok(report) => report,
                    // Logged by instrumentation in `control_plane_report()`.
                    Err(_) => continue,
                };

                let tracked = self.tracked_deployments(&report.details).await;
                report
                    .addons
                    .extend(tracked.into_iter().map(AddonInfo::TrackedDeployment));

                reports.push(report);
            }
        }

        reports
    }

    /// Everything the EKS API knows about a cluster: its details, node groups and managed add-ons.
    ///
    /// Only failing to describe the cluster or to list its node groups or add-ons drops the cluster. A single node
    /// group or add-on that cannot be described is logged and left out of the report.
    #[instrument(skip(self, eks), fields(cluster = %cluster), err)]
    async fn control_plane_report(
        &self,
        eks: &P::Client,
        cluster: &ClusterRef,
    ) -> std::result::Result<ClusterReport, EksClientError> {
        let details = eks.describe_cluster(&cluster.name).await?;
        let nodegroup_names = eks.list_nodegroups(&cluster.name).await?;
        let addon_names = eks.list_addons(&cluster.name).await?;

        let mut node_groups = Vec::new();
        for nodegroup_name in nodegroup_names {
            match eks.describe_nodegroup(&cluster.name, &nodegroup_name).await {
                Ok(nodegroup) => node_groups.push(nodegroup),
                Err(err) => event!(
                    Level::ERROR,
                    nodegroup = %nodegroup_name,
                    error = %err,
                    "Unable to describe node group; leaving it out of the report."
                ),
            }
        }

        let mut addons = Vec::new();
        for addon_name in addon_names {
            match eks.describe_addon(&cluster.name, &addon_name).await {
                Ok(addon) => addons.push(AddonInfo::Managed(addon)),
                Err(err) => event!(
                    Level::ERROR,
                    addon = %addon_name,
                    error = %err,
                    "Unable to describe add-on; leaving it out of the report."
                ),
            }
        }

        Ok(ClusterReport {
            details,
            node_groups,
            addons,
        })
    }

    /// Looks up each configured Deployment in order. Lookups that fail or find nothing are logged and skipped.
    async fn tracked_deployments(&self, details: &ClusterDetails) -> Vec<TrackedDeployment> {
        if self.tracked_deployments.is_empty() {
            return Vec::new();
        }

        let cluster = details.cluster_ref();
        let workloads = match self.kube_clients.workload_client(details).await {
            Ok(workloads) => workloads,
            Err(err) => {
                event!(
                    Level::ERROR,
                    %cluster,
                    error = %err,
                    "Unable to reach the Kubernetes API; tracked Deployments are omitted."
                );
                return Vec::new();
            }
        };

        let mut found = Vec::new();
        for name in &self.tracked_deployments {
            match workloads.tracked_deployment(&self.namespace, name).await {
                Ok(Some(deployment)) => found.push(deployment),
                Ok(None) => event!(
                    Level::WARN,
                    %cluster,
                    namespace = %self.namespace,
                    deployment = %name,
                    "Deployment not found."
                ),
                Err(err) => event!(
                    Level::ERROR,
                    %cluster,
                    deployment = %name,
                    error = %err,
                    "Unable to read Deployment."
                ),
            }
        }
        found
    }
}
