use super::error::{self, Result};
use crate::inventory::TrackedDeployment;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::ResourceExt;
use snafu::ResultExt;
use std::collections::BTreeMap;
use tracing::{event, instrument, Level};

#[cfg(feature = "mockall")]
use mockall::{mock, predicate::*};

#[async_trait]
/// A trait providing an interface to the workloads of one cluster. This is provided as a trait
/// in order to allow mocks to be used for testing purposes.
pub trait WorkloadClient: Send + Sync {
    /// Reads a Deployment and the pods it selects. Returns `None` if the Deployment does not exist.
    async fn tracked_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<TrackedDeployment>>;
}

#[cfg(feature = "mockall")]
mock! {
    /// A Mock WorkloadClient for use in tests.
    pub WorkloadClient {}
    #[async_trait]
    impl WorkloadClient for WorkloadClient {
        async fn tracked_deployment(
            &self,
            namespace: &str,
            name: &str,
        ) -> Result<Option<TrackedDeployment>>;
    }
}

#[derive(Clone)]
/// Concrete implementation of the `WorkloadClient` trait. This implementation will almost
/// certainly be used in any case that isn't a unit test.
pub struct K8sWorkloadClient {
    k8s_client: kube::client::Client,
}

impl K8sWorkloadClient {
    pub fn new(k8s_client: kube::client::Client) -> Self {
        K8sWorkloadClient { k8s_client }
    }
}

#[async_trait]
impl WorkloadClient for K8sWorkloadClient {
    #[instrument(skip(self), err)]
    async fn tracked_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<TrackedDeployment>> {
        let deployments: Api<Deployment> = Api::namespaced(self.k8s_client.clone(), namespace);
        let deployment = match deployments
            .get_opt(name)
            .await
            .context(error::ReadDeploymentSnafu { namespace, name })?
        {
            Some(deployment) => deployment,
            None => return Ok(None),
        };

        let pods = match deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.selector.match_labels.as_ref())
            .and_then(label_selector)
        {
            Some(selector) => {
                let pods: Api<Pod> = Api::namespaced(self.k8s_client.clone(), namespace);
                let list_params = ListParams::default().labels(&selector);
                let pod_list = pods
                    .list(&list_params)
                    .await
                    .context(error::ListDeploymentPodsSnafu { namespace, name })?;
                pod_list
                    .items
                    .into_iter()
                    .map(|pod| pod.name_any())
                    .collect()
            }
            None => {
                event!(
                    Level::WARN,
                    deployment = name,
                    "Deployment has no matchLabels; not listing its pods."
                );
                Vec::new()
            }
        };

        Ok(Some(tracked_deployment(name, &deployment, pods)))
    }
}

fn tracked_deployment(name: &str, deployment: &Deployment, pods: Vec<String>) -> TrackedDeployment {
    let status = deployment.status.as_ref();
    TrackedDeployment {
        name: name.to_string(),
        available_replicas: status
            .and_then(|status| status.available_replicas)
            .unwrap_or_default(),
        replicas: status
            .and_then(|status| status.replicas)
            .unwrap_or_default(),
        service_account: deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.template.spec.as_ref())
            .and_then(|pod_spec| pod_spec.service_account_name.clone()),
        pods,
    }
}

/// Renders `matchLabels` as an equality-based label selector (`k1=v1,k2=v2`).
fn label_selector(match_labels: &BTreeMap<String, String>) -> Option<String> {
    if match_labels.is_empty() {
        return None;
    }
    Some(
        match_labels
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(","),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use k8s_openapi::api::apps::v1::{DeploymentSpec, DeploymentStatus};
    use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
    use maplit::btreemap;

    #[test]
    fn test_label_selector() {
        let mut test_cases = vec![
            (btreemap! {}, None),
            (
                btreemap! { "app".to_string() => "karpenter".to_string() },
                Some("app=karpenter"),
            ),
            (
                btreemap! {
                    "app.kubernetes.io/name".to_string() => "aws-load-balancer-controller".to_string(),
                    "app.kubernetes.io/instance".to_string() => "lbc".to_string(),
                },
                Some("app.kubernetes.io/instance=lbc,app.kubernetes.io/name=aws-load-balancer-controller"),
            ),
        ];

        for (match_labels, expected) in test_cases.drain(..) {
            assert_eq!(
                label_selector(&match_labels),
                expected.map(str::to_string)
            );
        }
    }

    #[test]
    fn test_tracked_deployment_from_deployment() {
        let deployment = Deployment {
            spec: Some(DeploymentSpec {
                selector: LabelSelector {
                    match_labels: Some(btreemap! { "app".to_string() => "karpenter".to_string() }),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    spec: Some(PodSpec {
                        service_account_name: Some("karpenter".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                available_replicas: Some(2),
                replicas: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        };

        let tracked = tracked_deployment(
            "karpenter",
            &deployment,
            vec!["karpenter-1".to_string(), "karpenter-2".to_string()],
        );
        assert_eq!(tracked.availability(), "Available: 2/2");
        assert_eq!(tracked.service_account.as_deref(), Some("karpenter"));
        assert_eq!(tracked.pods.len(), 2);
    }

    #[test]
    fn test_tracked_deployment_without_status() {
        let tracked = tracked_deployment("idle", &Deployment::default(), vec![]);
        assert_eq!(tracked.availability(), "Available: 0/0");
        assert_eq!(tracked.service_account, None);
    }
}
