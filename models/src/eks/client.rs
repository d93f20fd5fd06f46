use super::error::{self, Result, SdkSource};
use super::{AccessEntryOutcome, AccessGrant, ManagedAddon, NodeGroupInfo};
use crate::cluster::ClusterDetails;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_eks::config::Region;
use aws_sdk_eks::error::DisplayErrorContext;
use aws_sdk_eks::types::{AccessScope, AccessScopeType};
use snafu::{OptionExt, ResultExt};
use tracing::instrument;

#[cfg(feature = "mockall")]
use mockall::{mock, predicate::*};

#[async_trait]
/// A trait providing an interface to the EKS control plane API of a single region. This is provided as a trait
/// in order to allow mocks to be used for testing purposes.
pub trait EksClient: Send + Sync {
    /// Names of every cluster in the region, across all result pages.
    async fn list_clusters(&self) -> Result<Vec<String>>;
    async fn describe_cluster(&self, cluster_name: &str) -> Result<ClusterDetails>;
    /// Create the access entry described by `grant`. An entry that already exists is not an error.
    async fn create_access_entry(&self, grant: &AccessGrant) -> Result<AccessEntryOutcome>;
    /// Associate the grant's access policy, scoped to the grant's namespace.
    async fn associate_access_policy(&self, grant: &AccessGrant) -> Result<()>;
    async fn list_nodegroups(&self, cluster_name: &str) -> Result<Vec<String>>;
    async fn describe_nodegroup(
        &self,
        cluster_name: &str,
        nodegroup_name: &str,
    ) -> Result<NodeGroupInfo>;
    async fn list_addons(&self, cluster_name: &str) -> Result<Vec<String>>;
    async fn describe_addon(&self, cluster_name: &str, addon_name: &str) -> Result<ManagedAddon>;
}

/// Hands out an `EksClient` bound to one region.
pub trait EksClientProvider: Send + Sync {
    type Client: EksClient;

    fn client_for_region(&self, region: &str) -> Self::Client;
}

#[cfg(feature = "mockall")]
mock! {
    /// A Mock EksClient for use in tests.
    pub EksClient {}
    #[async_trait]
    impl EksClient for EksClient {
        async fn list_clusters(&self) -> Result<Vec<String>>;
        async fn describe_cluster(&self, cluster_name: &str) -> Result<ClusterDetails>;
        async fn create_access_entry(&self, grant: &AccessGrant) -> Result<AccessEntryOutcome>;
        async fn associate_access_policy(&self, grant: &AccessGrant) -> Result<()>;
        async fn list_nodegroups(&self, cluster_name: &str) -> Result<Vec<String>>;
        async fn describe_nodegroup(
            &self,
            cluster_name: &str,
            nodegroup_name: &str,
        ) -> Result<NodeGroupInfo>;
        async fn list_addons(&self, cluster_name: &str) -> Result<Vec<String>>;
        async fn describe_addon(&self, cluster_name: &str, addon_name: &str) -> Result<ManagedAddon>;
    }
}

#[cfg(feature = "mockall")]
mock! {
    /// A Mock EksClientProvider for use in tests.
    pub EksClientProvider {}
    impl EksClientProvider for EksClientProvider {
        type Client = MockEksClient;

        fn client_for_region(&self, region: &str) -> MockEksClient;
    }
}

/// Renders an SDK error with its full cause chain, which the SDK's own `Display` omits.
fn sdk_error<E>(err: E) -> SdkSource
where
    E: std::error::Error + Send + Sync + 'static,
{
    DisplayErrorContext(&err).to_string().into()
}

#[derive(Clone, Debug)]
/// Concrete implementation of the `EksClient` trait. This implementation will almost
/// certainly be used in any case that isn't a unit test.
pub struct SdkEksClient {
    client: aws_sdk_eks::Client,
    region: String,
}

impl SdkEksClient {
    pub fn new(client: aws_sdk_eks::Client, region: &str) -> Self {
        SdkEksClient {
            client,
            region: region.to_string(),
        }
    }
}

#[async_trait]
impl EksClient for SdkEksClient {
    #[instrument(skip(self), fields(region = %self.region), err)]
    async fn list_clusters(&self) -> Result<Vec<String>> {
        self.client
            .list_clusters()
            .into_paginator()
            .items()
            .send()
            .collect::<std::result::Result<Vec<_>, _>>()
            .await
            .map_err(sdk_error)
            .context(error::ListClustersSnafu {
                region: &self.region,
            })
    }

    #[instrument(skip(self), fields(region = %self.region), err)]
    async fn describe_cluster(&self, cluster_name: &str) -> Result<ClusterDetails> {
        let response = self
            .client
            .describe_cluster()
            .name(cluster_name)
            .send()
            .await
            .map_err(sdk_error)
            .context(error::DescribeClusterSnafu {
                cluster: cluster_name,
            })?;

        let cluster = response.cluster().context(error::MissingClusterSnafu {
            cluster: cluster_name,
        })?;

        Ok(ClusterDetails {
            name: cluster.name().unwrap_or(cluster_name).to_string(),
            region: self.region.clone(),
            version: cluster.version().unwrap_or_default().to_string(),
            status: cluster
                .status()
                .map(|status| status.as_str().to_string())
                .unwrap_or_default(),
            vpc_id: cluster
                .resources_vpc_config()
                .and_then(|vpc_config| vpc_config.vpc_id())
                .unwrap_or_default()
                .to_string(),
            endpoint: cluster.endpoint().map(str::to_string),
            certificate_authority: cluster
                .certificate_authority()
                .and_then(|certificate| certificate.data())
                .map(str::to_string),
        })
    }

    #[instrument(skip(self), fields(region = %self.region), err)]
    async fn create_access_entry(&self, grant: &AccessGrant) -> Result<AccessEntryOutcome> {
        let result = self
            .client
            .create_access_entry()
            .cluster_name(&grant.cluster.name)
            .principal_arn(&grant.principal_arn)
            .username(&grant.username)
            .set_kubernetes_groups(Some(grant.kubernetes_groups.clone()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(AccessEntryOutcome::Created),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_resource_in_use_exception() {
                    Ok(AccessEntryOutcome::AlreadyExists)
                } else {
                    Err(sdk_error(service_error)).context(error::CreateAccessEntrySnafu {
                        cluster: &grant.cluster.name,
                        principal_arn: &grant.principal_arn,
                    })
                }
            }
        }
    }

    #[instrument(skip(self), fields(region = %self.region), err)]
    async fn associate_access_policy(&self, grant: &AccessGrant) -> Result<()> {
        let access_scope = AccessScope::builder()
            .r#type(AccessScopeType::Namespace)
            .namespaces(&grant.scope_namespace)
            .build();

        self.client
            .associate_access_policy()
            .cluster_name(&grant.cluster.name)
            .principal_arn(&grant.principal_arn)
            .policy_arn(&grant.policy_arn)
            .access_scope(access_scope)
            .send()
            .await
            .map_err(sdk_error)
            .context(error::AssociateAccessPolicySnafu {
                cluster: &grant.cluster.name,
                policy_arn: &grant.policy_arn,
            })?;

        Ok(())
    }

    #[instrument(skip(self), fields(region = %self.region), err)]
    async fn list_nodegroups(&self, cluster_name: &str) -> Result<Vec<String>> {
        self.client
            .list_nodegroups()
            .cluster_name(cluster_name)
            .into_paginator()
            .items()
            .send()
            .collect::<std::result::Result<Vec<_>, _>>()
            .await
            .map_err(sdk_error)
            .context(error::ListNodegroupsSnafu {
                cluster: cluster_name,
            })
    }

    #[instrument(skip(self), fields(region = %self.region), err)]
    async fn describe_nodegroup(
        &self,
        cluster_name: &str,
        nodegroup_name: &str,
    ) -> Result<NodeGroupInfo> {
        let response = self
            .client
            .describe_nodegroup()
            .cluster_name(cluster_name)
            .nodegroup_name(nodegroup_name)
            .send()
            .await
            .map_err(sdk_error)
            .context(error::DescribeNodegroupSnafu {
                cluster: cluster_name,
                nodegroup: nodegroup_name,
            })?;

        let nodegroup = response
            .nodegroup()
            .context(error::MissingNodegroupSnafu {
                cluster: cluster_name,
                nodegroup: nodegroup_name,
            })?;

        Ok(NodeGroupInfo::new(
            nodegroup_name.to_string(),
            nodegroup.instance_types().to_vec(),
            nodegroup
                .ami_type()
                .map(|ami_type| ami_type.as_str().to_string())
                .unwrap_or_default(),
            nodegroup.release_version().unwrap_or_default().to_string(),
        ))
    }

    #[instrument(skip(self), fields(region = %self.region), err)]
    async fn list_addons(&self, cluster_name: &str) -> Result<Vec<String>> {
        self.client
            .list_addons()
            .cluster_name(cluster_name)
            .into_paginator()
            .items()
            .send()
            .collect::<std::result::Result<Vec<_>, _>>()
            .await
            .map_err(sdk_error)
            .context(error::ListAddonsSnafu {
                cluster: cluster_name,
            })
    }

    #[instrument(skip(self), fields(region = %self.region), err)]
    async fn describe_addon(&self, cluster_name: &str, addon_name: &str) -> Result<ManagedAddon> {
        let response = self
            .client
            .describe_addon()
            .cluster_name(cluster_name)
            .addon_name(addon_name)
            .send()
            .await
            .map_err(sdk_error)
            .context(error::DescribeAddonSnafu {
                cluster: cluster_name,
                addon: addon_name,
            })?;

        let addon = response.addon().context(error::MissingAddonSnafu {
            cluster: cluster_name,
            addon: addon_name,
        })?;

        Ok(ManagedAddon {
            name: addon_name.to_string(),
            version: addon.addon_version().unwrap_or_default().to_string(),
            status: addon
                .status()
                .map(|status| status.as_str().to_string())
                .unwrap_or_default(),
            service_account: ManagedAddon::service_account_from_role_arn(
                addon.service_account_role_arn(),
            ),
        })
    }
}

/// Builds region-scoped `SdkEksClient`s from one shared SDK configuration loaded at cold start.
#[derive(Clone, Debug)]
pub struct SdkEksClientProvider {
    shared_config: SdkConfig,
}

impl SdkEksClientProvider {
    pub fn new(shared_config: SdkConfig) -> Self {
        SdkEksClientProvider { shared_config }
    }
}

impl EksClientProvider for SdkEksClientProvider {
    type Client = SdkEksClient;

    fn client_for_region(&self, region: &str) -> SdkEksClient {
        let client_config = aws_sdk_eks::config::Builder::from(&self.shared_config)
            .region(Region::new(region.to_string()))
            .build();
        SdkEksClient::new(aws_sdk_eks::Client::from_conf(client_config), region)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cluster::ClusterRef;
    use aws_sdk_eks::config::retry::RetryConfig;
    use aws_sdk_eks::config::{BehaviorVersion, Credentials};
    use aws_smithy_runtime::client::http::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_types::body::SdkBody;

    const REGION: &str = "us-east-1";

    fn fake_grant() -> AccessGrant {
        AccessGrant::read_only(
            ClusterRef::new("demo", REGION),
            "arn:aws:iam::123456789012:role/eks-reader",
            "arn:aws:eks::aws:cluster-access-policy/AmazonEKSViewPolicy",
            "monitoring",
        )
    }

    /// An `SdkEksClient` whose single HTTP exchange is answered with `status` and an error of type `error_type`.
    fn replaying_client(status: u16, error_type: &str) -> SdkEksClient {
        let request = http::Request::builder()
            .method("POST")
            .uri("https://eks.us-east-1.amazonaws.com/clusters/demo/access-entries")
            .body(SdkBody::empty())
            .unwrap();
        let response = http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .header("x-amzn-errortype", error_type)
            .body(SdkBody::from(format!(
                r#"{{"__type":"{}","message":"canned failure"}}"#,
                error_type
            )))
            .unwrap();
        let http_client = StaticReplayClient::new(vec![ReplayEvent::new(request, response)]);

        let config = aws_sdk_eks::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(REGION))
            .credentials_provider(Credentials::new("AKIDEXAMPLE", "secret", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .http_client(http_client)
            .build();
        SdkEksClient::new(aws_sdk_eks::Client::from_conf(config), REGION)
    }

    #[tokio::test]
    async fn test_existing_access_entry_is_not_an_error() {
        let eks = replaying_client(409, "ResourceInUseException");

        let outcome = eks.create_access_entry(&fake_grant()).await.unwrap();

        assert_eq!(outcome, AccessEntryOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_other_create_access_entry_errors_propagate() {
        let mut test_cases = vec![
            (403, "AccessDeniedException"),
            (404, "ResourceNotFoundException"),
            (400, "InvalidParameterException"),
        ];

        for (status, error_type) in test_cases.drain(..) {
            let eks = replaying_client(status, error_type);

            let result = eks.create_access_entry(&fake_grant()).await;

            match result {
                Err(error::Error::CreateAccessEntry {
                    cluster,
                    principal_arn,
                    ..
                }) => {
                    assert_eq!(cluster, "demo");
                    assert_eq!(principal_arn, "arn:aws:iam::123456789012:role/eks-reader");
                }
                other => panic!("{}: expected CreateAccessEntry error, got {:?}", error_type, other),
            }
        }
    }
}
