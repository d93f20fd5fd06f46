mod client;
mod error;

pub use self::client::{EksClient, EksClientProvider, SdkEksClient, SdkEksClientProvider};
#[cfg(feature = "mockall")]
pub use self::client::{MockEksClient, MockEksClientProvider};
pub use self::error::{Error as EksClientError, Result};

use crate::cluster::ClusterRef;
use crate::constants::{ACCESS_ENTRY_USERNAME, READ_ONLY_GROUP};

use serde::{Deserialize, Serialize};

/// The desired authorization state for one principal on one cluster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub principal_arn: String,
    pub cluster: ClusterRef,
    pub username: String,
    pub kubernetes_groups: Vec<String>,
    pub policy_arn: String,
    pub scope_namespace: String,
}

impl AccessGrant {
    /// A read-only grant for `principal_arn`, with the policy scoped to a single namespace.
    pub fn read_only<S1, S2, S3>(
        cluster: ClusterRef,
        principal_arn: S1,
        policy_arn: S2,
        scope_namespace: S3,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        AccessGrant {
            principal_arn: principal_arn.into(),
            cluster,
            username: ACCESS_ENTRY_USERNAME.to_string(),
            kubernetes_groups: vec![READ_ONLY_GROUP.to_string()],
            policy_arn: policy_arn.into(),
            scope_namespace: scope_namespace.into(),
        }
    }
}

/// The result of attempting to create an access entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AccessEntryOutcome {
    Created,
    AlreadyExists,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NodeGroupInfo {
    pub name: String,
    pub instance_types: Vec<String>,
    pub ami_type: String,
    pub gpu: bool,
    pub release_version: String,
}

impl NodeGroupInfo {
    pub fn new(
        name: String,
        instance_types: Vec<String>,
        ami_type: String,
        release_version: String,
    ) -> Self {
        let gpu = has_gpu_instance_type(&instance_types);
        NodeGroupInfo {
            name,
            instance_types,
            ami_type,
            gpu,
            release_version,
        }
    }
}

/// Accelerated EC2 families (`g*`, `p*`) are treated as GPU nodes.
pub fn has_gpu_instance_type<S: AsRef<str>>(instance_types: &[S]) -> bool {
    instance_types
        .iter()
        .any(|instance_type| instance_type.as_ref().starts_with(['g', 'p']))
}

/// An add-on installed and managed through the EKS add-on API.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ManagedAddon {
    pub name: String,
    pub version: String,
    pub status: String,
    pub service_account: Option<String>,
}

impl ManagedAddon {
    /// EKS only reports the IRSA role ARN; its last path segment names the role.
    pub fn service_account_from_role_arn(role_arn: Option<&str>) -> Option<String> {
        role_arn
            .and_then(|arn| arn.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gpu_detection() {
        let mut test_cases = vec![
            (vec!["m5.large"], false),
            (vec!["m5.large", "g4dn.xlarge"], true),
            (vec!["p3.2xlarge"], true),
            (vec!["c6i.large", "r6g.large"], false),
            (vec![], false),
        ];

        for (instance_types, gpu) in test_cases.drain(..) {
            assert_eq!(has_gpu_instance_type(&instance_types), gpu);
        }
    }

    #[test]
    fn test_service_account_from_role_arn() {
        let mut test_cases = vec![
            (
                Some("arn:aws:iam::123456789012:role/AmazonEKS_EBS_CSI_DriverRole"),
                Some("AmazonEKS_EBS_CSI_DriverRole"),
            ),
            (
                Some("arn:aws:iam::123456789012:role/service-role/vpc-cni"),
                Some("vpc-cni"),
            ),
            (Some(""), None),
            (None, None),
        ];

        for (role_arn, expected) in test_cases.drain(..) {
            assert_eq!(
                ManagedAddon::service_account_from_role_arn(role_arn),
                expected.map(str::to_string)
            );
        }
    }

    #[test]
    fn test_read_only_grant() {
        let grant = AccessGrant::read_only(
            ClusterRef::new("demo", "us-east-1"),
            "arn:aws:iam::123456789012:role/reader",
            "arn:aws:eks::aws:cluster-access-policy/AmazonEKSViewPolicy",
            "monitoring",
        );
        assert_eq!(grant.username, "lambda-user");
        assert_eq!(grant.kubernetes_groups, vec!["read-only-group"]);
        assert_eq!(grant.scope_namespace, "monitoring");
    }
}
