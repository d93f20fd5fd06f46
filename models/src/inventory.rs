use crate::cluster::ClusterDetails;
use crate::eks::{ManagedAddon, NodeGroupInfo};

/// A controller deployed as a plain Deployment rather than through the EKS add-on API.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TrackedDeployment {
    pub name: String,
    pub available_replicas: i32,
    pub replicas: i32,
    pub service_account: Option<String>,
    /// Pods selected by the Deployment's `matchLabels`.
    pub pods: Vec<String>,
}

impl TrackedDeployment {
    pub fn availability(&self) -> String {
        format!("Available: {}/{}", self.available_replicas, self.replicas)
    }
}

/// One row of the add-on table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AddonInfo {
    Managed(ManagedAddon),
    TrackedDeployment(TrackedDeployment),
}

impl AddonInfo {
    pub fn name(&self) -> &str {
        match self {
            AddonInfo::Managed(addon) => &addon.name,
            AddonInfo::TrackedDeployment(deployment) => &deployment.name,
        }
    }

    /// Tracked Deployments carry no add-on version.
    pub fn version(&self) -> &str {
        match self {
            AddonInfo::Managed(addon) => &addon.version,
            AddonInfo::TrackedDeployment(_) => "",
        }
    }

    pub fn status(&self) -> String {
        match self {
            AddonInfo::Managed(addon) => addon.status.clone(),
            AddonInfo::TrackedDeployment(deployment) => deployment.availability(),
        }
    }

    pub fn service_account(&self) -> Option<&str> {
        match self {
            AddonInfo::Managed(addon) => addon.service_account.as_deref(),
            AddonInfo::TrackedDeployment(deployment) => deployment.service_account.as_deref(),
        }
    }

    pub fn pods(&self) -> &[String] {
        match self {
            AddonInfo::Managed(_) => &[],
            AddonInfo::TrackedDeployment(deployment) => &deployment.pods,
        }
    }
}

/// Everything gathered about one cluster during a single report run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClusterReport {
    pub details: ClusterDetails,
    pub node_groups: Vec<NodeGroupInfo>,
    pub addons: Vec<AddonInfo>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_addon_columns() {
        let managed = AddonInfo::Managed(ManagedAddon {
            name: "vpc-cni".to_string(),
            version: "v1.18.1-eksbuild.1".to_string(),
            status: "ACTIVE".to_string(),
            service_account: None,
        });
        assert_eq!(managed.name(), "vpc-cni");
        assert_eq!(managed.version(), "v1.18.1-eksbuild.1");
        assert_eq!(managed.status(), "ACTIVE");
        assert!(managed.pods().is_empty());

        let tracked = AddonInfo::TrackedDeployment(TrackedDeployment {
            name: "karpenter".to_string(),
            available_replicas: 1,
            replicas: 2,
            service_account: Some("karpenter".to_string()),
            pods: vec!["karpenter-5d8f-abcde".to_string()],
        });
        assert_eq!(tracked.version(), "");
        assert_eq!(tracked.status(), "Available: 1/2");
        assert_eq!(tracked.service_account(), Some("karpenter"));
        assert_eq!(tracked.pods().len(), 1);
    }
}
