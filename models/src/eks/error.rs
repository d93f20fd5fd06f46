use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed AWS SDK error. Kept opaque so that mocks can fabricate failures.
pub type SdkSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Unable to list EKS clusters in region '{}': '{}'", region, source))]
    ListClusters { region: String, source: SdkSource },

    #[snafu(display("Unable to describe EKS cluster '{}': '{}'", cluster, source))]
    DescribeCluster { cluster: String, source: SdkSource },

    #[snafu(display("DescribeCluster response for '{}' is missing the cluster", cluster))]
    MissingCluster { cluster: String },

    #[snafu(display(
        "Unable to create access entry for '{}' on cluster '{}': '{}'",
        principal_arn,
        cluster,
        source
    ))]
    CreateAccessEntry {
        cluster: String,
        principal_arn: String,
        source: SdkSource,
    },

    #[snafu(display(
        "Unable to associate access policy '{}' on cluster '{}': '{}'",
        policy_arn,
        cluster,
        source
    ))]
    AssociateAccessPolicy {
        cluster: String,
        policy_arn: String,
        source: SdkSource,
    },

    #[snafu(display("Unable to list node groups of cluster '{}': '{}'", cluster, source))]
    ListNodegroups { cluster: String, source: SdkSource },

    #[snafu(display(
        "Unable to describe node group '{}' of cluster '{}': '{}'",
        nodegroup,
        cluster,
        source
    ))]
    DescribeNodegroup {
        cluster: String,
        nodegroup: String,
        source: SdkSource,
    },

    #[snafu(display(
        "DescribeNodegroup response for '{}' of cluster '{}' is missing the node group",
        nodegroup,
        cluster
    ))]
    MissingNodegroup { cluster: String, nodegroup: String },

    #[snafu(display("Unable to list add-ons of cluster '{}': '{}'", cluster, source))]
    ListAddons { cluster: String, source: SdkSource },

    #[snafu(display(
        "Unable to describe add-on '{}' of cluster '{}': '{}'",
        addon,
        cluster,
        source
    ))]
    DescribeAddon {
        cluster: String,
        addon: String,
        source: SdkSource,
    },

    #[snafu(display(
        "DescribeAddon response for '{}' of cluster '{}' is missing the add-on",
        addon,
        cluster
    ))]
    MissingAddon { cluster: String, addon: String },
}
