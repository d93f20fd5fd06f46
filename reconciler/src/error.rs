use models::cluster::ClusterRef;
use models::eks::EksClientError;

use snafu::Snafu;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The crate-wide error type. Every variant is scoped to a single cluster.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Unable to read version of cluster '{}': '{}'", cluster, source))]
    DescribeCluster {
        cluster: ClusterRef,
        source: EksClientError,
    },

    #[snafu(display("Unable to create access entry on cluster '{}': '{}'", cluster, source))]
    CreateAccessEntry {
        cluster: ClusterRef,
        source: EksClientError,
    },

    #[snafu(display("Unable to associate access policy on cluster '{}': '{}'", cluster, source))]
    AssociateAccessPolicy {
        cluster: ClusterRef,
        source: EksClientError,
    },
}
