use crate::cluster::ClusterRef;

use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to install the rustls crypto provider"))]
    CryptoProvider,

    #[snafu(display("The AWS SDK configuration has no credentials provider"))]
    MissingCredentialsProvider,

    #[snafu(display("Unable to resolve AWS credentials: '{}'", source))]
    ProvideCredentials {
        source: aws_credential_types::provider::error::CredentialsError,
    },

    #[snafu(display("Unable to presign the token request for cluster '{}': '{}'", cluster, source))]
    SignRequest {
        cluster: ClusterRef,
        source: BoxedError,
    },

    #[snafu(display("Cluster '{}' reports no API server endpoint", cluster))]
    MissingEndpoint { cluster: ClusterRef },

    #[snafu(display("Cluster '{}' reports no certificate authority data", cluster))]
    MissingCertificateAuthority { cluster: ClusterRef },

    #[snafu(display("Unable to build kubeconfig for cluster '{}': '{}'", cluster, source))]
    BuildKubeconfig {
        cluster: ClusterRef,
        source: serde_json::Error,
    },

    #[snafu(display("Unable to load kubeconfig for cluster '{}': '{}'", cluster, source))]
    LoadKubeconfig {
        cluster: ClusterRef,
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("Unable to create Kubernetes client for cluster '{}': '{}'", cluster, source))]
    ClientCreate {
        cluster: ClusterRef,
        source: kube::Error,
    },

    #[snafu(display(
        "Unable to read Deployment '{}' in namespace '{}': '{}'",
        name,
        namespace,
        source
    ))]
    ReadDeployment {
        namespace: String,
        name: String,
        source: kube::Error,
    },

    #[snafu(display(
        "Unable to list pods of Deployment '{}' in namespace '{}': '{}'",
        name,
        namespace,
        source
    ))]
    ListDeploymentPods {
        namespace: String,
        name: String,
        source: kube::Error,
    },
}
