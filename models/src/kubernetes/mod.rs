//! Per-cluster access to the Kubernetes API of EKS clusters.
mod client;
mod error;
mod token;
mod workload;

pub use self::client::{
    cluster_config, cluster_kubeconfig, install_crypto_provider, KubeClientFactory,
    SignedKubeClientFactory,
};
#[cfg(feature = "mockall")]
pub use self::client::MockKubeClientFactory;
pub use self::error::{Error as KubernetesError, Result};
pub use self::token::{encode_token, StsTokenSigner, TokenSigner};
#[cfg(feature = "mockall")]
pub use self::token::MockTokenSigner;
pub use self::workload::{K8sWorkloadClient, WorkloadClient};
#[cfg(feature = "mockall")]
pub use self::workload::MockWorkloadClient;
