use super::error::{self, Result};
use super::token::TokenSigner;
use super::workload::{K8sWorkloadClient, WorkloadClient};
use crate::cluster::ClusterDetails;

use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use rustls::crypto::CryptoProvider;
use serde_json::json;
use snafu::{OptionExt, ResultExt};
use std::convert::TryFrom;
use tracing::instrument;

#[cfg(feature = "mockall")]
use super::workload::MockWorkloadClient;
#[cfg(feature = "mockall")]
use mockall::{mock, predicate::*};

const KUBECONFIG_CLUSTER: &str = "cluster";
const KUBECONFIG_CONTEXT: &str = "context";
const KUBECONFIG_USER: &str = "lambda";

#[async_trait]
/// Builds a Kubernetes API client scoped to exactly one EKS cluster.
pub trait KubeClientFactory: Send + Sync {
    type Workloads: WorkloadClient;

    async fn workload_client(&self, cluster: &ClusterDetails) -> Result<Self::Workloads>;
}

#[cfg(feature = "mockall")]
mock! {
    /// A Mock KubeClientFactory for use in tests.
    pub KubeClientFactory {}
    #[async_trait]
    impl KubeClientFactory for KubeClientFactory {
        type Workloads = MockWorkloadClient;

        async fn workload_client(&self, cluster: &ClusterDetails) -> Result<MockWorkloadClient>;
    }
}

/// Creates clients authenticated with a freshly signed token for each cluster.
#[derive(Clone, Debug)]
pub struct SignedKubeClientFactory<S: TokenSigner> {
    signer: S,
}

impl<S: TokenSigner> SignedKubeClientFactory<S> {
    pub fn new(signer: S) -> Self {
        SignedKubeClientFactory { signer }
    }
}

#[async_trait]
impl<S: TokenSigner> KubeClientFactory for SignedKubeClientFactory<S> {
    type Workloads = K8sWorkloadClient;

    #[instrument(skip(self, cluster), fields(cluster = %cluster.cluster_ref()), err)]
    async fn workload_client(&self, cluster: &ClusterDetails) -> Result<K8sWorkloadClient> {
        let token = self.signer.bearer_token(&cluster.cluster_ref()).await?;
        let config = cluster_config(cluster, &token).await?;
        let k8s_client = kube::Client::try_from(config).context(error::ClientCreateSnafu {
            cluster: cluster.cluster_ref(),
        })?;

        Ok(K8sWorkloadClient::new(k8s_client))
    }
}

/// An in-memory kubeconfig with a single cluster, context and token user.
pub fn cluster_kubeconfig(cluster: &ClusterDetails, token: &str) -> Result<Kubeconfig> {
    let endpoint = cluster
        .endpoint
        .as_deref()
        .context(error::MissingEndpointSnafu {
            cluster: cluster.cluster_ref(),
        })?;
    let certificate_authority =
        cluster
            .certificate_authority
            .as_deref()
            .context(error::MissingCertificateAuthoritySnafu {
                cluster: cluster.cluster_ref(),
            })?;

    let kubeconfig = json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{
            "name": KUBECONFIG_CLUSTER,
            "cluster": {
                "server": endpoint,
                "certificate-authority-data": certificate_authority,
            },
        }],
        "contexts": [{
            "name": KUBECONFIG_CONTEXT,
            "context": {
                "cluster": KUBECONFIG_CLUSTER,
                "user": KUBECONFIG_USER,
            },
        }],
        "current-context": KUBECONFIG_CONTEXT,
        "preferences": {},
        "users": [{
            "name": KUBECONFIG_USER,
            "user": { "token": token },
        }],
    });

    serde_json::from_value(kubeconfig).context(error::BuildKubeconfigSnafu {
        cluster: cluster.cluster_ref(),
    })
}

/// Client configuration for one cluster, rebuilt on every call since each cluster has its own
/// endpoint, certificate authority and token.
pub async fn cluster_config(cluster: &ClusterDetails, token: &str) -> Result<kube::Config> {
    let kubeconfig = cluster_kubeconfig(cluster, token)?;
    kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .context(error::LoadKubeconfigSnafu {
            cluster: cluster.cluster_ref(),
        })
}

/// Installs ring as the process-wide rustls crypto provider used by kube's TLS stack.
///
/// Fails if a provider has already been installed, so this belongs in cold start only.
pub fn install_crypto_provider() -> Result<()> {
    CryptoProvider::install_default(rustls::crypto::ring::default_provider())
        .map_err(|_| error::Error::CryptoProvider)
}

#[cfg(test)]
mod test {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine};

    const FAKE_CERTIFICATE: &str =
        "-----BEGIN CERTIFICATE-----\naGVsbG8gY2x1c3Rlcg==\n-----END CERTIFICATE-----\n";

    fn fake_cluster() -> ClusterDetails {
        ClusterDetails {
            name: "demo".to_string(),
            region: "us-east-1".to_string(),
            version: "1.28".to_string(),
            status: "ACTIVE".to_string(),
            vpc_id: "vpc-0123456789abcdef0".to_string(),
            endpoint: Some("https://abcdef0123456789.gr7.us-east-1.eks.amazonaws.com".to_string()),
            certificate_authority: Some(STANDARD.encode(FAKE_CERTIFICATE)),
        }
    }

    #[test]
    fn test_cluster_kubeconfig() {
        let kubeconfig = cluster_kubeconfig(&fake_cluster(), "k8s-aws-v1.token").unwrap();

        assert_eq!(kubeconfig.current_context.as_deref(), Some(KUBECONFIG_CONTEXT));
        assert_eq!(kubeconfig.clusters.len(), 1);
        assert_eq!(kubeconfig.contexts.len(), 1);
        assert_eq!(kubeconfig.auth_infos.len(), 1);
        assert_eq!(kubeconfig.auth_infos[0].name, KUBECONFIG_USER);
    }

    #[test]
    fn test_cluster_kubeconfig_requires_endpoint_and_ca() {
        let mut cluster = fake_cluster();
        cluster.endpoint = None;
        assert!(matches!(
            cluster_kubeconfig(&cluster, "token"),
            Err(error::Error::MissingEndpoint { .. })
        ));

        let mut cluster = fake_cluster();
        cluster.certificate_authority = None;
        assert!(matches!(
            cluster_kubeconfig(&cluster, "token"),
            Err(error::Error::MissingCertificateAuthority { .. })
        ));
    }

    #[tokio::test]
    async fn test_cluster_config() {
        let config = cluster_config(&fake_cluster(), "k8s-aws-v1.token")
            .await
            .unwrap();

        assert_eq!(config.cluster_url.scheme_str(), Some("https"));
        assert_eq!(
            config.cluster_url.host(),
            Some("abcdef0123456789.gr7.us-east-1.eks.amazonaws.com")
        );
        assert!(config.auth_info.token.is_some());
        assert_eq!(config.root_cert.map(|certs| certs.len()), Some(1));
    }

    #[test]
    fn test_crypto_provider_installs_once() {
        // Only the first install in a process can succeed.
        let _ = install_crypto_provider();
        assert!(matches!(
            install_crypto_provider(),
            Err(error::Error::CryptoProvider)
        ));
        assert!(CryptoProvider::get_default().is_some());
    }
}
