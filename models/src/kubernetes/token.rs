/*!
  Mints the short-lived bearer tokens EKS accepts in place of a kubeconfig `exec` plugin: a presigned
  STS `GetCallerIdentity` URL, bound to one cluster through the signed `x-k8s-aws-id` header.
!*/

use super::error::{self, Result};
use crate::cluster::ClusterRef;
use crate::constants::{K8S_AWS_ID_HEADER, K8S_AWS_TOKEN_PREFIX, STS_TOKEN_EXPIRES_IN_SECS};

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SignatureLocation, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use snafu::{OptionExt, ResultExt};
use std::time::{Duration, SystemTime};
use tracing::instrument;

#[cfg(feature = "mockall")]
use mockall::{mock, predicate::*};

#[async_trait]
/// Produces bearer tokens for the Kubernetes API of an EKS cluster.
pub trait TokenSigner: Send + Sync {
    async fn bearer_token(&self, cluster: &ClusterRef) -> Result<String>;
}

#[cfg(feature = "mockall")]
mock! {
    /// A Mock TokenSigner for use in tests.
    pub TokenSigner {}
    #[async_trait]
    impl TokenSigner for TokenSigner {
        async fn bearer_token(&self, cluster: &ClusterRef) -> Result<String>;
    }
}

/// Signs tokens with the credentials of the function's execution role.
#[derive(Clone, Debug)]
pub struct StsTokenSigner {
    credentials_provider: SharedCredentialsProvider,
    expires_in: Duration,
}

impl StsTokenSigner {
    pub fn new(credentials_provider: SharedCredentialsProvider) -> Self {
        StsTokenSigner {
            credentials_provider,
            expires_in: Duration::from_secs(STS_TOKEN_EXPIRES_IN_SECS),
        }
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Result<Self> {
        let credentials_provider = sdk_config
            .credentials_provider()
            .context(error::MissingCredentialsProviderSnafu)?;
        Ok(Self::new(credentials_provider))
    }
}

#[async_trait]
impl TokenSigner for StsTokenSigner {
    #[instrument(skip(self), err)]
    async fn bearer_token(&self, cluster: &ClusterRef) -> Result<String> {
        let credentials = self
            .credentials_provider
            .provide_credentials()
            .await
            .context(error::ProvideCredentialsSnafu)?;
        let identity = Identity::from(credentials);

        let mut signing_settings = SigningSettings::default();
        signing_settings.expires_in = Some(self.expires_in);
        signing_settings.signature_location = SignatureLocation::QueryParams;

        let signing_params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&cluster.region)
            .name("sts")
            .time(SystemTime::now())
            .settings(signing_settings)
            .build()
            .map_err(|err| Box::new(err) as error::BoxedError)
            .context(error::SignRequestSnafu {
                cluster: cluster.clone(),
            })?;

        let url = sts_url(&cluster.region);
        let headers = vec![(K8S_AWS_ID_HEADER, cluster.name.as_str())];
        let signable_request = SignableRequest::new(
            "GET",
            url.as_str(),
            headers.into_iter(),
            SignableBody::Bytes(&[]),
        )
        .map_err(|err| Box::new(err) as error::BoxedError)
        .context(error::SignRequestSnafu {
            cluster: cluster.clone(),
        })?;

        let (signing_instructions, _signature) =
            sign(signable_request, &SigningParams::V4(signing_params))
                .map_err(|err| Box::new(err) as error::BoxedError)
                .context(error::SignRequestSnafu {
                    cluster: cluster.clone(),
                })?
                .into_parts();

        let mut presigned = http::Request::builder()
            .uri(&url)
            .body(())
            .map_err(|err| Box::new(err) as error::BoxedError)
            .context(error::SignRequestSnafu {
                cluster: cluster.clone(),
            })?;
        signing_instructions.apply_to_request_http1x(&mut presigned);

        Ok(encode_token(&presigned.uri().to_string()))
    }
}

fn sts_url(region: &str) -> String {
    format!(
        "https://sts.{}.amazonaws.com/?Action=GetCallerIdentity&Version=2011-06-15",
        region
    )
}

/// Wraps a presigned URL in the `k8s-aws-v1.` token scheme: unpadded URL-safe base64.
pub fn encode_token(presigned_url: &str) -> String {
    format!(
        "{}{}",
        K8S_AWS_TOKEN_PREFIX,
        URL_SAFE_NO_PAD.encode(presigned_url)
    )
}
