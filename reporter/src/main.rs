use models::config::ReporterConfig;
use models::eks::SdkEksClientProvider;
use models::kubernetes::{install_crypto_provider, SignedKubeClientFactory, StsTokenSigner};
use models::telemetry;
use reporter::{ClusterInventory, ClusterReporter, S3ReportStore};

use chrono::Utc;
use lambda_runtime::{run, service_fn, LambdaEvent};
use serde_json::Value;
use snafu::ResultExt;
use tracing::{event, Level};

/// The module-wide result type.
type Result<T> = std::result::Result<T, reporter_error::Error>;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry_from_env().context(reporter_error::TelemetryInitSnafu)?;
    install_crypto_provider().context(reporter_error::CryptoProviderSnafu)?;

    let config = ReporterConfig::from_env().context(reporter_error::ConfigSnafu)?;
    event!(
        Level::INFO,
        regions = ?config.regions,
        bucket = %config.bucket_name,
        tracked_deployments = ?config.tracked_deployments,
        "Loaded cluster reporter configuration."
    );

    let shared_config = aws_config::load_from_env().await;
    let signer =
        StsTokenSigner::from_sdk_config(&shared_config).context(reporter_error::TokenSignerSnafu)?;
    let store = S3ReportStore::new(aws_sdk_s3::Client::new(&shared_config), &config.bucket_name);
    let inventory = ClusterInventory::new(
        SdkEksClientProvider::new(shared_config),
        SignedKubeClientFactory::new(signer),
        &config,
    );
    let reporter = ClusterReporter::new(inventory, store, &config.report_key_prefix);

    let reporter = &reporter;
    run(service_fn(move |invocation: LambdaEvent<Value>| async move {
        event!(
            Level::INFO,
            request_id = %invocation.context.request_id,
            "Received cluster report request."
        );
        Ok::<_, lambda_runtime::Error>(reporter.handle(Utc::now()).await)
    }))
    .await
    .context(reporter_error::LambdaRuntimeSnafu)
}

pub mod reporter_error {
    use models::kubernetes::KubernetesError;
    use models::{config, telemetry};
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub))]
    pub enum Error {
        #[snafu(display("Error configuring telemetry: '{}'", source))]
        TelemetryInit {
            source: telemetry::TelemetryConfigError,
        },

        #[snafu(display("Unable to set up TLS for Kubernetes clients: '{}'", source))]
        CryptoProvider { source: KubernetesError },

        #[snafu(display("Invalid cluster reporter configuration: '{}'", source))]
        Config { source: config::config_error::Error },

        #[snafu(display("Unable to set up Kubernetes token signing: '{}'", source))]
        TokenSigner { source: KubernetesError },

        #[snafu(display("Lambda runtime exited with an error: '{}'", source))]
        LambdaRuntime { source: lambda_runtime::Error },
    }
}
