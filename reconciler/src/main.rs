use models::config::ReconcilerConfig;
use models::eks::SdkEksClientProvider;
use models::telemetry;
use reconciler::AccessReconciler;

use lambda_runtime::{run, service_fn, LambdaEvent};
use serde_json::Value;
use snafu::ResultExt;
use tracing::{event, Level};

/// The module-wide result type.
type Result<T> = std::result::Result<T, reconciler_error::Error>;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry_from_env().context(reconciler_error::TelemetryInitSnafu)?;

    let config = ReconcilerConfig::from_env().context(reconciler_error::ConfigSnafu)?;
    event!(
        Level::INFO,
        regions = ?config.regions,
        minimum_version = %config.min_access_entry_version,
        "Loaded access reconciler configuration."
    );

    let shared_config = aws_config::load_from_env().await;
    let reconciler = AccessReconciler::new(SdkEksClientProvider::new(shared_config), config);

    let reconciler = &reconciler;
    run(service_fn(move |invocation: LambdaEvent<Value>| async move {
        event!(
            Level::INFO,
            request_id = %invocation.context.request_id,
            "Received access reconciliation request."
        );
        Ok::<_, lambda_runtime::Error>(reconciler.handle().await)
    }))
    .await
    .context(reconciler_error::LambdaRuntimeSnafu)
}

pub mod reconciler_error {
    use models::{config, telemetry};
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub))]
    pub enum Error {
        #[snafu(display("Error configuring telemetry: '{}'", source))]
        TelemetryInit {
            source: telemetry::TelemetryConfigError,
        },

        #[snafu(display("Invalid access reconciler configuration: '{}'", source))]
        Config { source: config::config_error::Error },

        #[snafu(display("Lambda runtime exited with an error: '{}'", source))]
        LambdaRuntime { source: lambda_runtime::Error },
    }
}
