//! Environment-supplied configuration for both Lambda functions.
//!
//! Each function reads its configuration once at cold start and hands the resulting struct to its
//! handler. Parsing goes through a lookup function so that tests never touch the process environment.
use crate::cluster::ClusterVersion;
use crate::constants::{
    ACCESS_ENTRY_MIN_VERSION_ENV_VAR, ADDON_CONTROLLER_ENV_VAR, DEFAULT_ACCESS_ENTRY_MIN_VERSION,
    DEFAULT_REPORT_KEY_PREFIX, LAMBDA_ROLE_ARN_ENV_VAR, NAMESPACE_ENV_VAR, POLICY_ARN_ENV_VAR,
    REGIONS_ENV_VAR, REPORT_KEY_PREFIX_ENV_VAR, S3_BUCKET_NAME_ENV_VAR,
};

use snafu::{ensure, OptionExt, ResultExt};
use std::env;

/// The module-wide result type.
pub type Result<T> = std::result::Result<T, config_error::Error>;

/// Configuration for the access reconciler.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReconcilerConfig {
    pub regions: Vec<String>,
    pub principal_arn: String,
    pub namespace: String,
    pub policy_arn: String,
    /// Clusters older than this are left alone.
    pub min_access_entry_version: ClusterVersion,
}

impl ReconcilerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let min_version = lookup(ACCESS_ENTRY_MIN_VERSION_ENV_VAR)
            .unwrap_or_else(|| DEFAULT_ACCESS_ENTRY_MIN_VERSION.to_string());
        let min_access_entry_version =
            min_version
                .parse()
                .context(config_error::MinVersionSnafu {
                    env_value: min_version.clone(),
                })?;

        Ok(ReconcilerConfig {
            regions: regions(&lookup)?,
            principal_arn: required(&lookup, LAMBDA_ROLE_ARN_ENV_VAR)?,
            namespace: required(&lookup, NAMESPACE_ENV_VAR)?,
            policy_arn: required(&lookup, POLICY_ARN_ENV_VAR)?,
            min_access_entry_version,
        })
    }
}

/// Configuration for the cluster reporter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReporterConfig {
    pub regions: Vec<String>,
    pub namespace: String,
    pub bucket_name: String,
    /// Deployments in `namespace` that are reported alongside the managed add-ons.
    pub tracked_deployments: Vec<String>,
    pub report_key_prefix: String,
}

impl ReporterConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(ReporterConfig {
            regions: regions(&lookup)?,
            namespace: required(&lookup, NAMESPACE_ENV_VAR)?,
            bucket_name: required(&lookup, S3_BUCKET_NAME_ENV_VAR)?,
            tracked_deployments: lookup(ADDON_CONTROLLER_ENV_VAR)
                .map(|value| split_list(&value))
                .unwrap_or_default(),
            report_key_prefix: lookup(REPORT_KEY_PREFIX_ENV_VAR)
                .map(|prefix| prefix.trim().to_string())
                .filter(|prefix| !prefix.is_empty())
                .unwrap_or_else(|| DEFAULT_REPORT_KEY_PREFIX.to_string()),
        })
    }
}

/// Splits a comma-separated list, trimming whitespace and dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).context(config_error::MissingVariableSnafu { key })?;
    let value = value.trim().to_string();
    ensure!(!value.is_empty(), config_error::EmptyVariableSnafu { key });
    Ok(value)
}

fn regions<F>(lookup: &F) -> Result<Vec<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let regions = split_list(&required(lookup, REGIONS_ENV_VAR)?);
    ensure!(
        !regions.is_empty(),
        config_error::EmptyVariableSnafu {
            key: REGIONS_ENV_VAR
        }
    );
    Ok(regions)
}

pub mod config_error {
    use crate::cluster;
    use crate::constants::ACCESS_ENTRY_MIN_VERSION_ENV_VAR;
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub))]
    pub enum Error {
        #[snafu(display("Required environment variable '{}' is not set", key))]
        MissingVariable { key: &'static str },

        #[snafu(display("Required environment variable '{}' is empty", key))]
        EmptyVariable { key: &'static str },

        #[snafu(display(
            "Could not parse minimum cluster version from environment variable '{}={}': '{}'",
            ACCESS_ENTRY_MIN_VERSION_ENV_VAR,
            env_value,
            source
        ))]
        MinVersion {
            env_value: String,
            source: cluster::error::Error,
        },
    }
}
