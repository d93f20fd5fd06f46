// Configuration environment variables
pub const REGIONS_ENV_VAR: &str = "REGIONS";
pub const LAMBDA_ROLE_ARN_ENV_VAR: &str = "LAMBDA_ROLE_ARN";
pub const NAMESPACE_ENV_VAR: &str = "NAMESPACE";
pub const POLICY_ARN_ENV_VAR: &str = "POLICY_ARN";
pub const ACCESS_ENTRY_MIN_VERSION_ENV_VAR: &str = "ACCESS_ENTRY_MIN_VERSION";
pub const S3_BUCKET_NAME_ENV_VAR: &str = "S3_BUCKET_NAME";
pub const ADDON_CONTROLLER_ENV_VAR: &str = "ADDON_CONTROLLER";
pub const REPORT_KEY_PREFIX_ENV_VAR: &str = "REPORT_KEY_PREFIX";

// Access entry constants
pub const ACCESS_ENTRY_USERNAME: &str = "lambda-user";
pub const READ_ONLY_GROUP: &str = "read-only-group";
/// Default cluster version below which the access reconciler leaves a cluster untouched.
pub const DEFAULT_ACCESS_ENTRY_MIN_VERSION: &str = "1.25";

// Report constants
pub const DEFAULT_REPORT_KEY_PREFIX: &str = "eks-cluster-info/cluster_info_global";
pub const REPORT_EXTENSION: &str = "xlsx";
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// Kubernetes authentication constants
pub const K8S_AWS_TOKEN_PREFIX: &str = "k8s-aws-v1.";
pub const K8S_AWS_ID_HEADER: &str = "x-k8s-aws-id";
pub const STS_TOKEN_EXPIRES_IN_SECS: u64 = 60;

pub const SUCCESS_MESSAGE: &str = "Lambda function executed successfully!";
