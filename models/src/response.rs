use crate::constants::SUCCESS_MESSAGE;

use serde::{Deserialize, Serialize};

/// The value both functions return to the Lambda runtime.
///
/// Failures inside an invocation are logged rather than surfaced here, so the status is always 200.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// A JSON-encoded string message.
    pub body: String,
}

impl InvocationResponse {
    pub fn success() -> Self {
        InvocationResponse {
            status_code: 200,
            // Serializing a &str cannot fail.
            body: serde_json::to_string(SUCCESS_MESSAGE).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response_shape() {
        let response = serde_json::to_value(InvocationResponse::success()).unwrap();
        assert_eq!(
            response,
            json!({
                "statusCode": 200,
                "body": "\"Lambda function executed successfully!\"",
            })
        );
    }
}
