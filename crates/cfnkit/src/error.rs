//! Error types for stack management operations.
//!
//! Errors carry the remote error code and message so callers can classify
//! them. The category drives retry decisions; the code drives
//! application-level decisions such as the termination-protection fallback
//! in stack deletion.

use thiserror::Error;

/// Message fragment the API returns when a delete is blocked by
/// termination protection.
pub const TERMINATION_PROTECTED_MESSAGE: &str =
    "cannot be deleted while TerminationProtection is enabled";

/// Error code for request validation failures.
pub const VALIDATION_ERROR: &str = "ValidationError";

/// Categories of API errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request rate exceeded (transient, retryable)
    Throttling,
    /// Connectivity problems talking to the endpoint (transient, retryable)
    Network,
    /// The request was rejected as invalid for the current resource state
    Validation,
    /// The referenced resource does not exist
    NotFound,
    /// Missing credentials or insufficient permissions
    AccessDenied,
    /// The `aws` executable could not be found
    CliNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttling | Self::Network)
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Throttling => "Reduce concurrency or retry later",
            Self::Network => "Check your network connection and endpoint region",
            Self::Validation => "Check the stack state and request parameters",
            Self::NotFound => "Verify the resource name or id",
            Self::AccessDenied => "Check credentials and the permissions of the active profile",
            Self::CliNotFound => "Install the AWS CLI v2 and make sure `aws` is on PATH",
            Self::Other => "Check the error details for more information",
        }
    }

    fn from_code(code: &str) -> Self {
        match code {
            "Throttling" | "ThrottlingException" | "Throttled" | "RequestLimitExceeded"
            | "TooManyRequestsException" => Self::Throttling,
            "RequestTimeout" | "RequestTimeoutException" | "ServiceUnavailable"
            | "InternalFailure" | "InternalError" => Self::Network,
            "ValidationError" | "InvalidParameter" | "InvalidParameterValue" => Self::Validation,
            "NotFound" | "NotFoundException" | "StackNotFoundException" => Self::NotFound,
            "AccessDenied" | "AccessDeniedException" | "AuthorizationError" | "ExpiredToken"
            | "UnrecognizedClientException" | "InvalidClientTokenId" => Self::AccessDenied,
            _ => Self::Other,
        }
    }
}

/// Errors that can occur during stack and topic operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Error response returned by the remote API
    #[error("{code}: {message}")]
    Api {
        /// Machine-readable error code (e.g. `ValidationError`)
        code: String,
        /// Human-readable message from the service
        message: String,
    },

    /// Network-level failure before a response was received
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from the failed call
        message: String,
    },

    /// No usable credentials were found
    #[error("credentials error: {message}")]
    Credentials {
        /// Details from the credential provider chain
        message: String,
    },

    /// The `aws` CLI is not installed or not on PATH
    #[error("AWS CLI not found. Install it from https://aws.amazon.com/cli/")]
    CliNotFound,

    /// Command execution failed without a recognizable API error
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for an API error with the given code and message.
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Api { code, .. } => ErrorCategory::from_code(code),
            Error::Network { .. } => ErrorCategory::Network,
            Error::Credentials { .. } => ErrorCategory::AccessDenied,
            Error::CliNotFound => ErrorCategory::CliNotFound,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// The remote error code, if this error came from the API.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The remote error message, if this error came from the API.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Error::Api { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether a delete failed only because termination protection is enabled.
    pub fn is_termination_protected(&self) -> bool {
        match self {
            Error::Api { code, message } => {
                code == VALIDATION_ERROR && message.contains(TERMINATION_PROTECTED_MESSAGE)
            }
            _ => false,
        }
    }

    /// Create an error from `aws` CLI stderr.
    ///
    /// The CLI reports service errors as
    /// `An error occurred (<Code>) when calling the <Operation> operation: <Message>`.
    pub fn from_cli_output(stderr: &str, operation: &str) -> Self {
        let stderr = stderr.trim();

        if let Some((code, message)) = parse_service_error(stderr) {
            return Error::Api { code, message };
        }

        let stderr_lower = stderr.to_lowercase();

        if stderr_lower.contains("could not connect to the endpoint")
            || stderr_lower.contains("connect timeout")
            || stderr_lower.contains("read timeout")
            || stderr_lower.contains("connection was closed")
            || stderr_lower.contains("name or service not known")
        {
            return Error::Network {
                message: stderr.to_string(),
            };
        }

        if stderr_lower.contains("unable to locate credentials")
            || stderr_lower.contains("the config profile")
            || stderr_lower.contains("token has expired")
        {
            return Error::Credentials {
                message: stderr.to_string(),
            };
        }

        Error::CommandFailed {
            message: format!("aws {operation} failed"),
            stderr: stderr.to_string(),
        }
    }
}

fn parse_service_error(stderr: &str) -> Option<(String, String)> {
    let line = stderr
        .lines()
        .find(|l| l.contains("An error occurred ("))?;
    let start = line.find("An error occurred (")? + "An error occurred (".len();
    let rest = &line[start..];
    let end = rest.find(')')?;
    let code = rest[..end].to_string();

    // The CLI may insert "(reached max retries: N)" between the operation
    // name and the message.
    let tail = match rest.find(" operation") {
        Some(i) => &rest[i + " operation".len()..],
        None => &rest[end + 1..],
    };
    let tail = match tail.strip_prefix(" (") {
        Some(inner) => inner.find(')').map(|i| &inner[i + 1..]).unwrap_or(inner),
        None => tail,
    };
    let message = tail.trim_start_matches(':').trim().to_string();
    Some((code, message))
}

/// Result type for stack operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Throttling.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::Validation.is_retryable());
        assert!(!ErrorCategory::AccessDenied.is_retryable());
    }

    #[test]
    fn test_from_cli_output_service_error() {
        let stderr = "\nAn error occurred (ValidationError) when calling the DeleteStack operation: \
                      Stack [web] cannot be deleted while TerminationProtection is enabled\n";
        let err = Error::from_cli_output(stderr, "cloudformation delete-stack");

        assert_eq!(err.code(), Some("ValidationError"));
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.is_termination_protected());
    }

    #[test]
    fn test_from_cli_output_throttling() {
        let stderr = "An error occurred (Throttling) when calling the DescribeStacks operation \
                      (reached max retries: 2): Rate exceeded";
        let err = Error::from_cli_output(stderr, "cloudformation describe-stacks");

        assert_eq!(err.code(), Some("Throttling"));
        assert_eq!(err.api_message(), Some("Rate exceeded"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_cli_output_network() {
        let err = Error::from_cli_output(
            "Could not connect to the endpoint URL: \"https://cloudformation.xx.amazonaws.com/\"",
            "cloudformation describe-stacks",
        );
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_from_cli_output_credentials() {
        let err = Error::from_cli_output(
            "Unable to locate credentials. You can configure credentials by running \"aws configure\".",
            "sns list-topics",
        );
        assert_eq!(err.category(), ErrorCategory::AccessDenied);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_other_validation_error_is_not_protection() {
        let err = Error::api(VALIDATION_ERROR, "Stack with id web does not exist");
        assert!(!err.is_termination_protected());

        let err = Error::api("AccessDenied", TERMINATION_PROTECTED_MESSAGE);
        assert!(!err.is_termination_protected());
    }
}
