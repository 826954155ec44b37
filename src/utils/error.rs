use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Token signing error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field} is required")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Keyword source produced no keywords")]
    EmptyKeywords,

    #[error("Ads API failure ({status}): {message}{}", format_details(.details))]
    ProviderError {
        status: String,
        message: String,
        details: Vec<String>,
    },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Spreadsheet request failed ({status}): {message}")]
    SpreadsheetError { status: u16, message: String },
}

fn format_details(details: &[String]) -> String {
    if details.is_empty() {
        String::new()
    } else {
        format!(" [{}]", details.join("; "))
    }
}

/// Error classes surfaced to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provider,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl PipelineError {
    pub fn config(message: impl Into<String>) -> Self {
        PipelineError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::ConfigError { .. }
            | PipelineError::MissingConfigError { .. }
            | PipelineError::InvalidConfigValueError { .. }
            | PipelineError::EmptyKeywords => ErrorCategory::Configuration,
            PipelineError::ProviderError { .. } => ErrorCategory::Provider,
            _ => ErrorCategory::Generic,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PipelineError::HttpError(_) | PipelineError::SpreadsheetError { .. } => {
                ErrorSeverity::Medium
            }
            PipelineError::IoError(_) | PipelineError::JwtError(_) | PipelineError::AuthError { .. } => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    /// Whether a failed provider call may succeed when issued again.
    pub fn is_transient(&self) -> bool {
        match self {
            PipelineError::HttpError(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            // gRPC status names, or "<code> <reason>" when the body was not JSON
            PipelineError::ProviderError { status, .. } => {
                matches!(
                    status.as_str(),
                    "UNAVAILABLE" | "INTERNAL" | "RESOURCE_EXHAUSTED" | "DEADLINE_EXCEEDED"
                ) || status.starts_with('5')
                    || status.starts_with("429")
            }
            _ => false,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 2,
            ErrorCategory::Provider => 3,
            ErrorCategory::Generic => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PipelineError::MissingConfigError { field } => {
                format!("Required setting {} is not set", field)
            }
            PipelineError::EmptyKeywords => {
                "No keywords were found in the configured source".to_string()
            }
            PipelineError::ProviderError { message, .. } => {
                format!("Google Ads rejected the request: {}", message)
            }
            PipelineError::SpreadsheetError { message, .. } => {
                format!("Google Sheets request failed: {}", message)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PipelineError::MissingConfigError { .. } | PipelineError::ConfigError { .. } => {
                "Check the environment variables (ADS_*, SHEET_*, LOCATION_IDS) and retry"
            }
            PipelineError::InvalidConfigValueError { .. } => "Correct the reported value and retry",
            PipelineError::EmptyKeywords => {
                "Add keywords to the sheet range or to the keyword column of the CSV file"
            }
            PipelineError::ProviderError { .. } => {
                "Inspect the failure details; verify the developer token, customer id and constants"
            }
            PipelineError::AuthError { .. } | PipelineError::JwtError(_) => {
                "Refresh the OAuth credentials or the service-account key"
            }
            PipelineError::SpreadsheetError { .. } => {
                "Make sure the spreadsheet is shared with the service-account email"
            }
            PipelineError::HttpError(_) => "Check network connectivity and retry",
            _ => "Check file permissions and paths",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_error_kind() {
        assert_eq!(
            PipelineError::EmptyKeywords.category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            PipelineError::MissingConfigError {
                field: "ADS_CLIENT_ID".to_string()
            }
            .category(),
            ErrorCategory::Configuration
        );
        let provider = PipelineError::ProviderError {
            status: "INVALID_ARGUMENT".to_string(),
            message: "bad".to_string(),
            details: vec![],
        };
        assert_eq!(provider.category(), ErrorCategory::Provider);
        assert_eq!(provider.exit_code(), 3);

        let io = PipelineError::IoError(std::io::Error::other("disk"));
        assert_eq!(io.category(), ErrorCategory::Generic);
        assert_eq!(io.exit_code(), 1);
    }

    #[test]
    fn test_provider_error_display_includes_details() {
        let err = PipelineError::ProviderError {
            status: "INVALID_ARGUMENT".to_string(),
            message: "Request contains an invalid argument.".to_string(),
            details: vec!["Invalid customer ID".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("INVALID_ARGUMENT"));
        assert!(text.contains("[Invalid customer ID]"));
    }

    #[test]
    fn test_transient_statuses() {
        let unavailable = PipelineError::ProviderError {
            status: "UNAVAILABLE".to_string(),
            message: String::new(),
            details: vec![],
        };
        assert!(unavailable.is_transient());

        let invalid = PipelineError::ProviderError {
            status: "PERMISSION_DENIED".to_string(),
            message: String::new(),
            details: vec![],
        };
        assert!(!invalid.is_transient());
        assert!(!PipelineError::EmptyKeywords.is_transient());
    }
}
