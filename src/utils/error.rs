use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntityError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Remote service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("CSV rendering error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid entity name '{name}': {reason}")]
    InvalidEntityName { name: String, reason: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl EntityError {
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(s) if (400..500).contains(&s))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(s) if s >= 500)
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigValidationError { .. }
                | Self::InvalidConfigValueError { .. }
                | Self::MissingConfigError { .. }
                | Self::InvalidEntityName { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Api { status: 401, .. } | Self::Api { status: 403, .. } => {
                "Check the api key or access token"
            }
            Self::Api { status: 404, .. } => "Check the app id, entity name and record id",
            Self::Api { .. } if self.is_server_error() => {
                "The remote service failed; try again later"
            }
            Self::Api { .. } => "The remote service rejected the request body",
            Self::HttpError(_) => "Check the base url and network connectivity",
            Self::SerializationError(_) => "Check that the input is valid JSON",
            Self::IoError(_) => "Check that the file exists and is readable",
            Self::CsvError(_) => "Try --format json instead",
            _ if self.is_config_error() => "Fix the configuration and run again",
            _ => "Run with --verbose for details",
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        if self.is_config_error() {
            2
        } else if self.is_client_error() {
            3
        } else if self.is_server_error() {
            4
        } else {
            1
        }
    }
}

pub type Result<T> = std::result::Result<T, EntityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_classification() {
        let not_found = EntityError::api(404, "no such record");
        assert!(not_found.is_client_error());
        assert!(!not_found.is_server_error());
        assert_eq!(not_found.status(), Some(404));
        assert_eq!(not_found.exit_code(), 3);

        let unavailable = EntityError::api(503, "");
        assert!(unavailable.is_server_error());
        assert_eq!(unavailable.exit_code(), 4);
        assert_eq!(
            unavailable.recovery_suggestion(),
            "The remote service failed; try again later"
        );
    }

    #[test]
    fn test_config_errors_exit_with_two() {
        let err = EntityError::MissingConfigError {
            field: "app_id".to_string(),
        };
        assert!(err.is_config_error());
        assert_eq!(err.status(), None);
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "Missing required configuration: app_id");
    }
}
