use serde::Serialize;
use thiserror::Error;

use crate::api_connection::connection::ApiConnectionError;

/// Everything the advisor can fail with, from configuration to response decoding.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("API key not found in environment: {0}")]
    MissingCredential(String),

    #[error("API key in {0} is still a placeholder value, replace it with a real key")]
    PlaceholderCredential(String),

    #[error("a search query is required to generate recipes")]
    MissingQuery,

    #[error("generation service error: {0}")]
    Service(#[from] ApiConnectionError),

    #[error("{0}: the AI response contained no usable records")]
    EmptyResponse(String),

    #[error("{operation}: could not parse the AI response, please try again")]
    MalformedResponse { operation: String, raw: String },

    #[error("{operation}: response does not match the expected shape: {reason}")]
    SchemaViolation { operation: String, reason: String },

    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<AdvisorError>,
    },

    #[error("no meal plan is active, generate one first")]
    NoActivePlan,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of an [`AdvisorError`], stable enough for callers to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    InvalidInput,
    Service,
    EmptyResponse,
    MalformedResponse,
    RetriesExhausted,
    State,
    Storage,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Service => "service",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::RetriesExhausted => "retries_exhausted",
            ErrorKind::State => "state",
            ErrorKind::Storage => "storage",
        }
    }
}

impl AdvisorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdvisorError::MissingCredential(_) | AdvisorError::PlaceholderCredential(_) => {
                ErrorKind::Configuration
            }
            AdvisorError::MissingQuery => ErrorKind::InvalidInput,
            AdvisorError::Service(_) => ErrorKind::Service,
            AdvisorError::EmptyResponse(_) => ErrorKind::EmptyResponse,
            AdvisorError::MalformedResponse { .. } | AdvisorError::SchemaViolation { .. } => {
                ErrorKind::MalformedResponse
            }
            AdvisorError::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            AdvisorError::NoActivePlan => ErrorKind::State,
            AdvisorError::Io(_) | AdvisorError::Serialization(_) => ErrorKind::Storage,
        }
    }

    /// Fatal errors cannot be fixed by calling the service again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::InvalidInput | ErrorKind::State
        )
    }

    /// The innermost error, looking through retry wrappers.
    pub fn root_cause(&self) -> &AdvisorError {
        match self {
            AdvisorError::RetriesExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The raw model output attached to a parse failure, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self.root_cause() {
            AdvisorError::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// What the presentation layer receives: a readable message and a machine flag.
///
/// `code` describes the underlying failure; `attempts` is set when retries ran out.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl From<&AdvisorError> for ErrorReport {
    fn from(err: &AdvisorError) -> Self {
        let attempts = match err {
            AdvisorError::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        };
        ErrorReport {
            message: err.to_string(),
            code: err.root_cause().kind().code(),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_error_mentions_last_cause() {
        let err = AdvisorError::RetriesExhausted {
            operation: "AI recipe generation".to_string(),
            attempts: 3,
            source: Box::new(AdvisorError::EmptyResponse("AI recipe generation".to_string())),
        };
        let message = err.to_string();
        assert!(message.starts_with("AI recipe generation failed after 3 attempts"));
        assert!(message.contains("no usable records"));
        let report = ErrorReport::from(&err);
        assert_eq!(report.code, "empty_response");
        assert_eq!(report.attempts, Some(3));
        assert!(matches!(err.root_cause(), AdvisorError::EmptyResponse(_)));
    }

    #[test]
    fn raw_response_survives_wrapping() {
        let err = AdvisorError::RetriesExhausted {
            operation: "meal plan".to_string(),
            attempts: 3,
            source: Box::new(AdvisorError::MalformedResponse {
                operation: "meal plan".to_string(),
                raw: "{\"title\":".to_string(),
            }),
        };
        assert_eq!(err.raw_response(), Some("{\"title\":"));
    }

    #[test]
    fn configuration_errors_are_fatal() {
        assert!(AdvisorError::MissingCredential("GEMINI_API_KEY".into()).is_fatal());
        assert!(AdvisorError::MissingQuery.is_fatal());
        assert!(!AdvisorError::EmptyResponse("x".into()).is_fatal());
    }
}
