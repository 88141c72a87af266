use crate::transport::TransportError;
use thiserror::Error;

/// Where a configuration or input failure came from.
///
/// Rendered after the message as ` (field: .., details: .., source: ..)`,
/// listing only the parts that are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Offending key or argument, e.g. `api_key` or `images[2]`.
    pub field_path: Option<String>,
    pub details: Option<String>,
    /// Raising component, e.g. `client_builder` or `vision_service`.
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(self, path: impl Into<String>) -> Self {
        Self {
            field_path: Some(path.into()),
            ..self
        }
    }

    pub fn with_details(self, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..self
        }
    }

    pub fn with_source(self, source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field_path.is_none() && self.details.is_none() && self.source.is_none()
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let labelled = [
            ("field", &self.field_path),
            ("details", &self.details),
            ("source", &self.source),
        ];
        let mut sep = " (";
        for (label, value) in labelled {
            if let Some(value) = value {
                write!(f, "{}{}: {}", sep, label, value)?;
                sep = ", ";
            }
        }
        f.write_str(")")
    }
}

/// Closed set of failure categories.
///
/// Callers that only need to branch on the category (retry on rate limits,
/// pick another model on `ModelNotFound`, ...) match on this instead of the
/// full [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    ModelNotFound,
    BadRequest,
    Authentication,
    RateLimitExceeded,
    Api,
    Network,
    InvalidInput,
    Serialization,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::ModelNotFound => "model_not_found",
            Self::BadRequest => "bad_request",
            Self::Authentication => "authentication",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::Api => "api",
            Self::Network => "network",
            Self::InvalidInput => "invalid_input",
            Self::Serialization => "serialization",
            Self::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the Gemini client.
///
/// Every failed call ends up in exactly one of these variants; none of them is
/// ever turned into an empty-looking success.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Model not found: {message}")]
    ModelNotFound {
        message: String,
        status: Option<u16>,
    },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded { message: String },

    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{message}: {source}")]
    Network {
        message: String,
        #[source]
        source: TransportError,
    },

    #[error("Invalid input: {message}{context}")]
    InvalidInput {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::invalid_input_with_context(msg, ErrorContext::new())
    }

    pub fn invalid_input_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidInput {
            message: msg.into(),
            context,
        }
    }

    pub fn model_not_found(msg: impl Into<String>) -> Self {
        Error::ModelNotFound {
            message: msg.into(),
            status: None,
        }
    }

    pub fn network(msg: impl Into<String>, source: TransportError) -> Self {
        Error::Network {
            message: msg.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::ModelNotFound { .. } => ErrorKind::ModelNotFound,
            Error::BadRequest { .. } => ErrorKind::BadRequest,
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Error::Api { .. } => ErrorKind::Api,
            Error::Network { .. } => ErrorKind::Network,
            Error::InvalidInput { .. } => ErrorKind::InvalidInput,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// HTTP status of the exchange, when the server answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::ModelNotFound { status, .. } => *status,
            Error::BadRequest { .. } => Some(400),
            Error::Authentication { .. } => Some(401),
            Error::RateLimitExceeded { .. } => Some(429),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a later attempt with the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimitExceeded { .. } | Error::Network { .. } => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::InvalidInput { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_rendered_in_message() {
        let err = Error::configuration_with_context(
            "Gemini API key is not set",
            ErrorContext::new()
                .with_field_path("api_key")
                .with_source("client_builder"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: Gemini API key is not set (field: api_key, source: client_builder)"
        );
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.http_status().is_none());
    }

    #[test]
    fn test_status_for_classified_errors() {
        let cases = [
            (Error::BadRequest { message: "x".into() }, Some(400)),
            (Error::Authentication { message: "x".into() }, Some(401)),
            (Error::RateLimitExceeded { message: "x".into() }, Some(429)),
            (
                Error::ModelNotFound {
                    message: "x".into(),
                    status: Some(404),
                },
                Some(404),
            ),
            (Error::model_not_found("x"), None),
            (
                Error::Api {
                    status: 503,
                    message: "x".into(),
                },
                Some(503),
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.http_status(), status, "{}", err);
        }
    }

    #[test]
    fn test_network_message_includes_cause() {
        let err = Error::network(
            "Network error while connecting to Gemini API",
            TransportError::Other("connection refused".into()),
        );
        assert_eq!(
            err.to_string(),
            "Network error while connecting to Gemini API: Transport error: connection refused"
        );
        assert!(err.is_retryable());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_retryable_classes() {
        assert!(Error::RateLimitExceeded { message: "slow down".into() }.is_retryable());
        assert!(Error::Api {
            status: 500,
            message: "boom".into()
        }
        .is_retryable());
        assert!(!Error::Api {
            status: 418,
            message: "teapot".into()
        }
        .is_retryable());
        assert!(!Error::BadRequest { message: "bad".into() }.is_retryable());
        assert!(!Error::configuration("no key").is_retryable());
    }
}
