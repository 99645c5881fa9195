use std::fmt;
use thiserror::Error;

pub const HINT_ENABLE_MODEL_ACCESS: &str =
    "Enable access to this model in the Bedrock console (Model access) for the selected region.";
pub const HINT_CHECK_CREDENTIALS: &str =
    "Check your AWS credentials and that the IAM policy allows bedrock:InvokeModel.";
pub const HINT_RETRY_LATER: &str = "Bedrock is throttling requests. Wait a moment and retry.";

/// What exactly was wrong with a model response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseDefect {
    NotJson(String),
    UnexpectedShape(String),
    NoImage,
    InvalidBase64(String),
    ContentFiltered(String),
}

impl fmt::Display for ResponseDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseDefect::NotJson(msg) => write!(f, "body is not JSON: {}", msg),
            ResponseDefect::UnexpectedShape(msg) => write!(f, "unexpected body shape: {}", msg),
            ResponseDefect::NoImage => write!(f, "no image produced"),
            ResponseDefect::InvalidBase64(msg) => write!(f, "image is not valid base64: {}", msg),
            ResponseDefect::ContentFiltered(msg) => write!(f, "image was filtered: {}", msg),
        }
    }
}

#[derive(Debug, Error)]
pub enum BedrockError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("Bedrock rejected the request: {0}")]
    RemoteValidation(String),
    #[error("Bedrock denied access: {0}")]
    RemoteAccessDenied(String),
    #[error("Bedrock throttled the request: {0}")]
    RemoteThrottled(String),
    #[error("Malformed model response: {0}")]
    MalformedResponse(ResponseDefect),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Model invocation timed out after {0}s")]
    Timeout(u64),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse category used when an error is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidInput,
    UnsupportedModel,
    RemoteValidation,
    RemoteAccessDenied,
    RemoteThrottled,
    MalformedResponse,
    TransportFailure,
}

impl BedrockError {
    /// Classify a Bedrock service error from its machine-readable code.
    pub fn from_service_code(code: Option<&str>, message: Option<&str>) -> Self {
        let message = message.unwrap_or("no message").to_string();
        match code {
            Some("ValidationException") => BedrockError::RemoteValidation(message),
            Some("AccessDeniedException") => BedrockError::RemoteAccessDenied(message),
            Some("ThrottlingException")
            | Some("ServiceQuotaExceededException")
            | Some("TooManyRequestsException") => BedrockError::RemoteThrottled(message),
            Some(other) => BedrockError::Transport(format!("{}: {}", other, message)),
            None => BedrockError::Transport(message),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BedrockError::InvalidInput(_) | BedrockError::InvalidImage(_) => {
                ErrorCategory::InvalidInput
            }
            BedrockError::UnsupportedModel(_) => ErrorCategory::UnsupportedModel,
            BedrockError::RemoteValidation(_) => ErrorCategory::RemoteValidation,
            BedrockError::RemoteAccessDenied(_) => ErrorCategory::RemoteAccessDenied,
            BedrockError::RemoteThrottled(_) => ErrorCategory::RemoteThrottled,
            BedrockError::MalformedResponse(_) => ErrorCategory::MalformedResponse,
            BedrockError::Transport(_)
            | BedrockError::Timeout(_)
            | BedrockError::ConfigError(_)
            | BedrockError::SerializationError(_)
            | BedrockError::Io(_) => ErrorCategory::TransportFailure,
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self.category() {
            ErrorCategory::RemoteValidation => Some(HINT_ENABLE_MODEL_ACCESS),
            ErrorCategory::RemoteAccessDenied => Some(HINT_CHECK_CREDENTIALS),
            ErrorCategory::RemoteThrottled => Some(HINT_RETRY_LATER),
            _ => None,
        }
    }

    /// Message for display at the action boundary, remote failures get their hint appended.
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::TransportFailure => format!("Failed to generate image: {}", self),
            _ => match self.hint() {
                Some(hint) => format!("{} {}", self, hint),
                None => self.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, BedrockError>;
