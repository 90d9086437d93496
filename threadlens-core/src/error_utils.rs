use crate::error::*;
use tracing::error;

/// Presentation helpers on the error taxonomy. Every error is terminal for
/// the current run; nothing here drives retries.
pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Llm(e) => {
                error!("LLM error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Config(e) => format!("Configuration problem: {}", e),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => message.clone(),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::Llm(_) => "LLM".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl RedditApiError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::InvalidUrl { url } => {
                format!("\"{}\" does not look like a Reddit thread URL.", url)
            }
            RedditApiError::AuthenticationFailed { .. } | RedditApiError::InvalidToken => {
                "Reddit authentication is required. Start the analysis again to sign in."
                    .to_string()
            }
            RedditApiError::ThreadNotFound { thread_id } => {
                format!("Thread \"{}\" could not be found. It may have been removed.", thread_id)
            }
            RedditApiError::Forbidden { .. } => {
                "Reddit denied access to this thread.".to_string()
            }
            RedditApiError::InvalidResponse { details } => {
                format!("Reddit returned an unexpected response: {}", details)
            }
            RedditApiError::ServerError { status_code } => {
                format!("Reddit is having trouble right now (status {}).", status_code)
            }
        }
    }
}

impl LlmError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            LlmError::Api { message } => format!("The analysis model reported: {}", message),
            LlmError::InvalidResponseFormat { provider, .. } => {
                format!("{} returned a response that could not be read.", provider)
            }
            LlmError::EmptyCompletion { provider } => {
                format!("{} returned an empty completion.", provider)
            }
        }
    }
}
