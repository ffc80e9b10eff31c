//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Transport-level failure reaching the provider
    #[error("Network error: {0}")]
    Network(String),

    /// Completion was not valid JSON, even after fence stripping and
    /// brace-extraction recovery
    #[error("Parse error: {0}")]
    Parse(String),

    /// Completion parsed as JSON but violates the calling agent's contract
    #[error("Invalid {agent} response: {reason}")]
    InvalidResponse { agent: String, reason: String },

    /// Provider refused the request on safety grounds
    #[error("Safety declined: {0}")]
    SafetyDeclined(String),

    /// Agent name not present in the registry
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::ProviderUnavailable(_) | AgentError::Network(_) | AgentError::Io(_)
        )
    }

    /// Whether the failure is ambiguous between a safety refusal and
    /// unparseable output. Both route to the same recovery path.
    pub fn is_safety_ambiguous(&self) -> bool {
        matches!(self, AgentError::Parse(_) | AgentError::SafetyDeclined(_))
    }

    /// Convert to a user-friendly message. Raw detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Provider(_) | AgentError::Parse(_) | AgentError::InvalidResponse { .. } => {
                "I apologize, but I had trouble processing that. Could you try rephrasing your question?".into()
            }
            AgentError::ProviderUnavailable(_) | AgentError::Network(_) => {
                "The tutoring service is currently unavailable. Please try again.".into()
            }
            AgentError::SafetyDeclined(_) => {
                "I can't help with that request, but I'm happy to explore another topic with you.".into()
            }
            AgentError::UnknownAgent(name) => format!("The agent '{name}' is not available."),
            AgentError::Session(_) => "No active learning session. Please start a new topic.".into(),
            AgentError::Config(_) => "The service is misconfigured. Please contact support.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_ambiguous_classification() {
        assert!(AgentError::Parse("not json".into()).is_safety_ambiguous());
        assert!(AgentError::SafetyDeclined("blocked".into()).is_safety_ambiguous());
        assert!(!AgentError::Network("timeout".into()).is_safety_ambiguous());
        assert!(
            !AgentError::InvalidResponse {
                agent: "question".into(),
                reason: "missing field".into(),
            }
            .is_safety_ambiguous()
        );
    }

    #[test]
    fn test_user_message_never_leaks_detail() {
        let err = AgentError::Parse("raw model output: {broken".into());
        assert!(!err.user_message().contains("broken"));
    }
}
