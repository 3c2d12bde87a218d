//! Error types for Colloquy operations

/// Result type for Colloquy operations
pub type Result<T> = std::result::Result<T, ColloquyError>;

/// Error types for the Colloquy harness
#[derive(Debug, thiserror::Error)]
pub enum ColloquyError {
    /// The agent under evaluation failed
    #[error("Agent error: {0}")]
    Agent(String),

    /// The test script misused the harness
    #[error("Script error: {0}")]
    Script(String),

    /// Agents are single-conversation; reset is never supported
    #[error("Agent reset is not supported; construct a new agent per conversation")]
    ResetUnsupported,

    /// One or more recorded assertions failed, rolled up after the script ran to completion
    #[error("{} assertion(s) failed: {}", .failures.len(), .failures.join("; "))]
    AssertionsFailed {
        /// Description (or failure message) of each failed assertion
        failures: Vec<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Report generation or persistence error
    #[error("Report error: {0}")]
    Report(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ColloquyError {
    fn from(s: String) -> Self {
        ColloquyError::Other(s)
    }
}

impl From<&str> for ColloquyError {
    fn from(s: &str) -> Self {
        ColloquyError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for ColloquyError {
    fn from(err: anyhow::Error) -> Self {
        ColloquyError::Other(err.to_string())
    }
}
