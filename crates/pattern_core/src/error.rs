use thiserror::Error;

use crate::game::DatasetState;

/// Errors raised while loading data, resolving the catalog or running patterns.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Dataset load failed: {0}")]
    DatasetLoad(String),

    #[error("Unknown team: {team_code}")]
    UnknownTeam { team_code: String },

    #[error("Unknown agent: {agent_id}")]
    UnknownAgent { agent_id: String },

    #[error("Pattern {code}: unknown analysis kind '{kind}'")]
    UnknownPatternKind { code: String, kind: String },

    #[error("Pattern {code}: malformed parameters for '{kind}': {message}")]
    MalformedParameter { code: String, kind: String, message: String },

    #[error("Duplicate pattern code: {0}")]
    DuplicatePatternCode(String),

    #[error("Catalog parse error: {0}")]
    Catalog(String),

    #[error("Invalid visualization options: {0}")]
    InvalidVisualization(String),

    #[error("Invalid state: expected {expected:?}, found {found:?}")]
    InvalidState { expected: DatasetState, found: DatasetState },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PatternError {
    pub(crate) fn dataset(msg: impl Into<String>) -> Self {
        PatternError::DatasetLoad(msg.into())
    }

    pub(crate) fn malformed(code: &str, kind: &str, message: impl Into<String>) -> Self {
        PatternError::MalformedParameter {
            code: code.to_string(),
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    /// Configuration errors point at a catalog entry or a parameter, not at the data.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PatternError::UnknownTeam { .. }
                | PatternError::UnknownAgent { .. }
                | PatternError::UnknownPatternKind { .. }
                | PatternError::MalformedParameter { .. }
                | PatternError::DuplicatePatternCode(_)
                | PatternError::Catalog(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PatternError>;
