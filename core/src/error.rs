use thiserror::Error;

use crate::{access::Capability, command::ParseError};

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("'{actor}' lacks capability {capability:?}")]
    Unauthorized { actor: String, capability: Capability },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BotError {
    /// Short stable label for log lines and the command log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Database(_)          => "database",
            Self::Serialization(_)     => "serialization",
            Self::Parse(_)             => "parse",
            Self::Unauthorized { .. }  => "unauthorized",
            Self::Transport(_)         => "transport",
            Self::Other(_)             => "other",
        }
    }
}

pub type BotResult<T> = Result<T, BotError>;
