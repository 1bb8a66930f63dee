// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::rpc::RpcError;

#[derive(Error, Debug)]
pub enum TaskhelmError {
    /// Local validation failure. Never reaches the backend; surfaced inline
    /// at the point of entry.
    #[error("validation error: {0}")]
    Validation(String),

    /// A backend call was rejected or the scheduler was unreachable. The
    /// triggering operation is abandoned; local state keeps its pre-call
    /// value.
    #[error("{0}")]
    Transport(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaskhelmError {
    /// Wrap an RPC failure with a human-readable operation context, e.g.
    /// `"failed to save task: scheduler unreachable"`.
    pub fn transport(context: impl Into<String>, source: RpcError) -> Self {
        TaskhelmError::Transport(format!("{}: {source}", context.into()))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, TaskhelmError::Validation(_))
    }
}

impl From<RpcError> for TaskhelmError {
    fn from(e: RpcError) -> Self {
        TaskhelmError::Transport(e.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskhelmError>;
