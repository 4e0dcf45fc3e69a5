//! Error types shared across the crate

use crate::domain::AssetId;
use crate::repository::RepositoryError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwipeError {
    /// The asset repository rejected a request
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no item is currently presented")]
    NoCurrentItem,

    /// A commit for this asset is still waiting on its repository mutation
    #[error("a commit for asset {0} is already pending")]
    CommitPending(AssetId),

    #[error("an undo for asset {0} is already pending")]
    UndoPending(AssetId),

    #[error("no undoable history entry for asset {0}")]
    NotFound(AssetId),

    #[error("unknown or already settled operation ticket {0}")]
    UnknownTicket(u64),

    #[error("session actor has shut down")]
    ActorClosed,
}

pub type Result<T> = std::result::Result<T, SwipeError>;
