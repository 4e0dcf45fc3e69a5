//! photoswipe - a swipe-driven photo classification library
//!
//! This crate provides the session engine behind the photoswipe application:
//! a queue of not-yet-classified photos, a gesture state machine that turns
//! drags into decisions, an undoable history and a persisted processed set.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod session;
pub mod tui;

// Re-export primary types for convenience
pub use config::{ResetPolicy, UserConfig};
pub use domain::{
    Asset, AssetId, CollectionId, CollectionSummary, Decision, DecisionEngine,
    DecisionStatistics, HistoryEntry, HistoryFilter, QueueItem,
};
pub use error::{Result, SwipeError};
pub use repository::{AssetRepository, Mutation, RepositoryError};
pub use session::{Session, SessionHandle, SessionSettings, Triage};
