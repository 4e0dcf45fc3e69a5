//! Port to the asset repository.
//!
//! The session never talks to a photo library directly; it lists and mutates
//! through [`AssetRepository`]. Adapters live in the submodules.

pub mod dry_run;
pub mod fs;
pub mod memory;

use crate::domain::{Asset, AssetId, CollectionId, CollectionSummary};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io;
use thiserror::Error;

pub use dry_run::DryRunRepository;
pub use fs::FsRepository;
pub use memory::InMemoryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The library refused enumeration; not retried automatically
    #[error("access to the asset library was denied")]
    AccessDenied,

    #[error("mutation failed: {0}")]
    MutationFailed(String),

    #[error("collection not found: {0}")]
    CollectionNotFound(CollectionId),

    #[error("asset not found: {0}")]
    AssetNotFound(AssetId),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A change requested of the repository for one asset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mutation {
    SetFavorite(bool),
    SetHidden(bool),
    AddToCollection(CollectionId),
    /// Adds to the collection with this display name, creating it if absent
    EnsureCollectionAndAdd(String),
}

#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Lists eligible assets, newest first. An empty filter means every asset;
    /// otherwise only members of at least one of the given collections.
    async fn list_eligible_assets(
        &self,
        source_filter: &BTreeSet<CollectionId>,
    ) -> Result<Vec<Asset>, RepositoryError>;

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, RepositoryError>;

    async fn mutate(&self, asset_id: &AssetId, mutation: &Mutation) -> Result<(), RepositoryError>;
}

/// Runs an optional mutation; `None` settles immediately
pub async fn apply_mutation(
    repository: &dyn AssetRepository,
    asset_id: &AssetId,
    mutation: Option<&Mutation>,
) -> Result<(), RepositoryError> {
    match mutation {
        Some(mutation) => repository.mutate(asset_id, mutation).await,
        None => Ok(()),
    }
}
