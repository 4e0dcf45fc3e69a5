use super::{AssetRepository, Mutation, RepositoryError};
use crate::domain::{Asset, AssetId, CollectionId, CollectionSummary};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Mutex;
use tracing::info;

/// Lists through the wrapped repository but only records mutations
#[derive(Debug)]
pub struct DryRunRepository<R> {
    inner: R,
    skipped: Mutex<Vec<(AssetId, Mutation)>>,
}

impl<R: AssetRepository> DryRunRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            skipped: Mutex::new(Vec::new()),
        }
    }

    /// Mutations that would have been applied, in request order
    pub fn skipped(&self) -> Vec<(AssetId, Mutation)> {
        self.skipped
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl<R: AssetRepository> AssetRepository for DryRunRepository<R> {
    async fn list_eligible_assets(
        &self,
        source_filter: &BTreeSet<CollectionId>,
    ) -> Result<Vec<Asset>, RepositoryError> {
        self.inner.list_eligible_assets(source_filter).await
    }

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, RepositoryError> {
        self.inner.list_collections().await
    }

    async fn mutate(&self, asset_id: &AssetId, mutation: &Mutation) -> Result<(), RepositoryError> {
        info!(asset = %asset_id, ?mutation, "dry run: skipping mutation");
        self.skipped
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((asset_id.clone(), mutation.clone()));
        Ok(())
    }
}
