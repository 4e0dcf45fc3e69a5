//! In-memory repository with failure injection and gated mutations

use super::{AssetRepository, Mutation, RepositoryError};
use crate::domain::{Asset, AssetId, CollectionId, CollectionSummary};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Semaphore;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredCollection {
    id: CollectionId,
    name: String,
    members: Vec<AssetId>,
    accepts_content: bool,
}

#[derive(Debug, Default)]
struct State {
    assets: Vec<Asset>,
    collections: Vec<StoredCollection>,
    favorites: HashSet<AssetId>,
    hidden: HashSet<AssetId>,
    access_denied: bool,
    failing: HashSet<AssetId>,
    applied: Vec<(AssetId, Mutation)>,
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
    gate: Option<Semaphore>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutations wait for [`release_mutations`](Self::release_mutations) before applying
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn with_asset(self, asset: Asset) -> Self {
        self.lock().assets.push(asset);
        self
    }

    pub fn with_collection(
        self,
        id: impl Into<CollectionId>,
        name: &str,
        members: &[&str],
    ) -> Self {
        self.lock().collections.push(StoredCollection {
            id: id.into(),
            name: name.to_string(),
            members: members.iter().map(|m| AssetId::new(*m)).collect(),
            accepts_content: true,
        });
        self
    }

    /// A smart collection: listed, usable as a source, but closed to additions
    pub fn with_read_only_collection(
        self,
        id: impl Into<CollectionId>,
        name: &str,
        members: &[&str],
    ) -> Self {
        self.lock().collections.push(StoredCollection {
            id: id.into(),
            name: name.to_string(),
            members: members.iter().map(|m| AssetId::new(*m)).collect(),
            accepts_content: false,
        });
        self
    }

    pub fn deny_access(&self, denied: bool) {
        self.lock().access_denied = denied;
    }

    /// Every mutation of this asset fails until cleared
    pub fn fail_mutations_for(&self, id: &AssetId, fail: bool) {
        let mut state = self.lock();
        if fail {
            state.failing.insert(id.clone());
        } else {
            state.failing.remove(id);
        }
    }

    pub fn release_mutations(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    pub fn is_favorite(&self, id: &AssetId) -> bool {
        self.lock().favorites.contains(id)
    }

    pub fn is_hidden(&self, id: &AssetId) -> bool {
        self.lock().hidden.contains(id)
    }

    pub fn members_named(&self, name: &str) -> Option<Vec<AssetId>> {
        self.lock()
            .collections
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.members.clone())
    }

    pub fn members_of(&self, id: &CollectionId) -> Option<Vec<AssetId>> {
        self.lock()
            .collections
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.members.clone())
    }

    /// Every mutation that was applied successfully, in order
    pub fn applied(&self) -> Vec<(AssetId, Mutation)> {
        self.lock().applied.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl State {
    fn apply(&mut self, asset_id: &AssetId, mutation: &Mutation) -> Result<(), RepositoryError> {
        if self.failing.contains(asset_id) {
            return Err(RepositoryError::MutationFailed(format!(
                "injected failure for {}",
                asset_id
            )));
        }
        if !self.assets.iter().any(|a| &a.id == asset_id) {
            return Err(RepositoryError::AssetNotFound(asset_id.clone()));
        }

        match mutation {
            Mutation::SetFavorite(true) => {
                self.favorites.insert(asset_id.clone());
            }
            Mutation::SetFavorite(false) => {
                self.favorites.remove(asset_id);
            }
            Mutation::SetHidden(true) => {
                self.hidden.insert(asset_id.clone());
            }
            Mutation::SetHidden(false) => {
                self.hidden.remove(asset_id);
            }
            Mutation::AddToCollection(id) => {
                let collection = self
                    .collections
                    .iter_mut()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| RepositoryError::CollectionNotFound(id.clone()))?;
                if !collection.accepts_content {
                    return Err(RepositoryError::MutationFailed(format!(
                        "collection {} does not accept content",
                        id
                    )));
                }
                if !collection.members.contains(asset_id) {
                    collection.members.push(asset_id.clone());
                }
            }
            Mutation::EnsureCollectionAndAdd(name) => {
                let index = match self.collections.iter().position(|c| &c.name == name) {
                    Some(index) => index,
                    None => {
                        self.collections.push(StoredCollection {
                            id: CollectionId::new(Uuid::new_v4().to_string()),
                            name: name.clone(),
                            members: Vec::new(),
                            accepts_content: true,
                        });
                        self.collections.len() - 1
                    }
                };
                let members = &mut self.collections[index].members;
                if !members.contains(asset_id) {
                    members.push(asset_id.clone());
                }
            }
        }

        self.applied.push((asset_id.clone(), mutation.clone()));
        Ok(())
    }
}

#[async_trait]
impl AssetRepository for InMemoryRepository {
    async fn list_eligible_assets(
        &self,
        source_filter: &BTreeSet<CollectionId>,
    ) -> Result<Vec<Asset>, RepositoryError> {
        let state = self.lock();
        if state.access_denied {
            return Err(RepositoryError::AccessDenied);
        }

        let allowed: Option<HashSet<&AssetId>> = if source_filter.is_empty() {
            None
        } else {
            Some(
                state
                    .collections
                    .iter()
                    .filter(|c| source_filter.contains(&c.id))
                    .flat_map(|c| c.members.iter())
                    .collect(),
            )
        };

        let mut assets: Vec<Asset> = state
            .assets
            .iter()
            .filter(|a| !state.hidden.contains(&a.id))
            .filter(|a| allowed.as_ref().map_or(true, |set| set.contains(&a.id)))
            .cloned()
            .collect();
        assets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(assets)
    }

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, RepositoryError> {
        let state = self.lock();
        if state.access_denied {
            return Err(RepositoryError::AccessDenied);
        }
        Ok(state
            .collections
            .iter()
            .map(|c| CollectionSummary {
                id: c.id.clone(),
                display_name: c.name.clone(),
                item_count: c.members.len(),
                accepts_content: c.accepts_content,
            })
            .collect())
    }

    async fn mutate(&self, asset_id: &AssetId, mutation: &Mutation) -> Result<(), RepositoryError> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| RepositoryError::MutationFailed("mutation gate closed".to_string()))?;
            permit.forget();
        }
        self.lock().apply(asset_id, mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn library() -> InMemoryRepository {
        let now = Utc::now();
        InMemoryRepository::new()
            .with_asset(Asset::new("old", "old.jpg", now - Duration::days(2)))
            .with_asset(Asset::new("new", "new.jpg", now))
            .with_asset(Asset::new("mid", "mid.jpg", now - Duration::days(1)))
            .with_collection("trip", "Trip", &["old", "new"])
            .with_read_only_collection("recent", "Recently Added", &["new"])
    }

    fn ids(assets: &[Asset]) -> Vec<&str> {
        assets.iter().map(|a| a.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_lists_newest_first() {
        let repo = library();
        let assets = repo.list_eligible_assets(&BTreeSet::new()).await.unwrap();
        assert_eq!(ids(&assets), vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_source_filter_restricts_listing() {
        let repo = library();
        let filter: BTreeSet<CollectionId> = [CollectionId::new("trip")].into_iter().collect();
        let assets = repo.list_eligible_assets(&filter).await.unwrap();
        assert_eq!(ids(&assets), vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_hidden_assets_are_not_listed() {
        let repo = library();
        repo.mutate(&AssetId::new("mid"), &Mutation::SetHidden(true))
            .await
            .unwrap();
        let assets = repo.list_eligible_assets(&BTreeSet::new()).await.unwrap();
        assert_eq!(ids(&assets), vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_access_denied() {
        let repo = library();
        repo.deny_access(true);
        let result = repo.list_eligible_assets(&BTreeSet::new()).await;
        assert!(matches!(result, Err(RepositoryError::AccessDenied)));
    }

    #[tokio::test]
    async fn test_ensure_collection_creates_once() {
        let repo = library();
        let trash = Mutation::EnsureCollectionAndAdd("Trash".to_string());
        repo.mutate(&AssetId::new("old"), &trash).await.unwrap();
        repo.mutate(&AssetId::new("mid"), &trash).await.unwrap();

        assert_eq!(
            repo.members_named("Trash").unwrap(),
            vec![AssetId::new("old"), AssetId::new("mid")]
        );
        let collections = repo.list_collections().await.unwrap();
        assert_eq!(collections.iter().filter(|c| c.display_name == "Trash").count(), 1);
    }

    #[tokio::test]
    async fn test_add_to_read_only_collection_fails() {
        let repo = library();
        let result = repo
            .mutate(
                &AssetId::new("old"),
                &Mutation::AddToCollection(CollectionId::new("recent")),
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::MutationFailed(_))));

        let missing = repo
            .mutate(
                &AssetId::new("old"),
                &Mutation::AddToCollection(CollectionId::new("nope")),
            )
            .await;
        assert!(matches!(missing, Err(RepositoryError::CollectionNotFound(_))));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let repo = library();
        let id = AssetId::new("new");
        repo.fail_mutations_for(&id, true);
        assert!(repo.mutate(&id, &Mutation::SetFavorite(true)).await.is_err());
        assert!(!repo.is_favorite(&id));

        repo.fail_mutations_for(&id, false);
        repo.mutate(&id, &Mutation::SetFavorite(true)).await.unwrap();
        assert!(repo.is_favorite(&id));
        assert_eq!(repo.applied().len(), 1);
    }
}
