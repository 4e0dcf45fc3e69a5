use super::{PendingCommit, PendingUndo, Session, SessionSettings};
use crate::domain::{AssetId, CollectionId, CollectionSummary, Decision, GestureUpdate, ProcessedStore};
use crate::error::Result;
use crate::repository::{apply_mutation, AssetRepository, RepositoryError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs a [`Session`] against a repository, awaiting each mutation inline
pub struct Triage {
    session: Session,
    repository: Arc<dyn AssetRepository>,
}

impl Triage {
    pub fn new(session: Session, repository: Arc<dyn AssetRepository>) -> Self {
        Self {
            session,
            repository,
        }
    }

    /// Opens a session, builds its queue and resolves the destination albums
    pub async fn open(
        repository: Arc<dyn AssetRepository>,
        store: Box<dyn ProcessedStore>,
        settings: SessionSettings,
        source_filter: BTreeSet<CollectionId>,
        destinations: Vec<CollectionId>,
    ) -> Result<Self> {
        let mut session = Session::new(store, settings)?;
        session.set_source_filter(source_filter);

        let mut triage = Self::new(session, repository);
        triage.reload().await?;
        triage.set_destination_albums(destinations).await?;
        Ok(triage)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn repository(&self) -> &Arc<dyn AssetRepository> {
        &self.repository
    }

    /// Re-lists under the current source filter and rebuilds the queue
    pub async fn reload(&mut self) -> Result<()> {
        let filter = self.session.source_filter().clone();
        let listing = self.repository.list_eligible_assets(&filter).await;
        self.session.rebuild(listing)
    }

    /// Returns true when the filter changed and the queue was rebuilt
    pub async fn set_source_filter(&mut self, filter: BTreeSet<CollectionId>) -> Result<bool> {
        if !self.session.set_source_filter(filter) {
            return Ok(false);
        }
        self.reload().await?;
        Ok(true)
    }

    /// Keeps the given order, dropping duplicates and albums that are unknown
    /// or closed to new content
    pub async fn set_destination_albums(&mut self, albums: Vec<CollectionId>) -> Result<()> {
        if albums.is_empty() {
            self.session.set_destination_albums(albums);
            return Ok(());
        }

        let collections = match self.repository.list_collections().await {
            Ok(collections) => collections,
            Err(RepositoryError::AccessDenied) => {
                warn!("asset library access denied; no destination albums");
                self.session.set_destination_albums(Vec::new());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let eligible = albums
            .into_iter()
            .filter(|album| {
                let accepts = collections
                    .iter()
                    .any(|c| &c.id == album && c.accepts_content);
                if !accepts {
                    warn!(album = %album, "ignoring destination that does not accept content");
                }
                accepts
            })
            .collect();
        self.session.set_destination_albums(eligible);
        Ok(())
    }

    pub async fn collections(&self) -> Result<Vec<CollectionSummary>> {
        Ok(self.repository.list_collections().await?)
    }

    pub fn gesture_start(&mut self) -> bool {
        self.session.gesture_start()
    }

    pub fn gesture_update(&mut self, update: GestureUpdate) {
        self.session.gesture_update(update);
    }

    /// Ends the drag and carries out a committed decision
    pub async fn finish_gesture(&mut self) -> Result<Option<Decision>> {
        let Some(pending) = self.session.gesture_end()? else {
            return Ok(None);
        };
        let decision = pending.decision.clone();
        self.execute_commit(pending).await?;
        Ok(Some(decision))
    }

    /// Commits `decision` for the current item
    pub async fn commit(&mut self, decision: Decision) -> Result<()> {
        let pending = self.session.commit(decision)?;
        self.execute_commit(pending).await
    }

    /// Undoes the newest live decision. Returns the asset put back in front.
    pub async fn undo_last(&mut self) -> Result<Option<AssetId>> {
        let Some(pending) = self.session.begin_undo_last() else {
            return Ok(None);
        };
        let asset_id = pending.asset_id.clone();
        self.execute_undo(pending).await?;
        Ok(Some(asset_id))
    }

    /// Undoes the live decision for `id`. False when there is none or the
    /// reversal failed.
    pub async fn undo_by_id(&mut self, id: &AssetId) -> bool {
        let pending = match self.session.begin_undo(id) {
            Ok(pending) => pending,
            Err(e) => {
                debug!(asset = %id, error = %e, "nothing to undo");
                return false;
            }
        };
        match self.execute_undo(pending).await {
            Ok(()) => true,
            Err(e) => {
                warn!(asset = %id, error = %e, "undo failed");
                false
            }
        }
    }

    /// Clears the processed set and rebuilds under the current filter
    pub async fn reset(&mut self) -> Result<()> {
        let filter = self.session.source_filter().clone();
        let listing = self.repository.list_eligible_assets(&filter).await;
        self.session.reset(listing)
    }

    async fn execute_commit(&mut self, pending: PendingCommit) -> Result<()> {
        let outcome = apply_mutation(
            self.repository.as_ref(),
            &pending.item.id,
            pending.mutation.as_ref(),
        )
        .await;
        self.session.settle_commit(pending, outcome)
    }

    async fn execute_undo(&mut self, pending: PendingUndo) -> Result<()> {
        let outcome = apply_mutation(
            self.repository.as_ref(),
            &pending.asset_id,
            pending.mutation.as_ref(),
        )
        .await;
        self.session.settle_undo(pending, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Asset, MemoryStore, Translation};
    use crate::error::SwipeError;
    use crate::repository::InMemoryRepository;
    use chrono::{Duration, Utc};

    fn library() -> Arc<InMemoryRepository> {
        let now = Utc::now();
        Arc::new(
            InMemoryRepository::new()
                .with_asset(Asset::new("a", "a.jpg", now))
                .with_asset(Asset::new("b", "b.jpg", now - Duration::hours(1)))
                .with_asset(Asset::new("c", "c.jpg", now - Duration::hours(2)))
                .with_collection("trip", "Trip", &["b", "c"])
                .with_collection("best", "Best", &[])
                .with_read_only_collection("recent", "Recently Added", &["a"]),
        )
    }

    async fn open(repo: &Arc<InMemoryRepository>, store: MemoryStore) -> Triage {
        Triage::open(
            repo.clone(),
            Box::new(store),
            SessionSettings::default(),
            BTreeSet::new(),
            Vec::new(),
        )
        .await
        .unwrap()
    }

    fn current(triage: &Triage) -> Option<&str> {
        triage.session().current().map(|item| item.id.as_str())
    }

    #[tokio::test]
    async fn test_favorite_then_undo_restores_flag() {
        let repo = library();
        let mut triage = open(&repo, MemoryStore::new()).await;
        let a = AssetId::new("a");

        assert!(triage.gesture_start());
        triage.gesture_update(GestureUpdate::new(Translation::new(0.0, -100.0), 0.0, 600.0));
        assert_eq!(triage.finish_gesture().await.unwrap(), Some(Decision::Favorite));
        assert!(repo.is_favorite(&a));
        assert_eq!(current(&triage), Some("b"));

        assert_eq!(triage.undo_last().await.unwrap(), Some(a.clone()));
        assert!(!repo.is_favorite(&a));
        assert_eq!(current(&triage), Some("a"));
        assert!(triage.session().history().is_empty());
    }

    #[tokio::test]
    async fn test_trash_membership_survives_undo() {
        let repo = library();
        let mut triage = open(&repo, MemoryStore::new()).await;
        let a = AssetId::new("a");

        triage.commit(Decision::Trash).await.unwrap();
        assert_eq!(repo.members_named("Trash").unwrap(), vec![a.clone()]);

        assert!(triage.undo_by_id(&a).await);
        assert_eq!(repo.members_named("Trash").unwrap(), vec![a.clone()]);
        assert_eq!(current(&triage), Some("a"));
    }

    #[tokio::test]
    async fn test_mutation_failure_keeps_item_current() {
        let repo = library();
        let mut triage = open(&repo, MemoryStore::new()).await;
        repo.fail_mutations_for(&AssetId::new("a"), true);

        let result = triage.commit(Decision::Hide).await;
        assert!(matches!(result, Err(SwipeError::Repository(_))));
        assert_eq!(current(&triage), Some("a"));
        assert!(triage.session().processed().is_empty());

        repo.fail_mutations_for(&AssetId::new("a"), false);
        triage.commit(Decision::Hide).await.unwrap();
        assert!(repo.is_hidden(&AssetId::new("a")));
    }

    #[tokio::test]
    async fn test_failed_reversal_returns_false() {
        let repo = library();
        let mut triage = open(&repo, MemoryStore::new()).await;
        let a = AssetId::new("a");
        triage.commit(Decision::Favorite).await.unwrap();

        repo.fail_mutations_for(&a, true);
        assert!(!triage.undo_by_id(&a).await);
        assert!(triage.session().processed().contains(&a));
        assert!(!triage.undo_by_id(&AssetId::new("zzz")).await);
    }

    #[tokio::test]
    async fn test_source_filter_rebuilds_queue() {
        let repo = library();
        let store = MemoryStore::with_ids([AssetId::new("c")]);
        let mut triage = open(&repo, store).await;
        assert_eq!(triage.session().queue().len(), 2);

        let filter: BTreeSet<CollectionId> = [CollectionId::new("trip")].into_iter().collect();
        assert!(triage.set_source_filter(filter.clone()).await.unwrap());
        let ids: Vec<&str> = triage
            .session()
            .queue()
            .items()
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(triage.session().queue().total_eligible(), 2);
        assert_eq!(triage.session().queue().cursor(), 0);

        assert!(!triage.set_source_filter(filter).await.unwrap());
    }

    #[tokio::test]
    async fn test_destinations_drop_read_only_and_unknown() {
        let repo = library();
        let mut triage = open(&repo, MemoryStore::new()).await;
        triage
            .set_destination_albums(vec![
                CollectionId::new("best"),
                CollectionId::new("recent"),
                CollectionId::new("nope"),
                CollectionId::new("trip"),
                CollectionId::new("best"),
            ])
            .await
            .unwrap();
        assert_eq!(
            triage.session().destinations(),
            &[CollectionId::new("best"), CollectionId::new("trip")]
        );
    }

    #[tokio::test]
    async fn test_move_to_album_through_picker() {
        let repo = library();
        let mut triage = open(&repo, MemoryStore::new()).await;
        triage
            .set_destination_albums(vec![CollectionId::new("best"), CollectionId::new("trip")])
            .await
            .unwrap();

        assert!(triage.gesture_start());
        triage.gesture_update(GestureUpdate::new(Translation::new(50.0, 0.0), 120.0, 600.0));
        assert_eq!(
            triage.finish_gesture().await.unwrap(),
            Some(Decision::MoveToAlbum(CollectionId::new("best")))
        );
        assert_eq!(
            repo.members_of(&CollectionId::new("best")).unwrap(),
            vec![AssetId::new("a")]
        );
    }

    #[tokio::test]
    async fn test_access_denied_then_recovered() {
        let repo = library();
        repo.deny_access(true);
        let mut triage = open(&repo, MemoryStore::new()).await;
        assert!(triage.session().access_denied());
        assert!(triage.session().current().is_none());

        repo.deny_access(false);
        triage.reload().await.unwrap();
        assert!(!triage.session().access_denied());
        assert_eq!(current(&triage), Some("a"));
    }

    #[tokio::test]
    async fn test_reset_requeues_everything() {
        let repo = library();
        let store = MemoryStore::new();
        let mut triage = open(&repo, store.clone()).await;
        triage.commit(Decision::Keep).await.unwrap();
        triage.commit(Decision::Keep).await.unwrap();
        assert_eq!(triage.session().queue().len(), 1);

        triage.reset().await.unwrap();
        assert_eq!(triage.session().queue().len(), 3);
        assert!(store.saved().is_empty());
        assert!(!triage.undo_by_id(&AssetId::new("a")).await);
    }
}
