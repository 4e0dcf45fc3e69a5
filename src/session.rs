//! The classification session.
//!
//! [`Session`] is a synchronous state object. Repository work is split in two
//! phases: a `begin` call hands out a pending operation carrying the mutation to
//! run, and the matching `settle` call applies its completion. Whatever happens
//! in between (undo of other entries, filter changes, another item's commit) is
//! legal, except a second commit for the item that is still pending.
//!
//! [`Triage`] drives a session inline against a repository and
//! [`actor`] runs one as a tokio task.

pub mod actor;
pub mod triage;

pub use actor::{SessionEvent, SessionHandle, SessionSnapshot};
pub use triage::Triage;

use crate::config::{ResetPolicy, UserConfig};
use crate::domain::{
    Asset, AssetId, CollectionId, Decision, DecisionEngine, DecisionStatistics,
    DestinationPicker, GestureOutcome, GestureUpdate, History, HistoryEntry, HistoryFilter,
    ProcessedSet, ProcessedStore, QueueItem, SessionQueue, Thresholds, Translation,
};
use crate::error::{Result, SwipeError};
use crate::repository::{Mutation, RepositoryError};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub thresholds: Thresholds,
    /// Display name of the bucket trashed assets are collected in
    pub trash_album_name: String,
    pub reset_policy: ResetPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings::from(&UserConfig::default())
    }
}

impl From<&UserConfig> for SessionSettings {
    fn from(config: &UserConfig) -> Self {
        Self {
            thresholds: config.thresholds(),
            trash_album_name: config.trash_album_name.clone(),
            reset_policy: config.reset_policy,
        }
    }
}

/// A commit waiting for its repository mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    pub ticket: u64,
    pub item: QueueItem,
    pub decision: Decision,
    /// `None` for decisions without a side effect; settle right away
    pub mutation: Option<Mutation>,
}

/// An undo waiting for its reversal mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUndo {
    pub ticket: u64,
    pub asset_id: AssetId,
    /// History sequence of the entry being undone
    pub sequence: u64,
    pub mutation: Option<Mutation>,
}

pub struct Session {
    queue: SessionQueue,
    engine: DecisionEngine,
    history: History,
    processed: ProcessedSet,
    source_filter: BTreeSet<CollectionId>,
    destinations: Vec<CollectionId>,
    access_denied: bool,
    pending_commits: HashMap<u64, AssetId>,
    pending_undos: HashMap<u64, AssetId>,
    next_ticket: u64,
    settings: SessionSettings,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("queued", &self.queue.len())
            .field("history", &self.history.len())
            .field("processed", &self.processed.len())
            .field("access_denied", &self.access_denied)
            .finish()
    }
}

impl Session {
    /// Loads the processed set from `store`. The queue stays empty until the
    /// first [`rebuild`](Self::rebuild).
    pub fn new(store: Box<dyn ProcessedStore>, settings: SessionSettings) -> Result<Self> {
        let processed = ProcessedSet::open(store)?;
        debug!(processed = processed.len(), "processed set loaded");
        Ok(Self {
            queue: SessionQueue::default(),
            engine: DecisionEngine::new(settings.thresholds),
            history: History::new(),
            processed,
            source_filter: BTreeSet::new(),
            destinations: Vec::new(),
            access_denied: false,
            pending_commits: HashMap::new(),
            pending_undos: HashMap::new(),
            next_ticket: 0,
            settings,
        })
    }

    /// Replaces the queue with a fresh listing, minus processed items.
    ///
    /// Access denial empties the queue and raises the persistent flag; other
    /// listing errors leave the session untouched.
    pub fn rebuild(&mut self, listing: std::result::Result<Vec<Asset>, RepositoryError>) -> Result<()> {
        match listing {
            Ok(assets) => {
                self.access_denied = false;
                self.queue = SessionQueue::build(assets, self.processed.ids());
            }
            Err(RepositoryError::AccessDenied) => {
                warn!("asset library access denied; queue is empty");
                self.access_denied = true;
                self.queue = SessionQueue::default();
            }
            Err(e) => return Err(e.into()),
        }
        self.engine.release();
        self.sync_lock();
        info!(
            queued = self.queue.len(),
            total = self.queue.total_eligible(),
            "queue rebuilt"
        );
        Ok(())
    }

    /// Starts a drag on the current item. Returns false when there is nothing to
    /// drag or the item's commit is still pending.
    pub fn gesture_start(&mut self) -> bool {
        let Some(current) = self.queue.current() else {
            return false;
        };
        if self.is_pending(&current.id) {
            debug!(asset = %current.id, "gesture ignored while commit is pending");
            return false;
        }
        self.engine.begin()
    }

    pub fn gesture_update(&mut self, update: GestureUpdate) {
        self.engine.update(update, &self.destinations);
    }

    /// Ends the drag. A committed decision comes back as a pending commit whose
    /// mutation the caller runs before [`settle_commit`](Self::settle_commit).
    pub fn gesture_end(&mut self) -> Result<Option<PendingCommit>> {
        let current = self
            .queue
            .current()
            .cloned()
            .ok_or(SwipeError::NoCurrentItem)?;
        if self.is_pending(&current.id) {
            return Err(SwipeError::CommitPending(current.id));
        }

        match self.engine.end() {
            GestureOutcome::Committed(decision) => Ok(Some(self.begin_commit(current, decision))),
            GestureOutcome::Cancelled | GestureOutcome::Ignored => Ok(None),
        }
    }

    /// Commits `decision` for the current item without a gesture
    pub fn commit(&mut self, decision: Decision) -> Result<PendingCommit> {
        let current = self
            .queue
            .current()
            .cloned()
            .ok_or(SwipeError::NoCurrentItem)?;
        if self.is_pending(&current.id) {
            return Err(SwipeError::CommitPending(current.id));
        }
        self.engine.lock();
        Ok(self.begin_commit(current, decision))
    }

    fn begin_commit(&mut self, item: QueueItem, decision: Decision) -> PendingCommit {
        let ticket = self.take_ticket();
        let mutation = decision.mutation(&self.settings.trash_album_name);
        self.pending_commits.insert(ticket, item.id.clone());
        info!(asset = %item.id, %decision, ticket, "commit requested");
        PendingCommit {
            ticket,
            item,
            decision,
            mutation,
        }
    }

    /// Applies the outcome of a commit's mutation.
    ///
    /// On success the processed set is persisted first; only then is the entry
    /// recorded and the item dropped from the queue. Any failure leaves the item
    /// current and unrecorded.
    pub fn settle_commit(
        &mut self,
        pending: PendingCommit,
        outcome: std::result::Result<(), RepositoryError>,
    ) -> Result<()> {
        if self.pending_commits.remove(&pending.ticket).is_none() {
            return Err(SwipeError::UnknownTicket(pending.ticket));
        }
        let PendingCommit { item, decision, .. } = pending;

        if let Err(e) = outcome {
            warn!(asset = %item.id, %decision, error = %e, "mutation failed; decision rolled back");
            self.sync_lock();
            return Err(e.into());
        }

        if let Err(e) = self.processed.insert(item.id.clone()) {
            warn!(asset = %item.id, error = %e, "could not persist processed set; decision not recorded");
            self.sync_lock();
            return Err(e);
        }

        let is_current = self.queue.current().is_some_and(|c| c.id == item.id);
        if is_current {
            self.queue.advance();
        } else {
            self.queue.remove(&item.id);
        }

        info!(asset = %item.id, %decision, "decision recorded");
        self.history.push(item.asset, decision);
        self.sync_lock();
        Ok(())
    }

    /// Begins undoing the newest live entry that has no undo in flight
    pub fn begin_undo_last(&mut self) -> Option<PendingUndo> {
        let index = self
            .history
            .rposition(|entry| self.history.is_live(entry) && !self.is_undoing(entry.asset_id()))?;
        Some(self.begin_undo_at(index))
    }

    /// Begins undoing the live entry for `id`, wherever it sits in history
    pub fn begin_undo(&mut self, id: &AssetId) -> Result<PendingUndo> {
        if self.is_undoing(id) {
            return Err(SwipeError::UndoPending(id.clone()));
        }
        let index = self
            .history
            .live_position(id)
            .filter(|_| self.processed.contains(id))
            .ok_or_else(|| SwipeError::NotFound(id.clone()))?;
        Ok(self.begin_undo_at(index))
    }

    fn begin_undo_at(&mut self, index: usize) -> PendingUndo {
        let entry = &self.history.entries()[index];
        let asset_id = entry.asset_id().clone();
        let sequence = entry.sequence;
        let mutation = entry.action.decision().reversal();
        let ticket = self.take_ticket();
        self.pending_undos.insert(ticket, asset_id.clone());
        info!(asset = %asset_id, ticket, sequence, "undo requested");
        PendingUndo {
            ticket,
            asset_id,
            sequence,
            mutation,
        }
    }

    /// Applies the outcome of an undo's reversal mutation.
    ///
    /// On success the id leaves the processed set, its entry is removed and the
    /// asset goes back to the front of the queue.
    pub fn settle_undo(
        &mut self,
        pending: PendingUndo,
        outcome: std::result::Result<(), RepositoryError>,
    ) -> Result<()> {
        if self.pending_undos.remove(&pending.ticket).is_none() {
            return Err(SwipeError::UnknownTicket(pending.ticket));
        }
        let PendingUndo {
            asset_id, sequence, ..
        } = pending;

        if let Err(e) = outcome {
            warn!(asset = %asset_id, error = %e, "reversal failed; entry kept");
            return Err(e.into());
        }

        let Some(index) = self.history.live_entry_position(&asset_id, sequence) else {
            // orphaned by a reset while the reversal was in flight, possibly
            // with a newer decision recorded since
            debug!(asset = %asset_id, sequence, "undo settled for an entry that is no longer live");
            return Ok(());
        };

        if let Err(e) = self.processed.remove(&asset_id) {
            warn!(asset = %asset_id, error = %e, "could not persist processed set; entry kept");
            return Err(e);
        }

        if let Some(entry) = self.history.remove_at(index) {
            self.queue.remove(&asset_id);
            self.queue.requeue_front(QueueItem::from(entry.asset));
        }
        info!(asset = %asset_id, "decision undone");
        self.sync_lock();
        Ok(())
    }

    /// Clears the processed set, applies the reset policy to history and rebuilds
    /// from `listing`
    pub fn reset(&mut self, listing: std::result::Result<Vec<Asset>, RepositoryError>) -> Result<()> {
        self.processed.clear()?;
        match self.settings.reset_policy {
            ResetPolicy::KeepHistory => self.history.orphan_all(),
            ResetPolicy::ClearHistory => self.history.clear(),
        }
        info!(policy = ?self.settings.reset_policy, "processed set cleared");
        self.rebuild(listing)
    }

    /// Returns true when the filter changed and the queue needs a rebuild
    pub fn set_source_filter(&mut self, filter: BTreeSet<CollectionId>) -> bool {
        if filter == self.source_filter {
            return false;
        }
        debug!(collections = filter.len(), "source filter changed");
        self.source_filter = filter;
        true
    }

    /// Sets the picker's albums in band order. Duplicates are dropped.
    pub fn set_destination_albums(&mut self, albums: Vec<CollectionId>) {
        let mut seen = BTreeSet::new();
        self.destinations = albums
            .into_iter()
            .filter(|album| seen.insert(album.clone()))
            .collect();
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.queue.current()
    }

    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Newest-first history listing, orphaned entries included
    pub fn history_view(&self, filter: HistoryFilter) -> Vec<&HistoryEntry> {
        self.history.newest_first(filter).collect()
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    pub fn source_filter(&self) -> &BTreeSet<CollectionId> {
        &self.source_filter
    }

    pub fn destinations(&self) -> &[CollectionId] {
        &self.destinations
    }

    pub fn picker(&self) -> &DestinationPicker {
        self.engine.picker()
    }

    pub fn offset(&self) -> Translation {
        self.engine.offset()
    }

    pub fn is_locked(&self) -> bool {
        self.engine.is_locked()
    }

    pub fn access_denied(&self) -> bool {
        self.access_denied
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// True while a commit for `id` waits on its mutation
    pub fn is_pending(&self, id: &AssetId) -> bool {
        self.pending_commits.values().any(|pending| pending == id)
    }

    pub fn is_undoing(&self, id: &AssetId) -> bool {
        self.pending_undos.values().any(|pending| pending == id)
    }

    pub fn in_flight(&self) -> usize {
        self.pending_commits.len() + self.pending_undos.len()
    }

    /// Counts over live entries only
    pub fn statistics(&self) -> DecisionStatistics {
        let mut stats = self.history.tally(|entry| self.history.is_live(entry));
        stats.total_eligible = self.queue.total_eligible();
        stats.remaining = self.queue.len();
        stats
    }

    pub fn display_position(&self) -> usize {
        self.queue.display_position()
    }

    pub fn progress(&self) -> f64 {
        self.queue.progress()
    }

    fn take_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    // Locked exactly while the current item has a commit in flight.
    fn sync_lock(&mut self) {
        let pending = self
            .queue
            .current()
            .is_some_and(|current| self.is_pending(&current.id));
        if pending {
            self.engine.lock();
        } else if self.engine.is_locked() {
            self.engine.release();
        }
    }
}
