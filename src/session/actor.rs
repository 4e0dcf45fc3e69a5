//! Event-loop front end for a [`Session`](super::Session).
//!
//! One task owns the session. Commands arrive over an mpsc channel, repository
//! mutations run as spawned tasks, and their completions come back through the
//! same loop, so the session is only ever touched from one place.

use super::{PendingCommit, PendingUndo, Triage};
use crate::domain::{
    AssetId, CollectionId, Decision, DestinationPicker, GestureUpdate, QueueItem, Translation,
};
use crate::error::{Result, SwipeError};
use crate::repository::{apply_mutation, RepositoryError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

const COMMAND_BUFFER: usize = 64;

/// Outcomes reported by the actor as they settle
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Committed {
        asset_id: AssetId,
        decision: Decision,
    },
    CommitFailed {
        asset_id: AssetId,
        decision: Decision,
        reason: String,
    },
    Undone {
        asset_id: AssetId,
    },
    UndoFailed {
        asset_id: AssetId,
        reason: String,
    },
    Rebuilt {
        queued: usize,
        total_eligible: usize,
        access_denied: bool,
    },
}

/// Point-in-time view of the session for presentation
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub current: Option<QueueItem>,
    pub queued: usize,
    pub display_position: usize,
    pub total_eligible: usize,
    pub progress: f64,
    pub history_len: usize,
    pub processed_len: usize,
    pub locked: bool,
    pub picker: DestinationPicker,
    pub offset: Translation,
    pub destinations: Vec<CollectionId>,
    pub access_denied: bool,
}

enum Command {
    GestureStart,
    GestureUpdate(GestureUpdate),
    GestureEnd(oneshot::Sender<Result<Option<Decision>>>),
    Commit(Decision, oneshot::Sender<Result<()>>),
    UndoLast(oneshot::Sender<Option<AssetId>>),
    UndoById(AssetId, oneshot::Sender<bool>),
    SetSourceFilter(BTreeSet<CollectionId>, oneshot::Sender<Result<bool>>),
    SetDestinations(Vec<CollectionId>, oneshot::Sender<Result<()>>),
    Reset(oneshot::Sender<Result<()>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

enum UndoReply {
    Last(oneshot::Sender<Option<AssetId>>),
    ById(oneshot::Sender<bool>),
}

enum Completion {
    Commit(PendingCommit, std::result::Result<(), RepositoryError>),
    Undo(PendingUndo, std::result::Result<(), RepositoryError>, UndoReply),
}

/// Cloneable handle to a running session actor
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::GestureStart => "GestureStart",
            Command::GestureUpdate(_) => "GestureUpdate",
            Command::GestureEnd(_) => "GestureEnd",
            Command::Commit(..) => "Commit",
            Command::UndoLast(_) => "UndoLast",
            Command::UndoById(..) => "UndoById",
            Command::SetSourceFilter(..) => "SetSourceFilter",
            Command::SetDestinations(..) => "SetDestinations",
            Command::Reset(_) => "Reset",
            Command::Snapshot(_) => "Snapshot",
        };
        f.write_str(name)
    }
}

/// Moves `triage` into a new task. Must be called within a tokio runtime.
pub fn spawn(triage: Triage) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (completion_tx, completion_rx) = mpsc::unbounded_channel();

    let actor = SessionActor {
        triage,
        events: event_tx,
        completions: completion_tx,
        in_flight: 0,
    };
    tokio::spawn(actor.run(command_rx, completion_rx));

    (
        SessionHandle {
            commands: command_tx,
        },
        event_rx,
    )
}

impl SessionHandle {
    pub async fn gesture_start(&self) -> Result<()> {
        self.send(Command::GestureStart).await
    }

    pub async fn gesture_update(&self, update: GestureUpdate) -> Result<()> {
        self.send(Command::GestureUpdate(update)).await
    }

    /// Ends the drag. A committed decision is returned as soon as its mutation
    /// has been issued; the outcome arrives later as a [`SessionEvent`].
    pub async fn gesture_end(&self) -> Result<Option<Decision>> {
        self.request(Command::GestureEnd).await?
    }

    /// Commits `decision` for the current item. Replies once issued.
    pub async fn commit(&self, decision: Decision) -> Result<()> {
        self.request(|reply| Command::Commit(decision, reply)).await?
    }

    /// Replies after the undo settled with the asset put back in front
    pub async fn undo_last(&self) -> Result<Option<AssetId>> {
        self.request(Command::UndoLast).await
    }

    /// Replies after the undo settled
    pub async fn undo_by_id(&self, id: AssetId) -> Result<bool> {
        self.request(|reply| Command::UndoById(id, reply)).await
    }

    pub async fn set_source_filter(&self, filter: BTreeSet<CollectionId>) -> Result<bool> {
        self.request(|reply| Command::SetSourceFilter(filter, reply))
            .await?
    }

    pub async fn set_destination_albums(&self, albums: Vec<CollectionId>) -> Result<()> {
        self.request(|reply| Command::SetDestinations(albums, reply))
            .await?
    }

    pub async fn reset(&self) -> Result<()> {
        self.request(Command::Reset).await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(Command::Snapshot).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SwipeError::ActorClosed)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.send(make(reply)).await?;
        response.await.map_err(|_| SwipeError::ActorClosed)
    }
}

struct SessionActor {
    triage: Triage,
    events: mpsc::UnboundedSender<SessionEvent>,
    completions: mpsc::UnboundedSender<Completion>,
    in_flight: usize,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            tokio::select! {
                biased;
                Some(completion) = completions.recv() => self.settle(completion),
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }

        // let issued mutations land before the session goes away
        while self.in_flight > 0 {
            match completions.recv().await {
                Some(completion) => self.settle(completion),
                None => break,
            }
        }
        debug!("session actor stopped");
    }

    async fn handle(&mut self, command: Command) {
        debug!(?command, "session command");
        match command {
            Command::GestureStart => {
                self.triage.gesture_start();
            }
            Command::GestureUpdate(update) => self.triage.gesture_update(update),
            Command::GestureEnd(reply) => {
                let result = match self.triage.session_mut().gesture_end() {
                    Ok(Some(pending)) => Ok(Some(self.dispatch_commit(pending))),
                    Ok(None) => Ok(None),
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            Command::Commit(decision, reply) => {
                let result = self
                    .triage
                    .session_mut()
                    .commit(decision)
                    .map(|pending| {
                        self.dispatch_commit(pending);
                    });
                let _ = reply.send(result);
            }
            Command::UndoLast(reply) => match self.triage.session_mut().begin_undo_last() {
                Some(pending) => self.dispatch_undo(pending, UndoReply::Last(reply)),
                None => {
                    let _ = reply.send(None);
                }
            },
            Command::UndoById(id, reply) => match self.triage.session_mut().begin_undo(&id) {
                Ok(pending) => self.dispatch_undo(pending, UndoReply::ById(reply)),
                Err(e) => {
                    debug!(asset = %id, error = %e, "nothing to undo");
                    let _ = reply.send(false);
                }
            },
            Command::SetSourceFilter(filter, reply) => {
                let result = self.triage.set_source_filter(filter).await;
                if matches!(result, Ok(true)) {
                    self.emit_rebuilt();
                }
                let _ = reply.send(result);
            }
            Command::SetDestinations(albums, reply) => {
                let _ = reply.send(self.triage.set_destination_albums(albums).await);
            }
            Command::Reset(reply) => {
                let result = self.triage.reset().await;
                if result.is_ok() {
                    self.emit_rebuilt();
                }
                let _ = reply.send(result);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn dispatch_commit(&mut self, pending: PendingCommit) -> Decision {
        let decision = pending.decision.clone();
        let repository = Arc::clone(self.triage.repository());
        let completions = self.completions.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let outcome = apply_mutation(
                repository.as_ref(),
                &pending.item.id,
                pending.mutation.as_ref(),
            )
            .await;
            let _ = completions.send(Completion::Commit(pending, outcome));
        });
        decision
    }

    fn dispatch_undo(&mut self, pending: PendingUndo, reply: UndoReply) {
        let repository = Arc::clone(self.triage.repository());
        let completions = self.completions.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let outcome = apply_mutation(
                repository.as_ref(),
                &pending.asset_id,
                pending.mutation.as_ref(),
            )
            .await;
            let _ = completions.send(Completion::Undo(pending, outcome, reply));
        });
    }

    fn settle(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let session = self.triage.session_mut();

        match completion {
            Completion::Commit(pending, outcome) => {
                let asset_id = pending.item.id.clone();
                let decision = pending.decision.clone();
                let event = match session.settle_commit(pending, outcome) {
                    Ok(()) => SessionEvent::Committed { asset_id, decision },
                    Err(e) => SessionEvent::CommitFailed {
                        asset_id,
                        decision,
                        reason: e.to_string(),
                    },
                };
                self.emit(event);
            }
            Completion::Undo(pending, outcome, reply) => {
                let asset_id = pending.asset_id.clone();
                let settled = session.settle_undo(pending, outcome);
                let succeeded = settled.is_ok();

                match reply {
                    UndoReply::Last(reply) => {
                        let _ = reply.send(succeeded.then(|| asset_id.clone()));
                    }
                    UndoReply::ById(reply) => {
                        let _ = reply.send(succeeded);
                    }
                }
                let event = match settled {
                    Ok(()) => SessionEvent::Undone { asset_id },
                    Err(e) => SessionEvent::UndoFailed {
                        asset_id,
                        reason: e.to_string(),
                    },
                };
                self.emit(event);
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let session = self.triage.session();
        SessionSnapshot {
            current: session.current().cloned(),
            queued: session.queue().len(),
            display_position: session.display_position(),
            total_eligible: session.queue().total_eligible(),
            progress: session.progress(),
            history_len: session.history().len(),
            processed_len: session.processed().len(),
            locked: session.is_locked(),
            picker: session.picker().clone(),
            offset: session.offset(),
            destinations: session.destinations().to_vec(),
            access_denied: session.access_denied(),
        }
    }

    fn emit_rebuilt(&self) {
        let session = self.triage.session();
        self.emit(SessionEvent::Rebuilt {
            queued: session.queue().len(),
            total_eligible: session.queue().total_eligible(),
            access_denied: session.access_denied(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Asset, MemoryStore};
    use crate::repository::InMemoryRepository;
    use crate::session::SessionSettings;
    use chrono::{Duration, Utc};

    fn library(gated: bool) -> Arc<InMemoryRepository> {
        let now = Utc::now();
        let repo = InMemoryRepository::new()
            .with_asset(Asset::new("a", "a.jpg", now))
            .with_asset(Asset::new("b", "b.jpg", now - Duration::hours(1)))
            .with_asset(Asset::new("c", "c.jpg", now - Duration::hours(2)))
            .with_collection("x", "X", &[])
            .with_collection("y", "Y", &[]);
        Arc::new(if gated { repo.gated() } else { repo })
    }

    async fn start(
        repo: &Arc<InMemoryRepository>,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let triage = Triage::open(
            repo.clone(),
            Box::new(MemoryStore::new()),
            SessionSettings::default(),
            BTreeSet::new(),
            Vec::new(),
        )
        .await
        .unwrap();
        spawn(triage)
    }

    fn current(snapshot: &SessionSnapshot) -> Option<&str> {
        snapshot.current.as_ref().map(|item| item.id.as_str())
    }

    #[tokio::test]
    async fn test_second_commit_rejected_while_pending() {
        let repo = library(true);
        let (handle, mut events) = start(&repo).await;

        handle.commit(Decision::Favorite).await.unwrap();
        assert!(matches!(
            handle.commit(Decision::Favorite).await,
            Err(SwipeError::CommitPending(_))
        ));

        handle.gesture_start().await.unwrap();
        handle
            .gesture_update(GestureUpdate::new(Translation::new(-150.0, 0.0), 0.0, 600.0))
            .await
            .unwrap();
        assert!(matches!(
            handle.gesture_end().await,
            Err(SwipeError::CommitPending(_))
        ));
        assert!(handle.snapshot().await.unwrap().locked);

        repo.release_mutations(1);
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::Committed {
                asset_id: AssetId::new("a"),
                decision: Decision::Favorite,
            })
        );

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.history_len, 1);
        assert_eq!(snapshot.processed_len, 1);
        assert_eq!(current(&snapshot), Some("b"));
        assert!(!snapshot.locked);
        assert_eq!(repo.applied().len(), 1);
    }

    #[tokio::test]
    async fn test_undo_allowed_while_commit_pending() {
        let repo = library(true);
        let (handle, mut events) = start(&repo).await;

        // keep has no mutation, so it settles without the gate
        handle.commit(Decision::Keep).await.unwrap();
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Committed { .. })
        ));

        handle.commit(Decision::Favorite).await.unwrap();
        assert!(handle.undo_by_id(AssetId::new("a")).await.unwrap());
        assert!(matches!(events.recv().await, Some(SessionEvent::Undone { .. })));

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(current(&snapshot), Some("a"));
        assert!(!snapshot.locked);

        repo.release_mutations(1);
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Committed { .. })
        ));
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.queued, 2);
        assert_eq!(snapshot.history_len, 1);
        assert_eq!(current(&snapshot), Some("a"));
        assert!(repo.is_favorite(&AssetId::new("b")));
    }

    #[tokio::test]
    async fn test_gesture_into_picker_album() {
        let repo = library(false);
        let (handle, mut events) = start(&repo).await;
        handle
            .set_destination_albums(vec![CollectionId::new("x"), CollectionId::new("y")])
            .await
            .unwrap();

        handle.gesture_start().await.unwrap();
        handle
            .gesture_update(GestureUpdate::new(Translation::new(50.0, 0.0), 450.0, 600.0))
            .await
            .unwrap();
        assert_eq!(
            handle.gesture_end().await.unwrap(),
            Some(Decision::MoveToAlbum(CollectionId::new("y")))
        );
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Committed { .. })
        ));
        assert_eq!(
            repo.members_of(&CollectionId::new("y")).unwrap(),
            vec![AssetId::new("a")]
        );
    }

    #[tokio::test]
    async fn test_undo_replies_after_settle() {
        let repo = library(false);
        let (handle, mut events) = start(&repo).await;

        assert_eq!(handle.undo_last().await.unwrap(), None);
        handle.commit(Decision::Hide).await.unwrap();
        events.recv().await;
        assert!(repo.is_hidden(&AssetId::new("a")));

        assert_eq!(handle.undo_last().await.unwrap(), Some(AssetId::new("a")));
        assert!(!repo.is_hidden(&AssetId::new("a")));
        assert!(!handle.undo_by_id(AssetId::new("a")).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_commit_reported_as_event() {
        let repo = library(false);
        repo.fail_mutations_for(&AssetId::new("a"), true);
        let (handle, mut events) = start(&repo).await;

        handle.commit(Decision::Favorite).await.unwrap();
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::CommitFailed { .. })
        ));
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(current(&snapshot), Some("a"));
        assert_eq!(snapshot.history_len, 0);
    }

    #[tokio::test]
    async fn test_reset_and_filter_emit_rebuilt() {
        let repo = library(false);
        let (handle, mut events) = start(&repo).await;

        handle.commit(Decision::Keep).await.unwrap();
        events.recv().await;
        handle.reset().await.unwrap();
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::Rebuilt {
                queued: 3,
                total_eligible: 3,
                access_denied: false,
            })
        );

        let filter: BTreeSet<CollectionId> = [CollectionId::new("x")].into_iter().collect();
        assert!(handle.set_source_filter(filter).await.unwrap());
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::Rebuilt {
                queued: 0,
                total_eligible: 0,
                access_denied: false,
            })
        );
    }
}
