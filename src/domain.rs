//! Domain types for the swipe classification session.
//!
//! Assets are owned by the repository; the session only ever holds their
//! identifiers plus the immutable handle fetched at listing time.

pub mod decision_engine;
pub mod history;
pub mod processed;
pub mod queue;

use crate::repository::Mutation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use decision_engine::{
    classify, hover_target, DecisionEngine, DestinationPicker, GestureOutcome, GesturePhase,
    GestureUpdate, Thresholds, Translation, PRIMARY_THRESHOLD, SECONDARY_THRESHOLD,
};
pub use history::{History, HistoryAction, HistoryEntry, HistoryFilter};
pub use processed::{JsonFileStore, MemoryStore, ProcessedSet, ProcessedStore, PROCESSED_KEY};
pub use queue::SessionQueue;

/// Opaque identifier of an asset in the repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque identifier of a collection (album, bucket)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CollectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An item being triaged, as handed out by the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: AssetId,
    /// Repository handle used to locate the underlying item (a path for the filesystem adapter)
    pub locator: String,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    pub fn new(id: impl Into<AssetId>, locator: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            locator: locator.into(),
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub id: AssetId,
    pub asset: Asset,
}

impl From<Asset> for QueueItem {
    fn from(asset: Asset) -> Self {
        Self {
            id: asset.id.clone(),
            asset,
        }
    }
}

/// Classification outcome of one gesture commit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Decision {
    Trash,
    Keep,
    Favorite,
    Hide,
    MoveToAlbum(CollectionId),
}

impl Decision {
    /// Repository mutation that carries out this decision, if any.
    ///
    /// Trash goes into a bucket named `trash_album`, created on first use.
    pub fn mutation(&self, trash_album: &str) -> Option<Mutation> {
        match self {
            Decision::Trash => Some(Mutation::EnsureCollectionAndAdd(trash_album.to_string())),
            Decision::Keep => None,
            Decision::Favorite => Some(Mutation::SetFavorite(true)),
            Decision::Hide => Some(Mutation::SetHidden(true)),
            Decision::MoveToAlbum(album) => Some(Mutation::AddToCollection(album.clone())),
        }
    }

    /// Mutation that reverses this decision on undo.
    ///
    /// Only the favorite and hidden flags are reversed; bucket membership from
    /// Trash or MoveToAlbum is left in place.
    pub fn reversal(&self) -> Option<Mutation> {
        match self {
            Decision::Favorite => Some(Mutation::SetFavorite(false)),
            Decision::Hide => Some(Mutation::SetHidden(false)),
            Decision::Trash | Decision::Keep | Decision::MoveToAlbum(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Trash => "Trash",
            Decision::Keep => "Keep",
            Decision::Favorite => "Favorite",
            Decision::Hide => "Hide",
            Decision::MoveToAlbum(_) => "Move to album",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::MoveToAlbum(album) => write!(f, "Move to album {}", album),
            other => f.write_str(other.label()),
        }
    }
}

/// A collection as listed by the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub id: CollectionId,
    pub display_name: String,
    pub item_count: usize,
    /// Whether new assets may be added (only such collections can be destinations)
    pub accepts_content: bool,
}

/// Statistics about decisions made during the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionStatistics {
    pub total_eligible: usize,
    pub remaining: usize,
    pub kept: usize,
    pub trashed: usize,
    pub favorited: usize,
    pub hidden: usize,
    pub moved: usize,
}

impl DecisionStatistics {
    pub fn decided(&self) -> usize {
        self.kept + self.trashed + self.favorited + self.hidden + self.moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_mutations() {
        assert_eq!(
            Decision::Trash.mutation("Trash"),
            Some(Mutation::EnsureCollectionAndAdd("Trash".to_string()))
        );
        assert_eq!(Decision::Keep.mutation("Trash"), None);
        assert_eq!(
            Decision::Favorite.mutation("Trash"),
            Some(Mutation::SetFavorite(true))
        );
        assert_eq!(Decision::Hide.mutation("Trash"), Some(Mutation::SetHidden(true)));
        assert_eq!(
            Decision::MoveToAlbum(CollectionId::new("a1")).mutation("Trash"),
            Some(Mutation::AddToCollection(CollectionId::new("a1")))
        );
    }

    #[test]
    fn test_only_flags_are_reversed() {
        assert_eq!(Decision::Favorite.reversal(), Some(Mutation::SetFavorite(false)));
        assert_eq!(Decision::Hide.reversal(), Some(Mutation::SetHidden(false)));
        assert_eq!(Decision::Trash.reversal(), None);
        assert_eq!(Decision::Keep.reversal(), None);
        assert_eq!(Decision::MoveToAlbum(CollectionId::new("a1")).reversal(), None);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&AssetId::new("IMG_0001")).unwrap();
        assert_eq!(json, "\"IMG_0001\"");
        let id: CollectionId = serde_json::from_str("\"album-7\"").unwrap();
        assert_eq!(id.as_str(), "album-7");
    }

    #[test]
    fn test_queue_item_from_asset() {
        let asset = Asset::new("IMG_1", "/photos/IMG_1.jpg", Utc::now());
        let item = QueueItem::from(asset.clone());
        assert_eq!(item.id, asset.id);
        assert_eq!(item.asset, asset);
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(Decision::Trash.to_string(), "Trash");
        assert_eq!(
            Decision::MoveToAlbum(CollectionId::new("x")).to_string(),
            "Move to album x"
        );
    }
}
