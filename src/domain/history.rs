use super::{Asset, AssetId, Decision, DecisionStatistics};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// What a committed history entry did to its asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    /// Kept without touching the repository
    KeptUnchanged,
    /// A repository mutation was applied; never holds `Decision::Keep`
    Applied(Decision),
}

impl HistoryAction {
    pub fn from_decision(decision: Decision) -> Self {
        match decision {
            Decision::Keep => HistoryAction::KeptUnchanged,
            other => HistoryAction::Applied(other),
        }
    }

    pub fn decision(&self) -> Decision {
        match self {
            HistoryAction::KeptUnchanged => Decision::Keep,
            HistoryAction::Applied(decision) => decision.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub asset: Asset,
    pub action: HistoryAction,
    /// Logical commit order, monotonic within a session
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn asset_id(&self) -> &AssetId {
        &self.asset.id
    }
}

/// Filter for the newest-first history listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryFilter {
    #[default]
    All,
    Trash,
    Keep,
    Favorite,
    Hide,
    MoveToAlbum,
}

impl HistoryFilter {
    pub fn matches(&self, action: &HistoryAction) -> bool {
        match (self, action) {
            (HistoryFilter::All, _) => true,
            (HistoryFilter::Keep, HistoryAction::KeptUnchanged) => true,
            (HistoryFilter::Trash, HistoryAction::Applied(Decision::Trash)) => true,
            (HistoryFilter::Favorite, HistoryAction::Applied(Decision::Favorite)) => true,
            (HistoryFilter::Hide, HistoryAction::Applied(Decision::Hide)) => true,
            (HistoryFilter::MoveToAlbum, HistoryAction::Applied(Decision::MoveToAlbum(_))) => true,
            _ => false,
        }
    }
}

/// Chronological log of committed decisions.
///
/// Appends only at the end; undo may remove an entry from anywhere. An entry is
/// live while its classification stands; entries orphaned by a reset remain as
/// display-only records and can no longer be undone.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    next_sequence: u64,
    // asset -> sequence of its live entry
    live: HashMap<AssetId, u64>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, asset: Asset, decision: Decision) -> &HistoryEntry {
        let entry = HistoryEntry {
            asset,
            action: HistoryAction::from_decision(decision),
            sequence: self.next_sequence,
            recorded_at: Utc::now(),
        };
        self.next_sequence += 1;
        self.live.insert(entry.asset.id.clone(), entry.sequence);
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn is_live(&self, entry: &HistoryEntry) -> bool {
        self.live.get(entry.asset_id()) == Some(&entry.sequence)
    }

    /// Index of the live entry for `id`
    pub fn live_position(&self, id: &AssetId) -> Option<usize> {
        let sequence = self.live.get(id)?;
        self.entries
            .iter()
            .rposition(|entry| &entry.sequence == sequence)
    }

    /// Index of the entry with `sequence`, provided it is still the live one for `id`
    pub fn live_entry_position(&self, id: &AssetId, sequence: u64) -> Option<usize> {
        if self.live.get(id) != Some(&sequence) {
            return None;
        }
        self.entries
            .iter()
            .rposition(|entry| entry.sequence == sequence)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Turns every entry into a display-only record
    pub fn orphan_all(&mut self) {
        self.live.clear();
    }

    /// Index of the newest entry matching `predicate`
    pub fn rposition(&self, predicate: impl Fn(&HistoryEntry) -> bool) -> Option<usize> {
        self.entries.iter().rposition(predicate)
    }

    /// Newest entry for `id`
    pub fn find(&self, id: &AssetId) -> Option<&HistoryEntry> {
        self.entries.iter().rev().find(|entry| entry.asset_id() == id)
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<HistoryEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        if self.live.get(entry.asset_id()) == Some(&entry.sequence) {
            self.live.remove(entry.asset_id());
        }
        Some(entry)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn newest_first(&self, filter: HistoryFilter) -> impl Iterator<Item = &HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .filter(move |entry| filter.matches(&entry.action))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry. Sequence numbers keep counting.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.live.clear();
    }

    /// Counts decisions among entries accepted by `include`
    pub fn tally(&self, include: impl Fn(&HistoryEntry) -> bool) -> DecisionStatistics {
        let mut stats = DecisionStatistics::default();
        for entry in self.entries.iter().filter(|entry| include(entry)) {
            match &entry.action {
                HistoryAction::KeptUnchanged => stats.kept += 1,
                HistoryAction::Applied(Decision::Trash) => stats.trashed += 1,
                HistoryAction::Applied(Decision::Favorite) => stats.favorited += 1,
                HistoryAction::Applied(Decision::Hide) => stats.hidden += 1,
                HistoryAction::Applied(Decision::MoveToAlbum(_)) => stats.moved += 1,
                HistoryAction::Applied(Decision::Keep) => stats.kept += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CollectionId;

    fn asset(id: &str) -> Asset {
        Asset::new(id, format!("/lib/{}.jpg", id), Utc::now())
    }

    fn sample() -> History {
        let mut history = History::new();
        history.push(asset("a"), Decision::Trash);
        history.push(asset("b"), Decision::Keep);
        history.push(asset("c"), Decision::Favorite);
        history.push(asset("d"), Decision::MoveToAlbum(CollectionId::new("x")));
        history
    }

    #[test]
    fn test_keep_is_recorded_as_no_op() {
        let history = sample();
        let entry = history.find(&AssetId::new("b")).unwrap();
        assert_eq!(entry.action, HistoryAction::KeptUnchanged);
        assert_eq!(entry.action.decision(), Decision::Keep);
    }

    #[test]
    fn test_sequence_is_chronological() {
        let history = sample();
        let sequences: Vec<u64> = history.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_remove_from_middle() {
        let mut history = sample();
        let index = history.rposition(|e| e.asset_id().as_str() == "b").unwrap();
        let removed = history.remove_at(index).unwrap();

        assert_eq!(removed.asset_id().as_str(), "b");
        let ids: Vec<&str> = history.entries().iter().map(|e| e.asset_id().as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
        assert!(history.remove_at(10).is_none());
    }

    #[test]
    fn test_newest_first_with_filter() {
        let history = sample();

        let all: Vec<&str> = history
            .newest_first(HistoryFilter::All)
            .map(|e| e.asset_id().as_str())
            .collect();
        assert_eq!(all, vec!["d", "c", "b", "a"]);

        let kept: Vec<&str> = history
            .newest_first(HistoryFilter::Keep)
            .map(|e| e.asset_id().as_str())
            .collect();
        assert_eq!(kept, vec!["b"]);

        assert_eq!(history.newest_first(HistoryFilter::Hide).count(), 0);
        assert_eq!(history.newest_first(HistoryFilter::MoveToAlbum).count(), 1);
    }

    #[test]
    fn test_tally() {
        let history = sample();
        let stats = history.tally(|_| true);
        assert_eq!(stats.trashed, 1);
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.favorited, 1);
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.hidden, 0);
        assert_eq!(stats.decided(), 4);

        let only_a = history.tally(|e| e.asset_id().as_str() == "a");
        assert_eq!(only_a.decided(), 1);
    }

    #[test]
    fn test_orphaned_entries_are_not_live() {
        let mut history = sample();
        let a = AssetId::new("a");
        assert_eq!(history.live_position(&a), Some(0));
        assert_eq!(history.live_count(), 4);

        history.orphan_all();
        assert_eq!(history.live_position(&a), None);
        assert_eq!(history.len(), 4);

        // classified again after the reset: only the new entry is live
        history.push(asset("a"), Decision::Hide);
        assert_eq!(history.live_position(&a), Some(4));
        assert!(!history.is_live(&history.entries()[0]));
        assert!(history.is_live(&history.entries()[4]));

        history.remove_at(4);
        assert_eq!(history.live_position(&a), None);
        assert_eq!(history.live_count(), 0);
    }

    #[test]
    fn test_live_entry_position_checks_sequence() {
        let mut history = sample();
        let a = AssetId::new("a");
        let old = history.entries()[0].sequence;
        assert_eq!(history.live_entry_position(&a, old), Some(0));

        history.orphan_all();
        let new = history.push(asset("a"), Decision::Hide).sequence;
        assert_eq!(history.live_entry_position(&a, old), None);
        assert_eq!(history.live_entry_position(&a, new), Some(4));
    }

    #[test]
    fn test_clear_keeps_sequence_counting() {
        let mut history = sample();
        history.clear();
        assert!(history.is_empty());
        let entry = history.push(asset("e"), Decision::Hide);
        assert_eq!(entry.sequence, 4);
    }
}
