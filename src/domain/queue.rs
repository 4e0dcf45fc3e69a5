use super::{Asset, AssetId, QueueItem};
use std::collections::HashSet;

/// Ordered working set of not-yet-classified items plus a cursor.
///
/// The cursor stays at the same index when the current item is consumed;
/// removal shifts the next item into its slot.
#[derive(Debug, Clone, Default)]
pub struct SessionQueue {
    items: Vec<QueueItem>,
    cursor: usize,
    total_eligible: usize,
}

impl SessionQueue {
    /// Builds a queue from a source-filtered listing, in listing order.
    ///
    /// `total_eligible` counts the listing before processed items are excluded.
    pub fn build(assets: Vec<Asset>, processed: &HashSet<AssetId>) -> Self {
        let total_eligible = assets.len();
        let items = assets
            .into_iter()
            .filter(|asset| !processed.contains(&asset.id))
            .map(QueueItem::from)
            .collect();

        Self {
            items,
            cursor: 0,
            total_eligible,
        }
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.items.get(self.cursor)
    }

    /// Removes the current item, making the next one current
    pub fn advance(&mut self) -> Option<QueueItem> {
        if self.cursor < self.items.len() {
            Some(self.items.remove(self.cursor))
        } else {
            None
        }
    }

    /// Puts an item back at the front and makes it current
    pub fn requeue_front(&mut self, item: QueueItem) {
        self.items.insert(0, item);
        self.cursor = 0;
    }

    /// Removes an item wherever it sits, keeping the cursor on the same logical item
    pub fn remove(&mut self, id: &AssetId) -> Option<QueueItem> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        let item = self.items.remove(index);
        if index < self.cursor {
            self.cursor -= 1;
        }
        Some(item)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_eligible(&self) -> usize {
        self.total_eligible
    }

    /// 1-based position of the current item among all eligible items
    pub fn display_position(&self) -> usize {
        if self.items.is_empty() {
            self.total_eligible
        } else {
            (self.total_eligible + self.cursor + 1).saturating_sub(self.items.len())
        }
    }

    pub fn progress(&self) -> f64 {
        if self.total_eligible == 0 {
            return 0.0;
        }
        (self.display_position() as f64 / self.total_eligible as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn assets(ids: &[&str]) -> Vec<Asset> {
        let now = Utc::now();
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                Asset::new(*id, format!("/lib/{}.jpg", id), now - Duration::minutes(i as i64))
            })
            .collect()
    }

    fn ids(queue: &SessionQueue) -> Vec<&str> {
        queue.items().iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_build_excludes_processed_and_keeps_order() {
        let processed: HashSet<AssetId> = [AssetId::new("b")].into_iter().collect();
        let queue = SessionQueue::build(assets(&["a", "b", "c"]), &processed);

        assert_eq!(ids(&queue), vec!["a", "c"]);
        assert_eq!(queue.cursor(), 0);
        assert_eq!(queue.total_eligible(), 3);
    }

    #[test]
    fn test_current_and_advance() {
        let mut queue = SessionQueue::build(assets(&["a", "b"]), &HashSet::new());

        assert_eq!(queue.current().unwrap().id.as_str(), "a");
        let removed = queue.advance().unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert_eq!(queue.current().unwrap().id.as_str(), "b");
        assert_eq!(queue.cursor(), 0);

        queue.advance();
        assert!(queue.current().is_none());
        assert!(queue.advance().is_none());
    }

    #[test]
    fn test_requeue_front_makes_item_current() {
        let mut queue = SessionQueue::build(assets(&["a", "b"]), &HashSet::new());
        let a = queue.advance().unwrap();

        queue.requeue_front(a);
        assert_eq!(ids(&queue), vec!["a", "b"]);
        assert_eq!(queue.current().unwrap().id.as_str(), "a");
    }

    #[test]
    fn test_remove_keeps_current_item() {
        let mut queue = SessionQueue::build(assets(&["a", "b", "c"]), &HashSet::new());
        let c = queue.remove(&AssetId::new("c")).unwrap();
        queue.requeue_front(c);
        // c a b
        queue.remove(&AssetId::new("a"));
        assert_eq!(queue.current().unwrap().id.as_str(), "c");
        assert!(queue.remove(&AssetId::new("missing")).is_none());
    }

    #[test]
    fn test_display_position_and_progress() {
        let processed: HashSet<AssetId> = [AssetId::new("a")].into_iter().collect();
        let mut queue = SessionQueue::build(assets(&["a", "b", "c", "d"]), &processed);

        // one already processed: showing item 2 of 4
        assert_eq!(queue.display_position(), 2);
        assert!((queue.progress() - 0.5).abs() < f64::EPSILON);

        queue.advance();
        assert_eq!(queue.display_position(), 3);

        queue.advance();
        queue.advance();
        assert!(queue.is_empty());
        assert_eq!(queue.display_position(), 4);
        assert!((queue.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_listing_progress_is_zero() {
        let queue = SessionQueue::build(Vec::new(), &HashSet::new());
        assert_eq!(queue.display_position(), 0);
        assert_eq!(queue.progress(), 0.0);
    }
}
