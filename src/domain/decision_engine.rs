//! Gesture state machine mapping drag translations to decisions.
//!
//! A gesture runs `Idle -> Dragging -> {Committed | Cancelled}`. Alongside it the
//! destination picker tracks whether a "move to album" drop target is hovered.
//! After a commit the engine stays `Locked` until the session releases it once
//! the repository side effect has settled.

use super::{CollectionId, Decision};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Translation past which a drag commits one of the four directional decisions
pub const PRIMARY_THRESHOLD: f64 = 80.0;

/// Horizontal translation past which the destination picker opens
pub const SECONDARY_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub primary: f64,
    pub secondary: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            primary: PRIMARY_THRESHOLD,
            secondary: SECONDARY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Translation {
    pub dx: f64,
    pub dy: f64,
}

impl Translation {
    pub const ZERO: Translation = Translation { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// One live position update of a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureUpdate {
    pub translation: Translation,
    /// Vertical position of the pointer within the viewport
    pub position_y: f64,
    pub viewport_height: f64,
}

impl GestureUpdate {
    pub fn new(translation: Translation, position_y: f64, viewport_height: f64) -> Self {
        Self {
            translation,
            position_y,
            viewport_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    /// A decision was committed and its side effect has not settled yet
    Locked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DestinationPicker {
    #[default]
    Inactive,
    Active { hover: Option<CollectionId> },
}

impl DestinationPicker {
    pub fn is_active(&self) -> bool {
        matches!(self, DestinationPicker::Active { .. })
    }

    pub fn hover(&self) -> Option<&CollectionId> {
        match self {
            DestinationPicker::Active { hover } => hover.as_ref(),
            DestinationPicker::Inactive => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    Committed(Decision),
    /// Released below every threshold; the item stays current
    Cancelled,
    /// No drag was in progress (idle or locked)
    Ignored,
}

/// Album under the pointer: the viewport is split into equal horizontal bands,
/// one per destination, in configured order.
pub fn hover_target(
    position_y: f64,
    viewport_height: f64,
    albums: &[CollectionId],
) -> Option<CollectionId> {
    if albums.is_empty() || !(viewport_height > 0.0) || !(position_y >= 0.0) {
        return None;
    }
    let band_height = viewport_height / albums.len() as f64;
    let index = (position_y / band_height).floor();
    if !index.is_finite() {
        return None;
    }
    albums.get(index as usize).cloned()
}

/// Maps a released drag to a decision. Comparisons are strict, so a drag
/// of exactly the threshold decides nothing.
pub fn classify(
    translation: Translation,
    hover: Option<&CollectionId>,
    thresholds: &Thresholds,
) -> Option<Decision> {
    let Translation { dx, dy } = translation;
    let primary = thresholds.primary;

    if let Some(album) = hover {
        Some(Decision::MoveToAlbum(album.clone()))
    } else if dx < -primary {
        Some(Decision::Trash)
    } else if dx > primary {
        Some(Decision::Keep)
    } else if dy < -primary {
        Some(Decision::Favorite)
    } else if dy > primary {
        Some(Decision::Hide)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    phase: GesturePhase,
    picker: DestinationPicker,
    offset: Translation,
    thresholds: Thresholds,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

impl DecisionEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            phase: GesturePhase::Idle,
            picker: DestinationPicker::Inactive,
            offset: Translation::ZERO,
            thresholds,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn picker(&self) -> &DestinationPicker {
        &self.picker
    }

    /// Current drag offset, for presentation
    pub fn offset(&self) -> Translation {
        self.offset
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn is_locked(&self) -> bool {
        self.phase == GesturePhase::Locked
    }

    /// Starts a drag. Returns false while locked.
    pub fn begin(&mut self) -> bool {
        match self.phase {
            GesturePhase::Locked => false,
            GesturePhase::Idle | GesturePhase::Dragging => {
                self.phase = GesturePhase::Dragging;
                self.offset = Translation::ZERO;
                self.picker = DestinationPicker::Inactive;
                true
            }
        }
    }

    pub fn update(&mut self, update: GestureUpdate, albums: &[CollectionId]) {
        if self.phase != GesturePhase::Dragging {
            return;
        }
        self.offset = update.translation;

        let was_active = self.picker.is_active();
        self.picker = if update.translation.dx > self.thresholds.secondary && !albums.is_empty() {
            DestinationPicker::Active {
                hover: hover_target(update.position_y, update.viewport_height, albums),
            }
        } else {
            DestinationPicker::Inactive
        };

        if was_active != self.picker.is_active() {
            debug!(active = self.picker.is_active(), "destination picker toggled");
        }
    }

    /// Releases the drag. A commit locks the engine until [`release`](Self::release).
    pub fn end(&mut self) -> GestureOutcome {
        if self.phase != GesturePhase::Dragging {
            return GestureOutcome::Ignored;
        }

        let decision = classify(self.offset, self.picker.hover(), &self.thresholds);
        self.picker = DestinationPicker::Inactive;

        match decision {
            Some(decision) => {
                debug!(%decision, "gesture committed");
                self.phase = GesturePhase::Locked;
                GestureOutcome::Committed(decision)
            }
            None => {
                debug!(dx = self.offset.dx, dy = self.offset.dy, "gesture cancelled");
                self.phase = GesturePhase::Idle;
                self.offset = Translation::ZERO;
                GestureOutcome::Cancelled
            }
        }
    }

    /// Locks without a gesture, for decisions committed directly
    pub fn lock(&mut self) {
        self.phase = GesturePhase::Locked;
        self.picker = DestinationPicker::Inactive;
    }

    /// Returns to idle with a zero offset
    pub fn release(&mut self) {
        self.phase = GesturePhase::Idle;
        self.picker = DestinationPicker::Inactive;
        self.offset = Translation::ZERO;
    }
}
