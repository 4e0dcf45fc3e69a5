use crate::domain::{GestureUpdate, HistoryFilter, Translation};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Translation a keyboard swipe stands in for; comfortably past the primary threshold
pub const SWIPE_DISTANCE: f64 = 120.0;

/// Horizontal translation of a keyboard album pick: opens the picker without
/// reaching Keep
pub const PICKER_DISTANCE: f64 = 50.0;

/// Represents the result of handling a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Quit the application
    Quit,
    /// Swipe left: trash
    SwipeLeft,
    /// Swipe right: keep
    SwipeRight,
    /// Swipe up: favorite
    SwipeUp,
    /// Swipe down: hide
    SwipeDown,
    /// Drop into the destination album at this zero-based band
    MoveToAlbum(usize),
    /// Undo last decision
    Undo,
    /// Toggle history overlay
    History,
    /// Toggle help overlay
    Help,
    /// No action
    None,
}

/// Keys understood while the history overlay is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKey {
    Close,
    Filter(HistoryFilter),
    /// Undo the entry at this row of the listing
    Undo(usize),
    None,
}

/// Maps keyboard events to actions
pub fn handle_key_event(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Quit: q or Ctrl+C
        (KeyCode::Char('q'), KeyModifiers::NONE) => KeyAction::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::Quit,

        (KeyCode::Left, KeyModifiers::NONE) => KeyAction::SwipeLeft,
        (KeyCode::Char('t'), KeyModifiers::NONE) => KeyAction::SwipeLeft,
        (KeyCode::Right, KeyModifiers::NONE) => KeyAction::SwipeRight,
        (KeyCode::Char('k'), KeyModifiers::NONE) => KeyAction::SwipeRight,
        (KeyCode::Up, KeyModifiers::NONE) => KeyAction::SwipeUp,
        (KeyCode::Char('f'), KeyModifiers::NONE) => KeyAction::SwipeUp,
        (KeyCode::Down, KeyModifiers::NONE) => KeyAction::SwipeDown,
        (KeyCode::Char('h'), KeyModifiers::NONE) => KeyAction::SwipeDown,

        // Albums: 1-9
        (KeyCode::Char(c @ '1'..='9'), KeyModifiers::NONE) => {
            KeyAction::MoveToAlbum(c as usize - '1' as usize)
        }

        // Undo: u or Ctrl+Z
        (KeyCode::Char('u'), KeyModifiers::NONE) => KeyAction::Undo,
        (KeyCode::Char('z'), KeyModifiers::CONTROL) => KeyAction::Undo,

        (KeyCode::Char('l'), KeyModifiers::NONE) => KeyAction::History,
        (KeyCode::Char('?'), KeyModifiers::NONE) => KeyAction::Help,

        _ => KeyAction::None,
    }
}

/// Maps keyboard events inside the history overlay
pub fn handle_history_input(key: KeyEvent) -> HistoryKey {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, KeyModifiers::NONE) => HistoryKey::Close,
        (KeyCode::Char('l'), KeyModifiers::NONE) => HistoryKey::Close,
        (KeyCode::Char('q'), KeyModifiers::NONE) => HistoryKey::Close,

        (KeyCode::Char('a'), KeyModifiers::NONE) => HistoryKey::Filter(HistoryFilter::All),
        (KeyCode::Char('t'), KeyModifiers::NONE) => HistoryKey::Filter(HistoryFilter::Trash),
        (KeyCode::Char('k'), KeyModifiers::NONE) => HistoryKey::Filter(HistoryFilter::Keep),
        (KeyCode::Char('f'), KeyModifiers::NONE) => HistoryKey::Filter(HistoryFilter::Favorite),
        (KeyCode::Char('h'), KeyModifiers::NONE) => HistoryKey::Filter(HistoryFilter::Hide),
        (KeyCode::Char('m'), KeyModifiers::NONE) => {
            HistoryKey::Filter(HistoryFilter::MoveToAlbum)
        }

        (KeyCode::Char(c @ '1'..='9'), KeyModifiers::NONE) => {
            HistoryKey::Undo(c as usize - '1' as usize)
        }

        _ => HistoryKey::None,
    }
}

/// The drag a key stands in for, released at the pointer position it returns.
///
/// Swipes release above the viewport so the destination picker never captures
/// them. Album picks land in the middle of the album's band. `None` when the
/// action is not a gesture or the album does not exist.
pub fn synthetic_gesture(
    action: KeyAction,
    album_count: usize,
    viewport_height: f64,
) -> Option<GestureUpdate> {
    let drag = |dx, dy| Some(GestureUpdate::new(Translation::new(dx, dy), -1.0, viewport_height));

    match action {
        KeyAction::SwipeLeft => drag(-SWIPE_DISTANCE, 0.0),
        KeyAction::SwipeRight => drag(SWIPE_DISTANCE, 0.0),
        KeyAction::SwipeUp => drag(0.0, -SWIPE_DISTANCE),
        KeyAction::SwipeDown => drag(0.0, SWIPE_DISTANCE),
        KeyAction::MoveToAlbum(index) if index < album_count && viewport_height > 0.0 => {
            let band = viewport_height / album_count as f64;
            Some(GestureUpdate::new(
                Translation::new(PICKER_DISTANCE, 0.0),
                band * (index as f64 + 0.5),
                viewport_height,
            ))
        }
        _ => None,
    }
}
