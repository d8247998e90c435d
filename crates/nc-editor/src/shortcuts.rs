//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Keys are only
//! routed here while no inline edit is active; the edit controller gets
//! them otherwise.

use crate::engine::BoardEngine;
use crate::input::Modifiers;
use nc_core::{Point, ViewTransform};

/// Zoom multiplier for the keyboard zoom shortcuts.
pub const KEY_ZOOM_STEP: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── File ──
    Save,
    SaveAs,
    Open,

    // ── Board ──
    NewCard,
    /// Ask to delete the selected card (confirmation follows).
    DeleteCard,

    // ── View ──
    ToggleFocus,
    ZoomIn,
    ZoomOut,
    ResetView,
    ClearFilters,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"s"`, `"Delete"`).
    /// Ctrl and ⌘ are interchangeable.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.cmd();

        if cmd && modifiers.shift {
            return match key {
                "s" | "S" => Some(ShortcutAction::SaveAs),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "s" | "S" => Some(ShortcutAction::Save),
                "o" | "O" => Some(ShortcutAction::Open),
                "n" | "N" => Some(ShortcutAction::NewCard),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetView),
                _ => None,
            };
        }

        match key {
            "f" | "F" => Some(ShortcutAction::ToggleFocus),
            "Delete" | "Backspace" => Some(ShortcutAction::DeleteCard),
            "Escape" => Some(ShortcutAction::ClearFilters),
            _ => None,
        }
    }
}

/// Carry out the view actions that need nothing but the engine. Returns
/// false for actions the host must handle (file, card creation, deletion).
pub fn apply_view_action(action: ShortcutAction, engine: &mut BoardEngine) -> bool {
    let center = Point::new(engine.viewport.width / 2.0, engine.viewport.height / 2.0);
    match action {
        ShortcutAction::ToggleFocus => engine.toggle_focus(),
        ShortcutAction::ZoomIn => engine.zoom_about(center, KEY_ZOOM_STEP),
        ShortcutAction::ZoomOut => engine.zoom_about(center, 1.0 / KEY_ZOOM_STEP),
        ShortcutAction::ResetView => {
            engine.view = ViewTransform::IDENTITY;
            engine.focus.record(engine.view);
        }
        ShortcutAction::ClearFilters => engine.set_filters(Default::default()),
        ShortcutAction::Save
        | ShortcutAction::SaveAs
        | ShortcutAction::Open
        | ShortcutAction::NewCard
        | ShortcutAction::DeleteCard => return false,
    }
    true
}
