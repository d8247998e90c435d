//! Inline editing state machine.
//!
//! At most one field in the whole board is being edited. Starting a new
//! edit commits the current one first. A commit only turns into a board
//! mutation when the text actually changed; cancel throws the buffer away.

use crate::engine::{Applied, BoardEngine, BoardMutation};
use crate::input::Modifiers;
use nc_core::Rect;
use nc_core::board::Board;
use nc_core::model::{CardField, normalize_optional, parse_iso};
use nc_render::anchor::{EditTarget, resolve_anchor_client_rect, resolve_anchor_screen_rect};

/// Date-only format used while editing a card date.
const DATE_EDIT_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub target: EditTarget,
    /// Seeded text, compared against on commit.
    pub original: String,
    /// Live, uncommitted text.
    pub buffer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing(EditSession),
}

/// What a key press did to the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not an edit key; let the overlay handle it.
    Ignored,
    Committed(Applied),
    Cancelled,
}

#[derive(Debug, Default)]
pub struct EditController {
    state: EditState,
}

impl EditController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn session(&self) -> Option<&EditSession> {
        match &self.state {
            EditState::Editing(session) => Some(session),
            EditState::Idle => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.session().is_some()
    }

    /// Begin editing `target`, committing any edit already in progress.
    /// Returns false (and stays idle) when the target no longer exists.
    pub fn start(&mut self, target: EditTarget, engine: &mut BoardEngine) -> bool {
        if self.is_editing() {
            self.commit(engine);
        }
        let Some(text) = seed_text(&target, &engine.board) else {
            log::debug!("edit target {target:?} is gone");
            return false;
        };
        log::debug!("edit start {target:?}");
        self.state = EditState::Editing(EditSession {
            target,
            original: text.clone(),
            buffer: text,
        });
        true
    }

    /// Replace the live buffer (every keystroke in the overlay).
    pub fn set_buffer(&mut self, text: &str) {
        if let EditState::Editing(session) = &mut self.state {
            session.buffer = text.to_string();
        }
    }

    /// End the edit, applying the buffer if it differs from the seed.
    pub fn commit(&mut self, engine: &mut BoardEngine) -> Applied {
        let EditState::Editing(session) = std::mem::take(&mut self.state) else {
            return Applied::Unchanged;
        };
        if session.buffer == session.original {
            return Applied::Unchanged;
        }
        match edit_mutation(&session, &engine.board) {
            Some(mutation) => engine.apply(mutation),
            None => Applied::Unchanged,
        }
    }

    /// End the edit without applying anything.
    pub fn cancel(&mut self) {
        if let EditState::Editing(session) = std::mem::take(&mut self.state) {
            log::debug!("edit cancelled {:?}", session.target);
        }
    }

    /// Enter commits single-line fields (Shift+Enter is left to the
    /// overlay), Escape cancels.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers, engine: &mut BoardEngine) -> KeyOutcome {
        let Some(single_line) = self.session().map(|s| s.target.is_single_line()) else {
            return KeyOutcome::Ignored;
        };
        match key {
            "Enter" if single_line && !modifiers.shift => {
                KeyOutcome::Committed(self.commit(engine))
            }
            "Escape" => {
                self.cancel();
                KeyOutcome::Cancelled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Overlay rectangle in canvas-viewport coordinates.
    pub fn anchor_screen_rect(&self, engine: &BoardEngine) -> Option<Rect> {
        let session = self.session()?;
        resolve_anchor_screen_rect(&session.target, &engine.board, &engine.view)
    }

    /// Overlay rectangle in page coordinates.
    pub fn anchor_client_rect(&self, engine: &BoardEngine, sidebar_width: f64) -> Option<Rect> {
        let session = self.session()?;
        resolve_anchor_client_rect(&session.target, &engine.board, &engine.view, sidebar_width)
    }
}

/// Current value of `target` formatted for editing.
fn seed_text(target: &EditTarget, board: &Board) -> Option<String> {
    match *target {
        EditTarget::CardField { card, field } => {
            let card = board.card(card)?;
            Some(match field {
                CardField::Title => card.title.clone(),
                CardField::Content => card.content.clone(),
                CardField::Date => card
                    .date
                    .map(|d| d.format(DATE_EDIT_FORMAT).to_string())
                    .unwrap_or_default(),
                CardField::Key => card.key.clone().unwrap_or_default(),
                CardField::Tags => card.tags.join(", "),
            })
        }
        EditTarget::StackTitle { stack } => Some(board.stack(stack)?.title.clone().unwrap_or_default()),
        EditTarget::ConnectionLabel { connection } => {
            Some(board.connection(connection)?.label.clone().unwrap_or_default())
        }
    }
}

/// The mutation a changed buffer commits to. `None` for unparseable dates
/// and vanished entities.
fn edit_mutation(session: &EditSession, board: &Board) -> Option<BoardMutation> {
    let text = session.buffer.as_str();
    match session.target {
        EditTarget::CardField { card, field } => {
            let mut card = board.card(card)?.clone();
            match field {
                CardField::Title => card.title = text.to_string(),
                CardField::Content => card.content = text.to_string(),
                CardField::Date => {
                    let trimmed = text.trim();
                    card.date = if trimmed.is_empty() {
                        None
                    } else {
                        let Some(date) = parse_iso(trimmed) else {
                            log::debug!("ignoring invalid date {trimmed:?}");
                            return None;
                        };
                        Some(date)
                    };
                }
                CardField::Key => card.key = normalize_optional(text),
                CardField::Tags => {
                    card.tags = text
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect();
                }
            }
            Some(BoardMutation::UpdateCard { card: Box::new(card) })
        }
        EditTarget::StackTitle { stack } => Some(BoardMutation::SetStackTitle {
            id: stack,
            text: text.to_string(),
        }),
        EditTarget::ConnectionLabel { connection } => Some(BoardMutation::SetConnectionLabel {
            id: connection,
            text: text.to_string(),
        }),
    }
}
