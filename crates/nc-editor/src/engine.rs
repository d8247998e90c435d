//! Board engine: the authoritative board plus the view state around it.
//!
//! Tools and the edit controller never touch the board directly; they
//! produce [`BoardMutation`]s which the engine applies, tracking whether
//! the workspace has unsaved changes. Card deletion is the exception: it
//! goes through [`BoardEngine::request_delete_card`] and only happens once
//! the host confirms.

use chrono::{DateTime, Utc};
use nc_core::id::EntityId;
use nc_core::model::{Card, Stack};
use nc_core::{
    Board, DropOutcome, FocusConfig, FocusState, Point, SearchFilters, ViewTransform, Viewport,
    WorkspaceData, filter_stacks,
};

/// An edit to the board.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardMutation {
    MoveStack {
        id: EntityId,
        x: f64,
        y: f64,
    },
    /// Drag release; may merge into the stack under `pointer`.
    EndStackDrag {
        id: EntityId,
        x: f64,
        y: f64,
        pointer: Option<Point>,
    },
    ScrollReorder {
        id: EntityId,
        delta_y: f64,
    },
    BreakOut {
        card: EntityId,
    },
    AddCard {
        card: Box<Card>,
        at: Point,
    },
    UpdateCard {
        card: Box<Card>,
    },
    SetStackTitle {
        id: EntityId,
        text: String,
    },
    ResizeCard {
        card: EntityId,
        width: f64,
        height: f64,
    },
    AddConnection {
        from: EntityId,
        to: EntityId,
    },
    DeleteConnection {
        id: EntityId,
    },
    SetConnectionLabel {
        id: EntityId,
        text: String,
    },
}

/// Result of [`BoardEngine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Unknown ids or nothing to do.
    Unchanged,
    Changed,
    /// A stack or connection was created.
    Created(EntityId),
    /// A dragged stack was absorbed by `into`.
    Merged { into: EntityId },
}

impl Applied {
    pub fn changed(&self) -> bool {
        !matches!(self, Applied::Unchanged)
    }
}

pub struct BoardEngine {
    pub board: Board,
    /// Live canvas transform.
    pub view: ViewTransform,
    pub viewport: Viewport,
    pub focus: FocusState,
    filters: SearchFilters,
    created_at: DateTime<Utc>,
    dirty: bool,
    pending_delete: Option<EntityId>,
}

impl BoardEngine {
    /// An empty board created at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::from_workspace(WorkspaceData::empty(now))
    }

    pub fn from_workspace(data: WorkspaceData) -> Self {
        Self {
            created_at: data.created_at,
            board: data.into_board(),
            view: ViewTransform::default(),
            viewport: Viewport::default(),
            focus: FocusState::new(FocusConfig::default()),
            filters: SearchFilters::default(),
            dirty: false,
            pending_delete: None,
        }
    }

    /// Replace the board with a loaded workspace. View and filters stay.
    pub fn load(&mut self, data: WorkspaceData) {
        self.created_at = data.created_at;
        self.board = data.into_board();
        self.dirty = false;
        self.pending_delete = None;
        self.refit_focus();
        log::debug!(
            "loaded workspace: {} stacks, {} connections",
            self.board.stacks().len(),
            self.board.connections().len()
        );
    }

    /// Snapshot for saving, stamped `now`.
    pub fn to_workspace(&self, now: DateTime<Utc>) -> WorkspaceData {
        WorkspaceData::from_board(&self.board, self.created_at, now)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    pub fn apply(&mut self, mutation: BoardMutation) -> Applied {
        let before = self.focus_members();
        let applied = self.apply_inner(mutation);
        if applied.changed() {
            self.dirty = true;
            self.refit_if_members_changed(before);
        }
        applied
    }

    fn apply_inner(&mut self, mutation: BoardMutation) -> Applied {
        let board = &mut self.board;
        match mutation {
            BoardMutation::MoveStack { id, x, y } => {
                if board.stack(id).is_none() {
                    return Applied::Unchanged;
                }
                board.move_stack(id, x, y);
                Applied::Changed
            }
            BoardMutation::EndStackDrag { id, x, y, pointer } => match board.end_drag(id, x, y, pointer) {
                DropOutcome::Moved => Applied::Changed,
                DropOutcome::Merged { into } => Applied::Merged { into },
                DropOutcome::Ignored => Applied::Unchanged,
            },
            BoardMutation::ScrollReorder { id, delta_y } => {
                let reorderable = board.stack(id).is_some_and(|s| s.cards.len() > 1);
                if !reorderable || delta_y == 0.0 || delta_y.is_nan() {
                    return Applied::Unchanged;
                }
                board.scroll_reorder(id, delta_y);
                Applied::Changed
            }
            BoardMutation::BreakOut { card } => board
                .break_out(card)
                .map_or(Applied::Unchanged, Applied::Created),
            BoardMutation::AddCard { card, at } => Applied::Created(board.add_card(*card, at)),
            BoardMutation::UpdateCard { card } => {
                if board.update_card(*card) {
                    Applied::Changed
                } else {
                    Applied::Unchanged
                }
            }
            BoardMutation::SetStackTitle { id, text } => {
                if board.stack(id).is_none() {
                    return Applied::Unchanged;
                }
                board.set_stack_title(id, &text);
                Applied::Changed
            }
            BoardMutation::ResizeCard { card, width, height } => {
                if board.card(card).is_none() {
                    return Applied::Unchanged;
                }
                board.resize_card(card, width, height);
                Applied::Changed
            }
            BoardMutation::AddConnection { from, to } => board
                .add_connection(from, to)
                .map_or(Applied::Unchanged, Applied::Created),
            BoardMutation::DeleteConnection { id } => match board.delete_connection(id) {
                Some(_) => Applied::Changed,
                None => Applied::Unchanged,
            },
            BoardMutation::SetConnectionLabel { id, text } => {
                if board.connection(id).is_none() {
                    return Applied::Unchanged;
                }
                board.set_connection_label(id, &text);
                Applied::Changed
            }
        }
    }

    /// Create a blank card, dated now, in a new stack at `at`. Returns the
    /// new stack's id.
    pub fn new_card_at(&mut self, at: Point) -> EntityId {
        let before = self.focus_members();
        let id = self.board.add_card(Card::blank(Utc::now()), at);
        self.dirty = true;
        self.refit_if_members_changed(before);
        id
    }

    // ─── Deletion (confirmed) ────────────────────────────────────────────

    /// Ask to delete `card`. The host shows a confirmation and answers with
    /// [`resolve_pending_delete`](Self::resolve_pending_delete). Returns
    /// false for unknown cards.
    pub fn request_delete_card(&mut self, card: EntityId) -> bool {
        if self.board.card(card).is_none() {
            return false;
        }
        self.pending_delete = Some(card);
        true
    }

    pub fn pending_delete(&self) -> Option<EntityId> {
        self.pending_delete
    }

    /// Confirm (`true`) or cancel the pending deletion.
    pub fn resolve_pending_delete(&mut self, confirmed: bool) -> Option<Card> {
        let card = self.pending_delete.take()?;
        if !confirmed {
            log::debug!("delete of {card} cancelled");
            return None;
        }
        let before = self.focus_members();
        let removed = self.board.delete_card(card);
        if removed.is_some() {
            self.dirty = true;
            self.refit_if_members_changed(before);
        }
        removed
    }

    // ─── Filters & focus ─────────────────────────────────────────────────

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    /// Replace the filters. While focused, the view re-fits the new subset.
    pub fn set_filters(&mut self, filters: SearchFilters) {
        if filters == self.filters {
            return;
        }
        self.filters = filters;
        self.refit_focus();
    }

    /// Stacks reduced to the cards passing the current filters.
    pub fn filtered_stacks(&self) -> Vec<Stack> {
        filter_stacks(self.board.stacks(), &self.filters)
    }

    pub fn toggle_focus(&mut self) {
        let stacks = self.filtered_stacks();
        self.view = self.focus.toggle(self.view, &stacks, self.viewport);
    }

    /// Stack and card ids passing the filters, captured only while focused.
    fn focus_members(&self) -> Option<Vec<(EntityId, Vec<EntityId>)>> {
        if !self.focus.is_active() {
            return None;
        }
        let members = self
            .filtered_stacks()
            .iter()
            .map(|s| (s.id, s.cards.iter().map(|c| c.id).collect()))
            .collect();
        Some(members)
    }

    /// Re-fit focus when the filtered ids differ from `before`.
    fn refit_if_members_changed(&mut self, before: Option<Vec<(EntityId, Vec<EntityId>)>>) {
        if let Some(before) = before
            && self.focus_members().as_ref() != Some(&before)
        {
            self.refit_focus();
        }
    }

    fn refit_focus(&mut self) {
        let stacks = self.filtered_stacks();
        if let Some(view) = self.focus.on_filter_changed(&stacks, self.viewport) {
            self.view = view;
        }
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.view.pan(dx, dy);
        self.focus.record(self.view);
    }

    /// Zoom by `factor` about a screen-space point.
    pub fn zoom_about(&mut self, anchor: Point, factor: f64) {
        self.view.zoom_about(anchor, factor);
        self.focus.record(self.view);
    }
}
