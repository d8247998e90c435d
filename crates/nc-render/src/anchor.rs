//! Overlay anchoring.
//!
//! An editor overlay is positioned from a logical [`EditTarget`] and the
//! current board + transform, recomputed whenever either changes. Nothing
//! here holds onto renderer state.

use crate::connector::connection_geometry;
use kurbo::{Rect, Vec2};
use nc_core::board::Board;
use nc_core::geometry::{HEADER_HEIGHT, card_field_rect, header_rect, stack_bounds};
use nc_core::id::EntityId;
use nc_core::model::CardField;
use nc_core::transform::ViewTransform;

/// What an inline editor is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditTarget {
    CardField { card: EntityId, field: CardField },
    StackTitle { stack: EntityId },
    ConnectionLabel { connection: EntityId },
}

impl EditTarget {
    /// Whether Enter commits (everything except card content).
    pub fn is_single_line(&self) -> bool {
        match self {
            EditTarget::CardField { field, .. } => field.is_single_line(),
            EditTarget::StackTitle { .. } | EditTarget::ConnectionLabel { .. } => true,
        }
    }
}

/// Canvas-space rectangle the overlay for `target` should cover.
///
/// Single-card stacks have no header band, so their title editor sits in a
/// header-height band just above the stack. `None` when the entity is gone
/// or a connection has lost an endpoint.
pub fn resolve_anchor_canvas_rect(target: &EditTarget, board: &Board) -> Option<Rect> {
    match *target {
        EditTarget::CardField { card, field } => {
            let (si, ci) = board.locate_card(card)?;
            card_field_rect(&board.stacks()[si], ci, field)
        }
        EditTarget::StackTitle { stack } => {
            let stack = board.stack(stack)?;
            header_rect(stack).or_else(|| {
                let b = stack_bounds(stack);
                Some(Rect::new(b.x0, b.y0 - HEADER_HEIGHT, b.x1, b.y0))
            })
        }
        EditTarget::ConnectionLabel { connection } => {
            let conn = board.connection(connection)?;
            connection_geometry(board, conn).map(|g| g.label_box)
        }
    }
}

/// Screen-space (canvas viewport) rectangle for the overlay.
pub fn resolve_anchor_screen_rect(
    target: &EditTarget,
    board: &Board,
    transform: &ViewTransform,
) -> Option<Rect> {
    resolve_anchor_canvas_rect(target, board).map(|r| transform.rect_to_screen(r))
}

/// Client (page) rectangle: the screen rect shifted right by the sidebar.
pub fn resolve_anchor_client_rect(
    target: &EditTarget,
    board: &Board,
    transform: &ViewTransform,
    sidebar_width: f64,
) -> Option<Rect> {
    resolve_anchor_screen_rect(target, board, transform).map(|r| r + Vec2::new(sidebar_width, 0.0))
}
