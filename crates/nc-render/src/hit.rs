//! Hit testing: canvas point → what the pointer is over.
//!
//! Stacks are walked in reverse list order (last painted = topmost), and
//! inside a stack the top card is tried before the cards fanned behind it.
//! Drop collision in `nc_core::board` is a different rule (first stack in
//! list order) and does not go through here.

use crate::connector::{all_connection_geometry, distance_to_segment};
use kurbo::{Point, Rect};
use nc_core::board::Board;
use nc_core::geometry::{card_rect, header_rect, rect_contains, stack_bounds};
use nc_core::id::EntityId;
use nc_core::model::Stack;

/// Screen-pixel size of the resize grip at a top card's bottom-right corner.
pub const RESIZE_HANDLE_SIZE: f64 = 12.0;
/// Screen-pixel tolerance for clicking a connection line.
pub const LINE_HIT_TOLERANCE: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// Resize grip of a stack's top card.
    ResizeHandle { stack: EntityId, card: EntityId },
    /// A connection's label box.
    ConnectionLabel { connection: EntityId },
    /// The header band of a multi-card stack.
    StackHeader { stack: EntityId },
    /// A card (possibly one fanned behind the top card).
    Card { stack: EntityId, card: EntityId },
    /// Padding of a stack outside any card.
    Stack { stack: EntityId },
    /// A connection line.
    Connection { connection: EntityId },
    Canvas,
}

impl Hit {
    /// The stack involved, if any.
    pub fn stack(&self) -> Option<EntityId> {
        match *self {
            Hit::ResizeHandle { stack, .. }
            | Hit::StackHeader { stack }
            | Hit::Card { stack, .. }
            | Hit::Stack { stack } => Some(stack),
            _ => None,
        }
    }
}

/// Resize grip rectangle of a stack's top card. `zoom` keeps the grip a
/// constant size on screen.
pub fn resize_handle_rect(stack: &Stack, zoom: f64) -> Option<Rect> {
    let top = card_rect(stack, stack.cards.len().checked_sub(1)?)?;
    let size = RESIZE_HANDLE_SIZE / zoom.max(f64::EPSILON);
    Some(Rect::new(top.x1 - size, top.y1 - size, top.x1, top.y1))
}

/// Topmost stack under `p`.
pub fn hit_test_stack(stacks: &[Stack], p: Point) -> Option<EntityId> {
    stacks
        .iter()
        .rev()
        .find(|s| rect_contains(&stack_bounds(s), p))
        .map(|s| s.id)
}

/// Classify what lies under canvas point `p`.
pub fn hit_test(board: &Board, p: Point, zoom: f64) -> Hit {
    // Only grips not covered by a higher stack are live.
    for stack in board.stacks().iter().rev() {
        if let (Some(handle), Some(top)) = (resize_handle_rect(stack, zoom), stack.top_card())
            && rect_contains(&handle, p)
        {
            return Hit::ResizeHandle {
                stack: stack.id,
                card: top.id,
            };
        }
        if rect_contains(&stack_bounds(stack), p) {
            break;
        }
    }

    let connections = all_connection_geometry(board);
    if let Some(g) = connections.iter().rev().find(|g| rect_contains(&g.label_box, p)) {
        return Hit::ConnectionLabel { connection: g.id };
    }

    if let Some(stack_id) = hit_test_stack(board.stacks(), p)
        && let Some(stack) = board.stack(stack_id)
    {
        if header_rect(stack).is_some_and(|h| rect_contains(&h, p)) {
            return Hit::StackHeader { stack: stack_id };
        }
        let card = (0..stack.cards.len())
            .rev()
            .find(|&i| card_rect(stack, i).is_some_and(|r| rect_contains(&r, p)));
        return match card {
            Some(i) => Hit::Card {
                stack: stack_id,
                card: stack.cards[i].id,
            },
            None => Hit::Stack { stack: stack_id },
        };
    }

    let tolerance = LINE_HIT_TOLERANCE / zoom.max(f64::EPSILON);
    connections
        .iter()
        .rev()
        .find(|g| distance_to_segment(&g.line, p) <= tolerance)
        .map_or(Hit::Canvas, |g| Hit::Connection { connection: g.id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_core::geometry::{HEADER_HEIGHT, STACK_PADDING, stack_center};
    use nc_core::model::Card;

    fn card(id: &str) -> Card {
        Card::new(EntityId::intern(id), id)
    }

    fn board() -> Board {
        Board::from_parts(
            vec![
                Stack::new(EntityId::intern("h-under"), 0.0, 0.0, vec![card("h-u1")]),
                Stack::new(
                    EntityId::intern("h-over"),
                    100.0,
                    0.0,
                    vec![card("h-o1"), card("h-o2")],
                ),
                Stack::new(EntityId::intern("h-far"), 900.0, 0.0, vec![card("h-f1")]),
            ],
            vec![],
        )
    }

    #[test]
    fn topmost_stack_wins_where_stacks_overlap() {
        let b = board();
        let p = Point::new(150.0, 100.0);
        assert_eq!(hit_test_stack(b.stacks(), p), Some(EntityId::intern("h-over")));
        assert_eq!(hit_test_stack(b.stacks(), Point::new(50.0, 100.0)), Some(EntityId::intern("h-under")));
        assert_eq!(hit_test_stack(b.stacks(), Point::new(-10.0, -10.0)), None);
    }

    #[test]
    fn header_and_cards_are_distinguished() {
        let b = board();
        let over = EntityId::intern("h-over");
        assert_eq!(
            hit_test(&b, Point::new(150.0, HEADER_HEIGHT / 2.0), 1.0),
            Hit::StackHeader { stack: over }
        );
        assert_eq!(
            hit_test(&b, Point::new(150.0, 100.0), 1.0),
            Hit::Card {
                stack: over,
                card: EntityId::intern("h-o2")
            }
        );
        // Below the top card only the fanned back card shows.
        let top = card_rect(b.stack(over).unwrap(), 1).unwrap();
        assert_eq!(
            hit_test(&b, Point::new(150.0, top.y1 + 2.0), 1.0),
            Hit::Card {
                stack: over,
                card: EntityId::intern("h-o1")
            }
        );
    }

    #[test]
    fn padding_hits_the_stack() {
        let b = board();
        assert_eq!(
            hit_test(&b, Point::new(900.0 + STACK_PADDING / 2.0, 50.0), 1.0),
            Hit::Stack {
                stack: EntityId::intern("h-far")
            }
        );
    }

    #[test]
    fn resize_handle_scales_with_zoom() {
        let b = board();
        let far = b.stack(EntityId::intern("h-far")).unwrap();
        let at_1 = resize_handle_rect(far, 1.0).unwrap();
        let at_2 = resize_handle_rect(far, 2.0).unwrap();
        assert_eq!(at_1.width(), RESIZE_HANDLE_SIZE);
        assert_eq!(at_2.width(), RESIZE_HANDLE_SIZE / 2.0);

        let corner = Point::new(at_1.x1 - 1.0, at_1.y1 - 1.0);
        assert_eq!(
            hit_test(&b, corner, 1.0),
            Hit::ResizeHandle {
                stack: far.id,
                card: EntityId::intern("h-f1")
            }
        );
    }

    #[test]
    fn covered_resize_handle_is_not_hit() {
        let b = board();
        let under = b.stack(EntityId::intern("h-under")).unwrap();
        let handle = resize_handle_rect(under, 1.0).unwrap();
        // "h-over" covers the grip of "h-under".
        let hit = hit_test(&b, handle.center(), 1.0);
        assert_ne!(
            hit,
            Hit::ResizeHandle {
                stack: under.id,
                card: EntityId::intern("h-u1")
            }
        );
    }

    #[test]
    fn labels_and_lines() {
        let mut b = board();
        let under = EntityId::intern("h-under");
        let far = EntityId::intern("h-far");
        let id = b.add_connection(under, far).unwrap();
        let mid = stack_center(b.stack(under).unwrap()).midpoint(stack_center(b.stack(far).unwrap()));
        assert_eq!(hit_test(&b, mid, 1.0), Hit::ConnectionLabel { connection: id });

        let on_line = Point::new(800.0, stack_center(b.stack(far).unwrap()).y + 2.0);
        assert_eq!(hit_test(&b, on_line, 1.0), Hit::Connection { connection: id });
        assert_eq!(hit_test(&b, Point::new(800.0, 500.0), 1.0), Hit::Canvas);
    }
}
