//! The board: the ordered stack list and the connection list.
//!
//! Stack operations live here; connection operations are in
//! `connections.rs`. All operations on unknown ids are silent no-ops.

use crate::connections::ConnectionIndex;
use crate::geometry::{MIN_CARD_HEIGHT, MIN_CARD_WIDTH, card_size, rect_contains, stack_bounds};
use crate::id::EntityId;
use crate::model::{Card, Connection, Stack, normalize_optional};
use kurbo::{Point, Vec2};

/// Offset of a broken-out card's new stack from its old stack.
pub const BREAK_OUT_OFFSET: Vec2 = Vec2::new(50.0, 50.0);

/// What happened when a dragged stack was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Dropped on empty canvas; the stack now sits at the drop position.
    Moved,
    /// Dropped onto another stack, which absorbed all its cards.
    Merged { into: EntityId },
    /// The dragged stack no longer exists.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    /// Stacks in paint order: later stacks draw above earlier ones.
    pub(crate) stacks: Vec<Stack>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) index: ConnectionIndex,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from loaded data. Empty stacks are dropped; dangling
    /// connections are kept.
    pub fn from_parts(stacks: Vec<Stack>, connections: Vec<Connection>) -> Self {
        let stacks: Vec<Stack> = stacks.into_iter().filter(|s| !s.cards.is_empty()).collect();
        let index = ConnectionIndex::build(&connections);
        Self {
            stacks,
            connections,
            index,
        }
    }

    /// Stacks in paint order. Never contains an empty stack.
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    // ─── Lookups ─────────────────────────────────────────────────────────

    pub fn stack(&self, id: EntityId) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.id == id)
    }

    fn stack_mut(&mut self, id: EntityId) -> Option<&mut Stack> {
        self.stacks.iter_mut().find(|s| s.id == id)
    }

    pub fn stack_position(&self, id: EntityId) -> Option<usize> {
        self.stacks.iter().position(|s| s.id == id)
    }

    /// `(stack index, card index)` of a card.
    pub fn locate_card(&self, card_id: EntityId) -> Option<(usize, usize)> {
        self.stacks
            .iter()
            .enumerate()
            .find_map(|(si, s)| s.card_index(card_id).map(|ci| (si, ci)))
    }

    pub fn stack_of_card(&self, card_id: EntityId) -> Option<&Stack> {
        self.locate_card(card_id).map(|(si, _)| &self.stacks[si])
    }

    pub fn card(&self, card_id: EntityId) -> Option<&Card> {
        self.locate_card(card_id)
            .map(|(si, ci)| &self.stacks[si].cards[ci])
    }

    pub fn card_count(&self) -> usize {
        self.stacks.iter().map(|s| s.cards.len()).sum()
    }

    // ─── Drag ────────────────────────────────────────────────────────────

    /// Set a stack's position. Called on every pointer-move tick of a drag,
    /// so there is no collision check here.
    pub fn move_stack(&mut self, id: EntityId, x: f64, y: f64) {
        if let Some(stack) = self.stack_mut(id) {
            stack.x = x;
            stack.y = y;
            log::trace!("move stack {id} -> ({x}, {y})");
        }
    }

    /// Finish a drag. The drop point is the pointer when known, else the
    /// stack's new position. The first other stack (in list order) whose
    /// bounds contain the drop point absorbs the dragged stack.
    pub fn end_drag(&mut self, id: EntityId, x: f64, y: f64, pointer: Option<Point>) -> DropOutcome {
        let Some(dragged_idx) = self.stack_position(id) else {
            return DropOutcome::Ignored;
        };
        let drop = pointer.unwrap_or(Point::new(x, y));

        let target = self
            .stacks
            .iter()
            .find(|s| s.id != id && rect_contains(&stack_bounds(s), drop))
            .map(|s| s.id);

        let Some(target_id) = target else {
            let stack = &mut self.stacks[dragged_idx];
            stack.x = x;
            stack.y = y;
            log::debug!("drop stack {id} at ({x}, {y})");
            return DropOutcome::Moved;
        };

        let dragged = self.stacks.remove(dragged_idx);
        if let Some(target) = self.stack_mut(target_id) {
            merge_into(target, dragged);
        }
        log::debug!("merge stack {id} into {target_id}");
        DropOutcome::Merged { into: target_id }
    }

    /// Rotate a multi-card stack. Positive `delta_y` shifts the first (back)
    /// card off and pushes it on top; negative pops the top card and puts it
    /// at the back.
    pub fn scroll_reorder(&mut self, id: EntityId, delta_y: f64) {
        let Some(stack) = self.stack_mut(id) else {
            return;
        };
        if stack.cards.len() < 2 || delta_y == 0.0 || delta_y.is_nan() {
            return;
        }
        if delta_y > 0.0 {
            stack.cards.rotate_left(1);
        } else {
            stack.cards.rotate_right(1);
        }
    }

    // ─── Card lifecycle ──────────────────────────────────────────────────

    /// Move a card out of its stack into a new single-card stack offset
    /// from the old one. Returns the new stack's id.
    pub fn break_out(&mut self, card_id: EntityId) -> Option<EntityId> {
        let (si, ci) = self.locate_card(card_id)?;
        let origin = Point::new(self.stacks[si].x, self.stacks[si].y) + BREAK_OUT_OFFSET;
        let card = self.stacks[si].cards.remove(ci);
        self.collapse_if_empty(si);

        let new_id = EntityId::generate("stack");
        self.stacks
            .push(Stack::new(new_id, origin.x, origin.y, vec![card]));
        log::debug!("break out card {card_id} into stack {new_id}");
        Some(new_id)
    }

    /// Remove a card. Callers are responsible for having confirmed it.
    pub fn delete_card(&mut self, card_id: EntityId) -> Option<Card> {
        let (si, ci) = self.locate_card(card_id)?;
        let card = self.stacks[si].cards.remove(ci);
        self.collapse_if_empty(si);
        Some(card)
    }

    /// Place a card in a new stack at `at`. Returns the stack id.
    pub fn add_card(&mut self, card: Card, at: Point) -> EntityId {
        let id = EntityId::generate("stack");
        self.stacks.push(Stack::new(id, at.x, at.y, vec![card]));
        id
    }

    /// Replace a card record wholesale, keeping its identity.
    pub fn update_card(&mut self, card: Card) -> bool {
        match self.locate_card(card.id) {
            Some((si, ci)) => {
                self.stacks[si].cards[ci] = card;
                true
            }
            None => false,
        }
    }

    /// Set (or clear, for blank text) a stack's title.
    pub fn set_stack_title(&mut self, id: EntityId, text: &str) {
        if let Some(stack) = self.stack_mut(id) {
            stack.title = normalize_optional(text);
        }
    }

    /// Resize a card, clamped to the minimum card size.
    pub fn resize_card(&mut self, card_id: EntityId, width: f64, height: f64) {
        let Some((si, ci)) = self.locate_card(card_id) else {
            return;
        };
        if !width.is_finite() || !height.is_finite() {
            return;
        }
        let card = &mut self.stacks[si].cards[ci];
        card.width = Some(width.max(MIN_CARD_WIDTH));
        card.height = Some(height.max(MIN_CARD_HEIGHT));
    }

    /// Remove a whole stack. Its connections become dangling.
    pub fn delete_stack(&mut self, id: EntityId) -> Option<Stack> {
        let idx = self.stack_position(id)?;
        Some(self.stacks.remove(idx))
    }

    fn collapse_if_empty(&mut self, stack_idx: usize) {
        if self.stacks[stack_idx].cards.is_empty() {
            let removed = self.stacks.remove(stack_idx);
            log::debug!("stack {} emptied, removed", removed.id);
        }
    }
}

/// Append `dragged`'s cards onto `target`, giving every card of both the
/// larger of the two top-card sizes.
fn merge_into(target: &mut Stack, dragged: Stack) {
    let size_of = |s: &Stack| s.top_card().map(card_size);
    let (Some(t), Some(d)) = (size_of(target), size_of(&dragged)) else {
        target.cards.extend(dragged.cards);
        return;
    };
    let width = t.width.max(d.width);
    let height = t.height.max(d.height);

    target.cards.extend(dragged.cards);
    for card in &mut target.cards {
        card.width = Some(width);
        card.height = Some(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(id: &str) -> Card {
        Card::new(EntityId::intern(id), id)
    }

    fn ids(stack: &Stack) -> Vec<&str> {
        stack.cards.iter().map(|c| c.id.as_str()).collect()
    }

    fn board() -> Board {
        Board::from_parts(
            vec![
                Stack::new(EntityId::intern("b-s1"), 0.0, 0.0, vec![card("b-a1")]),
                Stack::new(
                    EntityId::intern("b-s2"),
                    400.0,
                    0.0,
                    vec![card("b-b1"), card("b-b2")],
                ),
            ],
            vec![],
        )
    }

    #[test]
    fn move_stack_sets_position() {
        let mut b = board();
        b.move_stack(EntityId::intern("b-s1"), 12.0, 34.0);
        let s = b.stack(EntityId::intern("b-s1")).unwrap();
        assert_eq!((s.x, s.y), (12.0, 34.0));
        b.move_stack(EntityId::intern("missing"), 1.0, 1.0);
    }

    #[test]
    fn merge_appends_dragged_cards_and_unifies_size() {
        let mut b = board();
        b.stacks[0].cards[0].width = Some(260.0);
        b.stacks[1].cards[1].height = Some(190.0);

        let outcome = b.end_drag(
            EntityId::intern("b-s1"),
            390.0,
            10.0,
            Some(Point::new(410.0, 20.0)),
        );
        assert_eq!(outcome, DropOutcome::Merged { into: EntityId::intern("b-s2") });
        assert_eq!(b.stacks.len(), 1);
        assert_eq!(ids(&b.stacks[0]), vec!["b-b1", "b-b2", "b-a1"]);
        for c in &b.stacks[0].cards {
            assert_eq!((c.width, c.height), (Some(260.0), Some(190.0)));
        }
    }

    #[test]
    fn drop_on_empty_canvas_relocates() {
        let mut b = board();
        let outcome = b.end_drag(EntityId::intern("b-s1"), 900.0, 900.0, None);
        assert_eq!(outcome, DropOutcome::Moved);
        assert_eq!(b.stacks.len(), 2);
        assert_eq!((b.stacks[0].x, b.stacks[0].y), (900.0, 900.0));
    }

    #[test]
    fn drop_uses_position_without_pointer() {
        let mut b = board();
        let outcome = b.end_drag(EntityId::intern("b-s1"), 420.0, 30.0, None);
        assert!(matches!(outcome, DropOutcome::Merged { .. }));
    }

    #[test]
    fn end_drag_on_unknown_stack_is_ignored() {
        let mut b = board();
        assert_eq!(
            b.end_drag(EntityId::intern("ghost"), 0.0, 0.0, None),
            DropOutcome::Ignored
        );
        assert_eq!(b.stacks.len(), 2);
    }

    #[test]
    fn first_stack_in_list_order_wins() {
        let mut b = Board::from_parts(
            vec![
                Stack::new(EntityId::intern("t-drag"), 900.0, 900.0, vec![card("t-d")]),
                Stack::new(EntityId::intern("t-first"), 0.0, 0.0, vec![card("t-f")]),
                Stack::new(EntityId::intern("t-second"), 10.0, 10.0, vec![card("t-s")]),
            ],
            vec![],
        );
        let outcome = b.end_drag(EntityId::intern("t-drag"), 50.0, 50.0, None);
        assert_eq!(outcome, DropOutcome::Merged { into: EntityId::intern("t-first") });
    }

    #[test]
    fn scroll_reorder_rotates_both_ways() {
        let mut b = board();
        let s2 = EntityId::intern("b-s2");
        b.stacks[1].cards.push(card("b-b3"));

        b.scroll_reorder(s2, 1.0);
        assert_eq!(ids(b.stack(s2).unwrap()), vec!["b-b2", "b-b3", "b-b1"]);
        b.scroll_reorder(s2, -1.0);
        assert_eq!(ids(b.stack(s2).unwrap()), vec!["b-b1", "b-b2", "b-b3"]);
        b.scroll_reorder(s2, -1.0);
        assert_eq!(ids(b.stack(s2).unwrap()), vec!["b-b3", "b-b1", "b-b2"]);
    }

    #[test]
    fn scroll_reorder_is_cyclic() {
        let mut b = board();
        let s2 = EntityId::intern("b-s2");
        b.stacks[1].cards.extend([card("b-b3"), card("b-b4")]);
        let before = ids(b.stack(s2).unwrap()).join(",");
        for _ in 0..4 {
            b.scroll_reorder(s2, 3.0);
        }
        assert_eq!(ids(b.stack(s2).unwrap()).join(","), before);
    }

    #[test]
    fn scroll_reorder_ignores_single_card() {
        let mut b = board();
        b.scroll_reorder(EntityId::intern("b-s1"), 1.0);
        assert_eq!(ids(&b.stacks[0]), vec!["b-a1"]);
    }

    #[test]
    fn break_out_creates_offset_stack() {
        let mut b = board();
        let new_id = b.break_out(EntityId::intern("b-b1")).unwrap();
        let new_stack = b.stack(new_id).unwrap();
        assert_eq!((new_stack.x, new_stack.y), (450.0, 50.0));
        assert_eq!(ids(new_stack), vec!["b-b1"]);
        assert_eq!(ids(b.stack(EntityId::intern("b-s2")).unwrap()), vec!["b-b2"]);
    }

    #[test]
    fn break_out_of_last_card_collapses_stack() {
        let mut b = board();
        b.break_out(EntityId::intern("b-a1")).unwrap();
        assert!(b.stack(EntityId::intern("b-s1")).is_none());
        assert_eq!(b.stacks.len(), 2);
        assert_eq!(b.card_count(), 3);
    }

    #[test]
    fn delete_card_collapses_empty_stack() {
        let mut b = board();
        assert!(b.delete_card(EntityId::intern("b-a1")).is_some());
        assert!(b.stack(EntityId::intern("b-s1")).is_none());
        assert!(b.delete_card(EntityId::intern("b-a1")).is_none());
    }

    #[test]
    fn resize_is_clamped() {
        let mut b = board();
        b.resize_card(EntityId::intern("b-a1"), 10.0, 500.0);
        let c = b.card(EntityId::intern("b-a1")).unwrap();
        assert_eq!((c.width, c.height), (Some(MIN_CARD_WIDTH), Some(500.0)));
    }

    #[test]
    fn stack_title_blank_clears() {
        let mut b = board();
        let s = EntityId::intern("b-s2");
        b.set_stack_title(s, "  Ideas ");
        assert_eq!(b.stack(s).unwrap().title.as_deref(), Some("Ideas"));
        b.set_stack_title(s, "   ");
        assert_eq!(b.stack(s).unwrap().title, None);
    }

    #[test]
    fn from_parts_drops_empty_stacks() {
        let b = Board::from_parts(
            vec![Stack::new(EntityId::intern("empty"), 0.0, 0.0, vec![])],
            vec![],
        );
        assert!(b.stacks.is_empty());
    }
}
