//! Stack and card geometry.
//!
//! Hit testing, drop collision, connection endpoints, focus fitting,
//! overlay anchoring and timeline connectors all call through
//! these functions. Nothing else may re-derive the padding or fan offsets.
//!
//! Layout of a stack anchored at `(x, y)`:
//!
//! ```text
//! (x, y) ┌──────────────────────────┐
//!        │ header band (n > 1 only) │
//!        │  ┌────────────────────┐  │ ← pad
//!        │  │ title band         │  │
//!        │  │ content            │  │   top card, w × h
//!        │  │ date │ key │ tags  │  │
//!        │  └────────────────────┘  │
//!        └──────────────────────────┘
//! ```
//!
//! Cards below the top are shifted down by `FAN_STEP` per depth and shrunk
//! by `SCALE_STEP` per depth, so their lower edges peek out under the top
//! card.

use crate::model::{Card, CardField, Stack};
use kurbo::{Point, Rect, Size};

pub const DEFAULT_CARD_WIDTH: f64 = 200.0;
pub const DEFAULT_CARD_HEIGHT: f64 = 150.0;
pub const MIN_CARD_WIDTH: f64 = 120.0;
pub const MIN_CARD_HEIGHT: f64 = 80.0;

/// Border padding around the top card, on every side.
pub const STACK_PADDING: f64 = 8.0;
/// Band above the cards showing the stack title / card count.
pub const HEADER_HEIGHT: f64 = 24.0;
/// Vertical shift per depth level below the top card.
pub const FAN_STEP: f64 = 6.0;
/// Scale decrement per depth level below the top card.
pub const SCALE_STEP: f64 = 0.02;
pub const MIN_SCALE: f64 = 0.9;

pub const TITLE_BAND: f64 = 28.0;
pub const META_BAND: f64 = 24.0;

/// Where a card sits relative to the top card's origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardOffset {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl CardOffset {
    pub const TOP: CardOffset = CardOffset {
        x: 0.0,
        y: 0.0,
        scale: 1.0,
    };
}

/// Inclusive point-in-rect test (edges count as inside).
pub fn rect_contains(rect: &Rect, p: Point) -> bool {
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}

/// A card's dimensions: its override, else the defaults.
pub fn card_size(card: &Card) -> Size {
    Size::new(
        card.width.unwrap_or(DEFAULT_CARD_WIDTH),
        card.height.unwrap_or(DEFAULT_CARD_HEIGHT),
    )
}

/// Size of the stack's top card (defaults for an empty stack).
pub fn top_card_size(stack: &Stack) -> Size {
    stack
        .top_card()
        .map(card_size)
        .unwrap_or(Size::new(DEFAULT_CARD_WIDTH, DEFAULT_CARD_HEIGHT))
}

fn header_height(stack: &Stack) -> f64 {
    if stack.cards.len() > 1 { HEADER_HEIGHT } else { 0.0 }
}

/// Top-left corner of the top card.
fn card_origin(stack: &Stack) -> Point {
    Point::new(
        stack.x + STACK_PADDING,
        stack.y + header_height(stack) + STACK_PADDING,
    )
}

/// Bounding box of a stack, from its top card plus padding and header.
pub fn stack_bounds(stack: &Stack) -> Rect {
    let size = top_card_size(stack);
    Rect::new(
        stack.x,
        stack.y,
        stack.x + size.width + 2.0 * STACK_PADDING,
        stack.y + header_height(stack) + size.height + 2.0 * STACK_PADDING,
    )
}

/// Centroid of the top card's footprint. Connection endpoints and timeline
/// connectors attach here.
pub fn stack_center(stack: &Stack) -> Point {
    let size = top_card_size(stack);
    let origin = card_origin(stack);
    Point::new(origin.x + size.width / 2.0, origin.y + size.height / 2.0)
}

/// Offset and scale of card `index` inside `stack`.
///
/// Returns `None` for an out-of-range index.
pub fn card_offset_within_stack(stack: &Stack, index: usize) -> Option<CardOffset> {
    let n = stack.cards.len();
    if index >= n {
        return None;
    }
    let depth = (n - 1 - index) as f64;
    if depth == 0.0 {
        return Some(CardOffset::TOP);
    }
    Some(CardOffset {
        x: 0.0,
        y: depth * FAN_STEP,
        scale: (1.0 - depth * SCALE_STEP).max(MIN_SCALE),
    })
}

/// Canvas rectangle of card `index`, after its fan offset and scale
/// (scaled about its own top-left corner).
pub fn card_rect(stack: &Stack, index: usize) -> Option<Rect> {
    let offset = card_offset_within_stack(stack, index)?;
    let size = card_size(&stack.cards[index]);
    let origin = card_origin(stack);
    let x0 = origin.x + offset.x;
    let y0 = origin.y + offset.y;
    Some(Rect::new(
        x0,
        y0,
        x0 + size.width * offset.scale,
        y0 + size.height * offset.scale,
    ))
}

/// The band of a card an editor overlay covers for `field`.
pub fn card_field_rect(stack: &Stack, index: usize, field: CardField) -> Option<Rect> {
    let card = card_rect(stack, index)?;
    let scale = card_offset_within_stack(stack, index)?.scale;
    let title = TITLE_BAND * scale;
    let meta = META_BAND * scale;
    let third = card.width() / 3.0;
    let meta_top = (card.y1 - meta).max(card.y0 + title);

    let rect = match field {
        CardField::Title => Rect::new(card.x0, card.y0, card.x1, card.y0 + title),
        CardField::Content => Rect::new(card.x0, card.y0 + title, card.x1, meta_top),
        CardField::Date => Rect::new(card.x0, meta_top, card.x0 + third, card.y1),
        CardField::Key => Rect::new(card.x0 + third, meta_top, card.x0 + 2.0 * third, card.y1),
        CardField::Tags => Rect::new(card.x0 + 2.0 * third, meta_top, card.x1, card.y1),
    };
    Some(rect)
}

/// Header band of a multi-card stack; single-card stacks have none.
pub fn header_rect(stack: &Stack) -> Option<Rect> {
    if stack.cards.len() < 2 {
        return None;
    }
    let bounds = stack_bounds(stack);
    Some(Rect::new(
        bounds.x0,
        bounds.y0,
        bounds.x1,
        bounds.y0 + HEADER_HEIGHT,
    ))
}

/// Union of `stack_bounds` over `stacks`; `None` when empty.
pub fn union_bounds<'a>(stacks: impl IntoIterator<Item = &'a Stack>) -> Option<Rect> {
    stacks
        .into_iter()
        .map(stack_bounds)
        .reduce(|acc, b| acc.union(b))
}
