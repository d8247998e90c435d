//! Pointer tools for canvas interactions.
//!
//! Each tool owns one drag gesture (begin → move → end) and translates
//! input into [`BoardMutation`]s applied through the [`BoardEngine`].
//! [`Interaction`] decides which tool a pointer-down starts and routes the
//! rest of the gesture to it; only one gesture is live at a time.
//!
//! | Pointer-down on            | Modifier | Tool            |
//! |----------------------------|----------|-----------------|
//! | top card's resize grip     | -        | `ResizeTool`    |
//! | stack / card / header      | -        | `StackDragTool` |
//! | stack / card / header      | Alt      | `ConnectTool`   |
//!
//! Wheel: Ctrl/⌘ zooms, over a multi-card stack it reorders the stack,
//! elsewhere it pans.

use crate::engine::{Applied, BoardEngine, BoardMutation};
use crate::input::InputEvent;
use nc_core::geometry::card_size;
use nc_core::id::EntityId;
use nc_core::{Board, ConnectionDrag, Line, Point, Size, Vec2, ViewTransform};
use nc_render::connector::rubber_band;
use nc_render::hit::{Hit, hit_test, hit_test_stack};
use nc_render::raster::RasterCache;

/// Zoom multiplier per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Where the canvas sits on the page and how it is transformed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasFrame {
    pub transform: ViewTransform,
    /// The canvas viewport starts this many pixels from the page's left edge.
    pub sidebar_width: f64,
}

impl CanvasFrame {
    pub fn to_canvas(&self, client: Point) -> Point {
        self.transform.client_to_canvas(client, self.sidebar_width)
    }

    pub fn to_screen(&self, client: Point) -> Point {
        Point::new(client.x - self.sidebar_width, client.y)
    }
}

/// Everything a tool may read, plus the raster cache it signals on resize.
pub struct ToolContext<'a> {
    pub board: &'a Board,
    pub frame: CanvasFrame,
    pub raster: &'a mut RasterCache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    StackDrag,
    Connect,
    Resize,
}

pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle a move or release, returning zero or more mutations.
    fn handle(&mut self, event: &InputEvent, ctx: &mut ToolContext<'_>) -> Vec<BoardMutation>;

    /// False once the gesture has ended.
    fn is_active(&self) -> bool;

    /// Transient line to draw while the gesture is live.
    fn preview(&self) -> Option<Line> {
        None
    }
}

// ─── Stack drag ──────────────────────────────────────────────────────────

pub struct StackDragTool {
    stack: EntityId,
    /// Pointer position relative to the stack origin at grab time.
    grab: Vec2,
    /// Canvas point of the press.
    press: Point,
    moved: bool,
    active: bool,
}

impl StackDragTool {
    pub fn begin(board: &Board, stack: EntityId, pointer: Point) -> Option<Self> {
        let s = board.stack(stack)?;
        Some(Self {
            stack,
            grab: pointer - Point::new(s.x, s.y),
            press: pointer,
            moved: false,
            active: true,
        })
    }

    fn origin_for(&self, pointer: Point) -> Point {
        pointer - self.grab
    }
}

impl Tool for StackDragTool {
    fn kind(&self) -> ToolKind {
        ToolKind::StackDrag
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ToolContext<'_>) -> Vec<BoardMutation> {
        if !self.active {
            return vec![];
        }
        match *event {
            InputEvent::PointerMove { x, y, .. } => {
                let p = ctx.frame.to_canvas(Point::new(x, y));
                if !self.moved && p == self.press {
                    return vec![];
                }
                self.moved = true;
                let o = self.origin_for(p);
                vec![BoardMutation::MoveStack {
                    id: self.stack,
                    x: o.x,
                    y: o.y,
                }]
            }
            InputEvent::PointerUp { x, y, .. } => {
                self.active = false;
                let p = ctx.frame.to_canvas(Point::new(x, y));
                // A click without travel is not a drop.
                if !self.moved && p == self.press {
                    return vec![];
                }
                let o = self.origin_for(p);
                vec![BoardMutation::EndStackDrag {
                    id: self.stack,
                    x: o.x,
                    y: o.y,
                    pointer: Some(p),
                }]
            }
            _ => vec![],
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ─── Connection draw ─────────────────────────────────────────────────────

pub struct ConnectTool {
    drag: ConnectionDrag,
    active: bool,
}

impl ConnectTool {
    pub fn begin(board: &Board, from: EntityId, pointer: Point) -> Option<Self> {
        Some(Self {
            drag: ConnectionDrag::start(board, from, pointer)?,
            active: true,
        })
    }
}

impl Tool for ConnectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Connect
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ToolContext<'_>) -> Vec<BoardMutation> {
        if !self.active {
            return vec![];
        }
        match *event {
            InputEvent::PointerMove { x, y, .. } => {
                self.drag.move_to(ctx.frame.to_canvas(Point::new(x, y)));
                vec![]
            }
            InputEvent::PointerUp { x, y, .. } => {
                self.active = false;
                let p = ctx.frame.to_canvas(Point::new(x, y));
                match self.drag.drop_target(ctx.board, p) {
                    Some(to) if !ctx.board.is_connected(self.drag.from, to) => {
                        vec![BoardMutation::AddConnection {
                            from: self.drag.from,
                            to,
                        }]
                    }
                    _ => vec![],
                }
            }
            _ => vec![],
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn preview(&self) -> Option<Line> {
        self.active.then(|| rubber_band(&self.drag))
    }
}

// ─── Resize ──────────────────────────────────────────────────────────────

/// Drags a top card's bottom-right corner. Bitmap regeneration for the card
/// is suspended for the duration of the gesture.
pub struct ResizeTool {
    card: EntityId,
    start_size: Size,
    start_pointer: Point,
    active: bool,
}

impl ResizeTool {
    pub fn begin(board: &Board, raster: &mut RasterCache, card: EntityId, pointer: Point) -> Option<Self> {
        let start_size = card_size(board.card(card)?);
        raster.begin_resize(card, start_size);
        Some(Self {
            card,
            start_size,
            start_pointer: pointer,
            active: true,
        })
    }

    fn resize_to(&self, pointer: Point) -> BoardMutation {
        let d = pointer - self.start_pointer;
        BoardMutation::ResizeCard {
            card: self.card,
            width: self.start_size.width + d.x,
            height: self.start_size.height + d.y,
        }
    }
}

impl Tool for ResizeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Resize
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ToolContext<'_>) -> Vec<BoardMutation> {
        if !self.active {
            return vec![];
        }
        match *event {
            InputEvent::PointerMove { x, y, .. } => {
                vec![self.resize_to(ctx.frame.to_canvas(Point::new(x, y)))]
            }
            InputEvent::PointerUp { x, y, .. } => {
                self.active = false;
                ctx.raster.end_resize(self.card);
                vec![self.resize_to(ctx.frame.to_canvas(Point::new(x, y)))]
            }
            _ => vec![],
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ─── Router ──────────────────────────────────────────────────────────────

/// Routes raw input to the right tool and applies what comes back.
#[derive(Default)]
pub struct Interaction {
    active: Option<Box<dyn Tool>>,
    pub sidebar_width: f64,
}

impl Interaction {
    pub fn new(sidebar_width: f64) -> Self {
        Self {
            active: None,
            sidebar_width,
        }
    }

    pub fn active_kind(&self) -> Option<ToolKind> {
        self.active.as_ref().map(|t| t.kind())
    }

    /// Rubber band of an in-progress connection draw.
    pub fn preview(&self) -> Option<Line> {
        self.active.as_ref().and_then(|t| t.preview())
    }

    pub fn frame(&self, engine: &BoardEngine) -> CanvasFrame {
        CanvasFrame {
            transform: engine.view,
            sidebar_width: self.sidebar_width,
        }
    }

    /// Feed one pointer or wheel event. Key events are ignored here.
    pub fn handle(&mut self, event: &InputEvent, engine: &mut BoardEngine, raster: &mut RasterCache) -> Vec<Applied> {
        let frame = self.frame(engine);
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                if self.active.is_some() {
                    return vec![];
                }
                let p = frame.to_canvas(Point::new(*x, *y));
                self.active = start_tool(&engine.board, raster, p, engine.view.zoom, modifiers.alt);
                if let Some(tool) = &self.active {
                    log::debug!("begin {:?} at {p:?}", tool.kind());
                }
                vec![]
            }
            InputEvent::PointerMove { .. } | InputEvent::PointerUp { .. } => {
                let Some(tool) = self.active.as_mut() else {
                    return vec![];
                };
                let mutations = {
                    let mut ctx = ToolContext {
                        board: &engine.board,
                        frame,
                        raster: &mut *raster,
                    };
                    tool.handle(event, &mut ctx)
                };
                if !tool.is_active() {
                    log::debug!("end {:?}", tool.kind());
                    self.active = None;
                }
                mutations.into_iter().map(|m| engine.apply(m)).collect()
            }
            InputEvent::Scroll {
                x,
                y,
                dx,
                dy,
                modifiers,
            } => {
                let client = Point::new(*x, *y);
                if modifiers.cmd() {
                    let factor = if *dy < 0.0 { WHEEL_ZOOM_STEP } else { 1.0 / WHEEL_ZOOM_STEP };
                    engine.zoom_about(frame.to_screen(client), factor);
                    return vec![];
                }
                let over = hit_test_stack(engine.board.stacks(), frame.to_canvas(client))
                    .filter(|id| engine.board.stack(*id).is_some_and(|s| s.cards.len() > 1));
                match over {
                    Some(id) => vec![engine.apply(BoardMutation::ScrollReorder { id, delta_y: *dy })],
                    None => {
                        engine.pan(-dx, -dy);
                        vec![]
                    }
                }
            }
            InputEvent::Key { .. } => vec![],
        }
    }
}

fn start_tool(board: &Board, raster: &mut RasterCache, p: Point, zoom: f64, connect: bool) -> Option<Box<dyn Tool>> {
    match hit_test(board, p, zoom) {
        Hit::ResizeHandle { card, .. } => {
            ResizeTool::begin(board, raster, card, p).map(|t| Box::new(t) as Box<dyn Tool>)
        }
        Hit::StackHeader { stack } | Hit::Card { stack, .. } | Hit::Stack { stack } => {
            if connect {
                ConnectTool::begin(board, stack, p).map(|t| Box::new(t) as Box<dyn Tool>)
            } else {
                StackDragTool::begin(board, stack, p).map(|t| Box::new(t) as Box<dyn Tool>)
            }
        }
        Hit::ConnectionLabel { .. } | Hit::Connection { .. } | Hit::Canvas => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use nc_core::geometry::{STACK_PADDING, stack_center};
    use nc_core::model::{Card, Stack, parse_iso};
    use nc_core::WorkspaceData;
    use nc_render::hit::resize_handle_rect;
    use pretty_assertions::assert_eq;

    const SIDEBAR: f64 = 300.0;

    fn engine() -> BoardEngine {
        let mut ws = WorkspaceData::empty(parse_iso("2025-01-01").unwrap());
        let card = |id: &str| Card::new(EntityId::intern(id), id);
        ws.stacks = vec![
            Stack::new(EntityId::intern("tl-a"), 0.0, 0.0, vec![card("tl-a1")]),
            Stack::new(EntityId::intern("tl-b"), 500.0, 0.0, vec![card("tl-b1"), card("tl-b2")]),
        ];
        BoardEngine::from_workspace(ws)
    }

    /// Client point for a canvas point under the engine's transform.
    fn client(engine: &BoardEngine, p: Point) -> Point {
        engine.view.canvas_to_client(p, SIDEBAR)
    }

    fn down(p: Point, modifiers: Modifiers) -> InputEvent {
        InputEvent::PointerDown {
            x: p.x,
            y: p.y,
            modifiers,
        }
    }

    #[test]
    fn drag_moves_then_drops() {
        let mut e = engine();
        e.view = ViewTransform::new(2.0, 40.0, 10.0);
        let mut raster = RasterCache::default();
        let mut ia = Interaction::new(SIDEBAR);

        let grab = client(&e, Point::new(50.0, 50.0));
        ia.handle(&down(grab, Modifiers::NONE), &mut e, &mut raster);
        assert_eq!(ia.active_kind(), Some(ToolKind::StackDrag));

        let to = client(&e, Point::new(150.0, 450.0));
        ia.handle(&InputEvent::pointer_move(to.x, to.y), &mut e, &mut raster);
        let s = e.board.stack(EntityId::intern("tl-a")).unwrap();
        assert!((s.x - 100.0).abs() < 1e-9 && (s.y - 400.0).abs() < 1e-9);

        let applied = ia.handle(&InputEvent::pointer_up(to.x, to.y), &mut e, &mut raster);
        assert_eq!(applied, vec![Applied::Changed]);
        assert_eq!(ia.active_kind(), None);
        assert_eq!(e.board.stacks().len(), 2);
    }

    #[test]
    fn drop_on_stack_merges() {
        let mut e = engine();
        let mut raster = RasterCache::default();
        let mut ia = Interaction::new(SIDEBAR);
        ia.handle(&down(client(&e, Point::new(50.0, 50.0)), Modifiers::NONE), &mut e, &mut raster);
        let over_b = client(&e, Point::new(560.0, 60.0));
        let applied = ia.handle(&InputEvent::pointer_up(over_b.x, over_b.y), &mut e, &mut raster);
        assert_eq!(
            applied,
            vec![Applied::Merged {
                into: EntityId::intern("tl-b")
            }]
        );
        assert_eq!(e.board.stacks()[0].cards.len(), 3);
    }

    #[test]
    fn click_on_overlapping_stacks_changes_nothing() {
        let mut ws = WorkspaceData::empty(parse_iso("2025-01-01").unwrap());
        let card = |id: &str| Card::new(EntityId::intern(id), id);
        ws.stacks = vec![
            Stack::new(EntityId::intern("tc-under"), 0.0, 0.0, vec![card("tc-u1")]),
            Stack::new(EntityId::intern("tc-over"), 100.0, 40.0, vec![card("tc-o1")]),
        ];
        let mut e = BoardEngine::from_workspace(ws);
        let mut raster = RasterCache::default();
        let mut ia = Interaction::new(SIDEBAR);

        let click = client(&e, Point::new(150.0, 80.0));
        ia.handle(&down(click, Modifiers::NONE), &mut e, &mut raster);
        assert_eq!(ia.active_kind(), Some(ToolKind::StackDrag));
        ia.handle(&InputEvent::pointer_move(click.x, click.y), &mut e, &mut raster);
        let applied = ia.handle(&InputEvent::pointer_up(click.x, click.y), &mut e, &mut raster);

        assert!(applied.is_empty());
        assert_eq!(ia.active_kind(), None);
        assert_eq!(e.board.stacks().len(), 2);
        let over = e.board.stack(EntityId::intern("tc-over")).unwrap();
        assert_eq!((over.x, over.y), (100.0, 40.0));
        assert!(!e.is_dirty());
    }

    #[test]
    fn alt_drag_draws_connection() {
        let mut e = engine();
        let mut raster = RasterCache::default();
        let mut ia = Interaction::new(SIDEBAR);
        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        ia.handle(&down(client(&e, Point::new(50.0, 50.0)), alt), &mut e, &mut raster);
        assert_eq!(ia.active_kind(), Some(ToolKind::Connect));

        let mid = client(&e, Point::new(300.0, 300.0));
        ia.handle(&InputEvent::pointer_move(mid.x, mid.y), &mut e, &mut raster);
        let band = ia.preview().unwrap();
        assert_eq!(band.p0, stack_center(&e.board.stacks()[0]));
        assert_eq!(band.p1, Point::new(300.0, 300.0));

        let target = client(&e, Point::new(560.0, 60.0));
        let applied = ia.handle(&InputEvent::pointer_up(target.x, target.y), &mut e, &mut raster);
        assert!(matches!(applied.as_slice(), [Applied::Created(_)]));
        assert!(e.board.is_connected(EntityId::intern("tl-a"), EntityId::intern("tl-b")));
        // Stacks did not move.
        assert_eq!((e.board.stacks()[0].x, e.board.stacks()[0].y), (0.0, 0.0));

        // Same pair again (reverse direction) is suppressed.
        ia.handle(&down(client(&e, Point::new(560.0, 60.0)), alt), &mut e, &mut raster);
        let back = client(&e, Point::new(50.0, 50.0));
        let applied = ia.handle(&InputEvent::pointer_up(back.x, back.y), &mut e, &mut raster);
        assert!(applied.is_empty());
        assert_eq!(e.board.connections().len(), 1);
    }

    #[test]
    fn resize_suspends_raster_and_clamps() {
        let mut e = engine();
        let mut raster = RasterCache::default();
        let mut ia = Interaction::new(SIDEBAR);
        let a1 = EntityId::intern("tl-a1");

        let grip = resize_handle_rect(&e.board.stacks()[0], e.view.zoom).unwrap().center();
        ia.handle(&down(client(&e, grip), Modifiers::NONE), &mut e, &mut raster);
        assert_eq!(ia.active_kind(), Some(ToolKind::Resize));
        assert!(raster.is_resizing(a1));

        let bigger = client(&e, grip + Vec2::new(40.0, 20.0));
        ia.handle(&InputEvent::pointer_move(bigger.x, bigger.y), &mut e, &mut raster);
        let c = e.board.card(a1).unwrap();
        assert_eq!((c.width, c.height), (Some(240.0), Some(170.0)));

        let tiny = client(&e, grip - Vec2::new(500.0, 500.0));
        ia.handle(&InputEvent::pointer_up(tiny.x, tiny.y), &mut e, &mut raster);
        assert!(!raster.is_resizing(a1));
        let c = e.board.card(a1).unwrap();
        assert_eq!((c.width, c.height), (Some(120.0), Some(80.0)));
    }

    #[test]
    fn wheel_reorders_pans_and_zooms() {
        let mut e = engine();
        let mut raster = RasterCache::default();
        let mut ia = Interaction::new(SIDEBAR);
        let wheel = |p: Point, dy: f64, modifiers: Modifiers| InputEvent::Scroll {
            x: p.x,
            y: p.y,
            dx: 0.0,
            dy,
            modifiers,
        };

        let over_b = client(&e, Point::new(520.0, 80.0));
        let applied = ia.handle(&wheel(over_b, 1.0, Modifiers::NONE), &mut e, &mut raster);
        assert_eq!(applied, vec![Applied::Changed]);
        let top = e.board.stacks()[1].top_card().unwrap().id;
        assert_eq!(top, EntityId::intern("tl-b1"));

        // Single-card stack: pans instead.
        let over_a = client(&e, Point::new(STACK_PADDING + 10.0, 50.0));
        ia.handle(&wheel(over_a, 25.0, Modifiers::NONE), &mut e, &mut raster);
        assert_eq!(e.view.y, -25.0);

        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        ia.handle(&wheel(over_a, -1.0, ctrl), &mut e, &mut raster);
        assert!((e.view.zoom - WHEEL_ZOOM_STEP).abs() < 1e-9);
    }

    #[test]
    fn one_gesture_at_a_time() {
        let mut e = engine();
        let mut raster = RasterCache::default();
        let mut ia = Interaction::new(SIDEBAR);
        ia.handle(&down(client(&e, Point::new(50.0, 50.0)), Modifiers::NONE), &mut e, &mut raster);
        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        ia.handle(&down(client(&e, Point::new(560.0, 60.0)), alt), &mut e, &mut raster);
        assert_eq!(ia.active_kind(), Some(ToolKind::StackDrag));
    }

    #[test]
    fn canvas_press_starts_nothing() {
        let mut e = engine();
        let mut raster = RasterCache::default();
        let mut ia = Interaction::new(SIDEBAR);
        ia.handle(&down(client(&e, Point::new(-200.0, 900.0)), Modifiers::NONE), &mut e, &mut raster);
        assert_eq!(ia.active_kind(), None);
        let applied = ia.handle(&InputEvent::pointer_up(0.0, 0.0), &mut e, &mut raster);
        assert!(applied.is_empty());
    }
}
