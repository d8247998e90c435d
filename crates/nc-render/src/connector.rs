//! Connection line and label geometry.
//!
//! Lines run between the two stacks' centroids; the label sits at the
//! segment midpoint in a box sized from its text. Dangling connections
//! produce no geometry.

use kurbo::{Line, Point, Rect, Size};
use nc_core::board::Board;
use nc_core::connections::ConnectionDrag;
use nc_core::id::EntityId;
use nc_core::model::Connection;

/// Shown in place of a missing label.
pub const LABEL_PLACEHOLDER: &str = "+";
/// Approximate advance of one label character (monospace estimate).
pub const LABEL_CHAR_WIDTH: f64 = 7.0;
pub const LABEL_PADDING: f64 = 8.0;
pub const MIN_LABEL_WIDTH: f64 = 24.0;
pub const LABEL_HEIGHT: f64 = 20.0;

/// Everything the presentation layer needs to draw one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionGeometry {
    pub id: EntityId,
    pub line: Line,
    pub label_box: Rect,
    /// Label text, or the placeholder when the connection has none.
    pub label_text: String,
    pub has_label: bool,
}

/// Label box size: grows with the text, never narrower than the minimum.
pub fn label_box_size(label: Option<&str>) -> Size {
    let chars = label.unwrap_or(LABEL_PLACEHOLDER).chars().count() as f64;
    let width = (chars * LABEL_CHAR_WIDTH + 2.0 * LABEL_PADDING).max(MIN_LABEL_WIDTH);
    Size::new(width, LABEL_HEIGHT)
}

pub fn connection_geometry(board: &Board, conn: &Connection) -> Option<ConnectionGeometry> {
    let (from, to) = board.connection_endpoints(conn)?;
    let line = Line::new(from, to);
    let mid = from.midpoint(to);
    let label = conn.label.as_deref();
    let label_box = Rect::from_center_size(mid, label_box_size(label));
    Some(ConnectionGeometry {
        id: conn.id,
        line,
        label_box,
        label_text: label.unwrap_or(LABEL_PLACEHOLDER).to_string(),
        has_label: label.is_some(),
    })
}

/// Geometry for every live connection, in list order.
pub fn all_connection_geometry(board: &Board) -> Vec<ConnectionGeometry> {
    board
        .connections()
        .iter()
        .filter_map(|c| connection_geometry(board, c))
        .collect()
}

/// The rubber-band line of an in-progress connection drag.
pub fn rubber_band(drag: &ConnectionDrag) -> Line {
    Line::new(drag.origin, drag.current)
}

/// Distance from `p` to the segment `line`.
pub fn distance_to_segment(line: &Line, p: Point) -> f64 {
    let d = line.p1 - line.p0;
    let len2 = d.hypot2();
    if len2 == 0.0 {
        return p.distance(line.p0);
    }
    let t = ((p - line.p0).dot(d) / len2).clamp(0.0, 1.0);
    p.distance(line.p0 + d * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_core::geometry::stack_center;
    use nc_core::model::{Card, Stack};

    fn board() -> (Board, EntityId) {
        let stack = |id: &str, x: f64| {
            Stack::new(
                EntityId::intern(id),
                x,
                0.0,
                vec![Card::new(EntityId::intern(&format!("{id}-c")), "c")],
            )
        };
        let mut b = Board::from_parts(vec![stack("cg-a", 0.0), stack("cg-b", 600.0)], vec![]);
        let id = b
            .add_connection(EntityId::intern("cg-a"), EntityId::intern("cg-b"))
            .unwrap();
        (b, id)
    }

    #[test]
    fn endpoints_are_centroids_and_label_at_midpoint() {
        let (b, id) = board();
        let g = connection_geometry(&b, b.connection(id).unwrap()).unwrap();
        let a = stack_center(b.stack(EntityId::intern("cg-a")).unwrap());
        let c = stack_center(b.stack(EntityId::intern("cg-b")).unwrap());
        assert_eq!((g.line.p0, g.line.p1), (a, c));
        assert_eq!(g.label_box.center(), a.midpoint(c));
        assert_eq!(g.label_text, LABEL_PLACEHOLDER);
        assert!(!g.has_label);
    }

    #[test]
    fn label_box_grows_with_text() {
        assert_eq!(label_box_size(None).width, MIN_LABEL_WIDTH);
        assert_eq!(label_box_size(Some("")).width, MIN_LABEL_WIDTH);
        let short = label_box_size(Some("ab")).width;
        let long = label_box_size(Some("a much longer label")).width;
        assert!(long > short);
        assert_eq!(long, 19.0 * LABEL_CHAR_WIDTH + 2.0 * LABEL_PADDING);
    }

    #[test]
    fn dangling_connections_are_skipped() {
        let (mut b, _) = board();
        assert_eq!(all_connection_geometry(&b).len(), 1);
        b.delete_stack(EntityId::intern("cg-b"));
        assert!(all_connection_geometry(&b).is_empty());
    }

    #[test]
    fn segment_distance() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(distance_to_segment(&line, Point::new(5.0, 3.0)), 3.0);
        assert_eq!(distance_to_segment(&line, Point::new(13.0, 4.0)), 5.0);
        let dot = Line::new(Point::ZERO, Point::ZERO);
        assert_eq!(distance_to_segment(&dot, Point::new(3.0, 4.0)), 5.0);
    }
}
