//! Timeline projection of dated cards.
//!
//! Cards are placed on a horizontal axis by linear interpolation between the
//! earliest and latest date, then grouped per calendar day (UTC). A group is
//! drawn at its first member's position, with a count badge when it holds
//! more than one card. Selecting a group selects only its first member.

use crate::geometry::stack_center;
use crate::id::EntityId;
use crate::model::Stack;
use crate::transform::ViewTransform;
use chrono::{DateTime, NaiveDate, Utc};
use kurbo::{Line, Point};

/// Where the axis sits, in whatever space the caller draws it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineAxis {
    pub margin_left: f64,
    pub width: f64,
    /// Vertical position of the axis line.
    pub y: f64,
}

impl Default for TimelineAxis {
    fn default() -> Self {
        Self {
            margin_left: 40.0,
            width: 720.0,
            y: 60.0,
        }
    }
}

/// One dated card on the axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePoint {
    pub card_id: EntityId,
    pub stack_id: EntityId,
    pub date: DateTime<Utc>,
    pub x: f64,
}

/// Cards sharing a calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineCluster {
    pub day: NaiveDate,
    /// Anchor position: the first member's x.
    pub x: f64,
    pub members: Vec<TimelinePoint>,
}

impl TimelineCluster {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Clusters of more than one card show a count badge instead of a dot.
    pub fn has_badge(&self) -> bool {
        self.members.len() > 1
    }

    /// The card a click or hover on this cluster selects. `None` only for
    /// a cluster with no members.
    pub fn primary(&self) -> Option<&TimelinePoint> {
        self.members.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub clusters: Vec<TimelineCluster>,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// The cluster whose anchor is within `radius` of `p` (nearest wins).
    pub fn cluster_at(&self, axis: &TimelineAxis, p: Point, radius: f64) -> Option<&TimelineCluster> {
        self.clusters
            .iter()
            .map(|c| (c, Point::new(c.x, axis.y).distance(p)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c)
    }
}

/// Project every dated card of `stacks` onto `axis`.
pub fn project_timeline(stacks: &[Stack], axis: &TimelineAxis) -> Timeline {
    let mut dated: Vec<(EntityId, EntityId, DateTime<Utc>)> = stacks
        .iter()
        .flat_map(|s| {
            s.cards
                .iter()
                .filter_map(move |c| c.date.map(|d| (c.id, s.id, d)))
        })
        .collect();
    if dated.is_empty() {
        return Timeline::default();
    }
    dated.sort_by_key(|(_, _, d)| *d);

    let earliest = dated[0].2;
    let latest = dated[dated.len() - 1].2;
    let span = (latest - earliest).num_milliseconds() as f64;

    let mut clusters: Vec<TimelineCluster> = Vec::new();
    for (card_id, stack_id, date) in dated {
        let rel = if span > 0.0 {
            (date - earliest).num_milliseconds() as f64 / span
        } else {
            0.0
        };
        let point = TimelinePoint {
            card_id,
            stack_id,
            date,
            x: axis.margin_left + rel * axis.width,
        };
        let day = date.date_naive();
        match clusters.last_mut() {
            Some(cluster) if cluster.day == day => cluster.members.push(point),
            _ => clusters.push(TimelineCluster {
                day,
                x: point.x,
                members: vec![point],
            }),
        }
    }

    Timeline {
        clusters,
        earliest: Some(earliest),
        latest: Some(latest),
    }
}

/// Coordinate space a connector is drawn in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectorSpace {
    /// Drawn inside the canvas scene: raw canvas coordinates.
    Canvas,
    /// Drawn as a page-fixed overlay: the centroid is mapped through the
    /// view transform (and sidebar shift).
    Viewport {
        transform: ViewTransform,
        sidebar_width: f64,
    },
}

/// Line from a cluster's anchor to the current centroid of the stack that
/// holds its primary card. `None` when that card is no longer on the board.
pub fn timeline_connector(
    cluster: &TimelineCluster,
    axis: &TimelineAxis,
    stacks: &[Stack],
    space: ConnectorSpace,
) -> Option<Line> {
    let card_id = cluster.primary()?.card_id;
    let stack = stacks.iter().find(|s| s.card_index(card_id).is_some())?;
    let centroid = stack_center(stack);
    let end = match space {
        ConnectorSpace::Canvas => centroid,
        ConnectorSpace::Viewport {
            transform,
            sidebar_width,
        } => transform.canvas_to_client(centroid, sidebar_width),
    };
    Some(Line::new(Point::new(cluster.x, axis.y), end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Card, parse_iso};

    fn dated(id: &str, date: &str) -> Card {
        let mut c = Card::new(EntityId::intern(id), id);
        c.date = parse_iso(date);
        c
    }

    const AXIS: TimelineAxis = TimelineAxis {
        margin_left: 10.0,
        width: 100.0,
        y: 0.0,
    };

    #[test]
    fn same_day_cards_cluster() {
        let stacks = vec![Stack::new(
            EntityId::intern("tl-s"),
            0.0,
            0.0,
            vec![
                dated("tl-c", "2024-01-10"),
                dated("tl-a", "2024-01-01T08:00:00Z"),
                dated("tl-b", "2024-01-01T17:00:00Z"),
            ],
        )];
        let tl = project_timeline(&stacks, &AXIS);
        assert_eq!(tl.clusters.len(), 2);

        let first = &tl.clusters[0];
        assert_eq!(first.count(), 2);
        assert!(first.has_badge());
        assert_eq!(first.x, 10.0);
        assert_eq!(first.primary().unwrap().card_id, EntityId::intern("tl-a"));

        let last = &tl.clusters[1];
        assert_eq!(last.count(), 1);
        assert!((last.x - 110.0).abs() < 1e-9);
    }

    #[test]
    fn undated_cards_are_skipped() {
        let stacks = vec![Stack::new(
            EntityId::intern("tl-u"),
            0.0,
            0.0,
            vec![Card::new(EntityId::intern("tl-undated"), "x")],
        )];
        assert!(project_timeline(&stacks, &AXIS).is_empty());
    }

    #[test]
    fn equal_dates_sit_at_the_start() {
        let stacks = vec![Stack::new(
            EntityId::intern("tl-eq"),
            0.0,
            0.0,
            vec![dated("tl-e1", "2024-03-03"), dated("tl-e2", "2024-03-03")],
        )];
        let tl = project_timeline(&stacks, &AXIS);
        assert_eq!(tl.clusters.len(), 1);
        assert_eq!(tl.clusters[0].x, AXIS.margin_left);
        assert!(tl.clusters[0].members.iter().all(|p| p.x == AXIS.margin_left));
    }

    #[test]
    fn memberless_cluster_has_no_connector() {
        let stacks = vec![Stack::new(
            EntityId::intern("tl-m"),
            0.0,
            0.0,
            vec![dated("tl-m1", "2024-01-01")],
        )];
        let mut cluster = project_timeline(&stacks, &AXIS).clusters.remove(0);
        cluster.members.clear();
        assert_eq!(cluster.primary(), None);
        assert_eq!(timeline_connector(&cluster, &AXIS, &stacks, ConnectorSpace::Canvas), None);
    }

    #[test]
    fn cluster_hit_picks_nearest() {
        let stacks = vec![Stack::new(
            EntityId::intern("tl-h"),
            0.0,
            0.0,
            vec![dated("tl-h1", "2024-01-01"), dated("tl-h2", "2024-01-02")],
        )];
        let tl = project_timeline(&stacks, &AXIS);
        let hit = tl.cluster_at(&AXIS, Point::new(105.0, 2.0), 8.0).unwrap();
        assert_eq!(hit.primary().unwrap().card_id, EntityId::intern("tl-h2"));
        assert!(tl.cluster_at(&AXIS, Point::new(60.0, 0.0), 8.0).is_none());
    }

    #[test]
    fn connector_agrees_across_spaces() {
        let stacks = vec![Stack::new(
            EntityId::intern("tl-k"),
            100.0,
            200.0,
            vec![dated("tl-k1", "2024-01-01")],
        )];
        let tl = project_timeline(&stacks, &AXIS);
        let cluster = &tl.clusters[0];
        let canvas = timeline_connector(cluster, &AXIS, &stacks, ConnectorSpace::Canvas).unwrap();
        assert_eq!(canvas.p1, stack_center(&stacks[0]));

        let transform = ViewTransform::new(2.0, 10.0, 20.0);
        let overlay = timeline_connector(
            cluster,
            &AXIS,
            &stacks,
            ConnectorSpace::Viewport {
                transform,
                sidebar_width: 250.0,
            },
        )
        .unwrap();
        assert_eq!(overlay.p1, transform.canvas_to_client(canvas.p1, 250.0));
    }
}
