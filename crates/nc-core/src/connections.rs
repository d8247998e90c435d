//! Connections between stacks.
//!
//! The board keeps connections as an ordered list (the persisted order) and
//! mirrors them into an undirected petgraph `GraphMap` keyed by stack id, so
//! duplicate checks in either direction and neighbour queries are O(1).
//! Connections whose endpoints no longer exist stay in the list; geometry
//! consumers skip them.

use crate::board::Board;
use crate::geometry::{rect_contains, stack_bounds, stack_center};
use crate::id::EntityId;
use crate::model::{Connection, normalize_optional};
use kurbo::Point;
use petgraph::graphmap::UnGraphMap;

/// Undirected stack adjacency, edge weight = connection id.
#[derive(Debug, Clone, Default)]
pub struct ConnectionIndex {
    graph: UnGraphMap<EntityId, EntityId>,
}

impl ConnectionIndex {
    pub fn build(connections: &[Connection]) -> Self {
        let mut graph = UnGraphMap::new();
        for conn in connections {
            graph.add_edge(conn.from, conn.to, conn.id);
        }
        Self { graph }
    }

    pub fn joins(&self, a: EntityId, b: EntityId) -> bool {
        self.graph.contains_edge(a, b)
    }

    pub fn neighbors(&self, stack: EntityId) -> Vec<EntityId> {
        if !self.graph.contains_node(stack) {
            return Vec::new();
        }
        self.graph.neighbors(stack).collect()
    }
}

impl Board {
    pub fn connection(&self, id: EntityId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// True when an edge between `a` and `b` exists in either direction.
    pub fn is_connected(&self, a: EntityId, b: EntityId) -> bool {
        self.index.joins(a, b)
    }

    /// Create `from → to`. Refused for self-edges, missing stacks and pairs
    /// that are already connected (either direction).
    pub fn add_connection(&mut self, from: EntityId, to: EntityId) -> Option<EntityId> {
        if from == to || self.stack(from).is_none() || self.stack(to).is_none() {
            return None;
        }
        if self.is_connected(from, to) {
            log::debug!("connection {from} ↔ {to} already exists");
            return None;
        }
        let conn = Connection::new(from, to);
        let id = conn.id;
        self.index.graph.add_edge(from, to, id);
        self.connections.push(conn);
        log::debug!("connect {from} → {to} as {id}");
        Some(id)
    }

    pub fn delete_connection(&mut self, id: EntityId) -> Option<Connection> {
        let pos = self.connections.iter().position(|c| c.id == id)?;
        let removed = self.connections.remove(pos);
        self.index = ConnectionIndex::build(&self.connections);
        Some(removed)
    }

    /// Set a connection's label. Input is trimmed; blank means no label.
    pub fn set_connection_label(&mut self, id: EntityId, text: &str) {
        if let Some(conn) = self.connections.iter_mut().find(|c| c.id == id) {
            conn.label = normalize_optional(text);
        }
    }

    /// Stacks connected to `stack`, in either direction.
    pub fn connected_stacks(&self, stack: EntityId) -> Vec<EntityId> {
        self.index.neighbors(stack)
    }

    /// Endpoints of a connection (both stack centroids), or `None` when it
    /// is dangling.
    pub fn connection_endpoints(&self, conn: &Connection) -> Option<(Point, Point)> {
        let from = self.stack(conn.from)?;
        let to = self.stack(conn.to)?;
        Some((stack_center(from), stack_center(to)))
    }
}

/// An in-progress rubber-band connection drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionDrag {
    pub from: EntityId,
    /// Source stack centroid, where the line starts.
    pub origin: Point,
    /// Live pointer position (canvas space).
    pub current: Point,
}

impl ConnectionDrag {
    /// Begin dragging from `from`'s centroid. `None` if the stack is gone.
    pub fn start(board: &Board, from: EntityId, pointer: Point) -> Option<Self> {
        let stack = board.stack(from)?;
        Some(Self {
            from,
            origin: stack_center(stack),
            current: pointer,
        })
    }

    pub fn move_to(&mut self, pointer: Point) {
        self.current = pointer;
    }

    /// The stack a drop at `point` would connect to: the first other stack
    /// in list order whose bounds contain it.
    pub fn drop_target(&self, board: &Board, point: Point) -> Option<EntityId> {
        board
            .stacks
            .iter()
            .find(|s| s.id != self.from && rect_contains(&stack_bounds(s), point))
            .map(|s| s.id)
    }

    /// Release at `point`, creating the connection when it lands on another
    /// stack that is not already connected.
    pub fn end(self, board: &mut Board, point: Point) -> Option<EntityId> {
        let to = self.drop_target(board, point)?;
        board.add_connection(self.from, to)
    }
}
