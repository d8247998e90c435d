pub mod board;
pub mod connections;
pub mod filter;
pub mod focus;
pub mod geometry;
pub mod id;
pub mod model;
pub mod timeline;
pub mod transform;
pub mod workspace;

pub use board::{Board, DropOutcome};
pub use connections::ConnectionDrag;
pub use filter::{SearchFilters, filter_stacks, highlighted_card_ids, search_results};
pub use focus::{FocusConfig, FocusState, Viewport, compute_focus_transform};
pub use id::EntityId;
pub use model::{
    Card, CardField, Color, Connection, DEFAULT_CARD_COLOR, Stack, Tags, format_iso,
    normalize_optional, parse_iso,
};
pub use timeline::{ConnectorSpace, Timeline, TimelineAxis, project_timeline};
pub use transform::{ViewSettings, ViewTransform};
pub use workspace::{WorkspaceData, load_or_default, parse_workspace};

// Re-export kurbo geometry types so downstream crates don't need a direct dependency
pub use kurbo::{Line, Point, Rect, Size, Vec2};
