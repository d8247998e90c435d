//! Workspace file format and load-time migration.
//!
//! Files are JSON:
//!
//! ```json
//! { "version": "1.0", "createdAt": "…", "lastModified": "…",
//!   "stacks": [ { "id", "x", "y", "title"?, "cards": [ … ] } ],
//!   "connections": [ { "id", "from", "to", "label"? } ] }
//! ```
//!
//! Loading goes through permissive `Raw*` shapes so that files written by
//! older versions (or by hand) still open: missing dates become the load
//! time, missing colours the default colour, missing tags `[]`. Missing keys
//! and labels stay absent, and blank strings are normalised to absent too.

use crate::board::Board;
use crate::id::EntityId;
use crate::model::{
    Card, Color, Connection, DEFAULT_CARD_COLOR, Stack, Tags, format_iso, normalize_optional,
    parse_iso,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

pub const CURRENT_VERSION: &str = "1.0";

/// The full serializable snapshot of a board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceData {
    pub version: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub last_modified: DateTime<Utc>,
    pub stacks: Vec<Stack>,
    pub connections: Vec<Connection>,
}

fn serialize_timestamp<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_iso(dt))
}

impl WorkspaceData {
    /// An empty workspace created at `now`.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            created_at: now,
            last_modified: now,
            stacks: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Snapshot `board`. `created_at` carries over from the loaded file.
    pub fn from_board(board: &Board, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            created_at,
            last_modified: now,
            stacks: board.stacks.clone(),
            connections: board.connections().to_vec(),
        }
    }

    pub fn into_board(self) -> Board {
        Board::from_parts(self.stacks, self.connections)
    }

    /// Pretty-printed JSON for writing to disk.
    ///
    /// # Errors
    /// Returns the serializer's message; only non-finite numbers can trigger it.
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| e.to_string())
    }
}

// ─── Raw (on-disk) shapes ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWorkspace {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    last_modified: Option<String>,
    stacks: Vec<RawStack>,
    #[serde(default)]
    connections: Vec<RawConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStack {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    cards: Vec<RawCard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCard {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    background_color: Option<String>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawConnection {
    #[serde(default)]
    id: Option<String>,
    from: String,
    to: String,
    #[serde(default)]
    label: Option<String>,
}

fn id_or_generate(raw: Option<&str>, prefix: &str) -> EntityId {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => EntityId::intern(id),
        None => EntityId::generate(prefix),
    }
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite() && *v > 0.0)
}

impl RawCard {
    fn migrate(self, now: DateTime<Utc>) -> Card {
        let background_color = match self.background_color.as_deref() {
            None => DEFAULT_CARD_COLOR,
            Some(hex) => Color::from_hex(hex).unwrap_or_else(|| {
                log::warn!("card color `{hex}` is not a hex color, using default");
                DEFAULT_CARD_COLOR
            }),
        };
        Card {
            id: id_or_generate(self.id.as_deref(), "card"),
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            date: Some(self.date.as_deref().and_then(parse_iso).unwrap_or(now)),
            key: self.key.as_deref().and_then(normalize_optional),
            tags: self.tags.unwrap_or_default().into_iter().collect::<Tags>(),
            background_color: Some(background_color),
            width: positive(self.width),
            height: positive(self.height),
        }
    }
}

impl RawStack {
    fn migrate(self, now: DateTime<Utc>) -> Stack {
        Stack {
            id: id_or_generate(self.id.as_deref(), "stack"),
            x: self.x.filter(|v| v.is_finite()).unwrap_or(0.0),
            y: self.y.filter(|v| v.is_finite()).unwrap_or(0.0),
            title: self.title.as_deref().and_then(normalize_optional),
            cards: self.cards.into_iter().map(|c| c.migrate(now)).collect(),
        }
    }
}

impl RawConnection {
    fn migrate(self) -> Connection {
        Connection {
            id: id_or_generate(self.id.as_deref(), "conn"),
            from: EntityId::intern(&self.from),
            to: EntityId::intern(&self.to),
            label: self.label.as_deref().and_then(normalize_optional),
        }
    }
}

/// Parse and migrate a workspace file. `now` stands in for missing dates.
///
/// # Errors
/// Returns a message when the text is not JSON or lacks the `stacks` array.
pub fn parse_workspace(text: &str, now: DateTime<Utc>) -> Result<WorkspaceData, String> {
    let raw: RawWorkspace = serde_json::from_str(text).map_err(|e| format!("invalid workspace file: {e}"))?;
    Ok(migrate(raw, now))
}

fn migrate(raw: RawWorkspace, now: DateTime<Utc>) -> WorkspaceData {
    let created_at = raw.created_at.as_deref().and_then(parse_iso).unwrap_or(now);
    let last_modified = raw.last_modified.as_deref().and_then(parse_iso).unwrap_or(created_at);
    if let Some(v) = raw.version.as_deref()
        && v != CURRENT_VERSION
    {
        log::info!("migrating workspace from version {v}");
    }

    let stacks: Vec<Stack> = raw
        .stacks
        .into_iter()
        .map(|s| s.migrate(now))
        .filter(|s| !s.cards.is_empty())
        .collect();
    let connections = raw.connections.into_iter().map(RawConnection::migrate).collect();

    WorkspaceData {
        version: CURRENT_VERSION.to_string(),
        created_at,
        last_modified,
        stacks,
        connections,
    }
}

/// Like [`parse_workspace`], but malformed input yields an empty workspace.
pub fn load_or_default(text: &str, now: DateTime<Utc>) -> WorkspaceData {
    parse_workspace(text, now).unwrap_or_else(|e| {
        log::warn!("{e}; starting with an empty workspace");
        WorkspaceData::empty(now)
    })
}
