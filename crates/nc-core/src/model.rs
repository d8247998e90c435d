//! Core data model for notecanvas workspaces.
//!
//! A workspace is an ordered list of stacks, each an ordered list of cards,
//! plus a list of connections between stacks. The *last* card of a stack is
//! its top card; list order is the only z-ordering there is. Card offsets
//! inside a stack are computed by `geometry`, never stored.

use crate::id::EntityId;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Background color given to cards that never had one.
pub const DEFAULT_CARD_COLOR: Color = Color::rgba(1.0, 249.0 / 255.0, 196.0 / 255.0, 1.0);

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Emit as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (channel(self.r), channel(self.g), channel(self.b), channel(self.a));
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        DEFAULT_CARD_COLOR
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Dates ───────────────────────────────────────────────────────────────

/// Format a timestamp the way the workspace file stores it:
/// `2024-01-01T00:00:00.000Z`.
pub fn format_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 timestamp, accepting a bare `YYYY-MM-DD` date as
/// midnight UTC.
pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

mod iso_date {
    use super::{format_iso, parse_iso};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&format_iso(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_iso))
    }
}

// ─── Cards & stacks ──────────────────────────────────────────────────────

/// Tag list. Most cards carry a handful of tags, so they stay inline.
pub type Tags = SmallVec<[String; 4]>;

/// A single notecard. Owned by exactly one stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: EntityId,
    pub title: String,
    pub content: String,
    #[serde(
        default,
        with = "iso_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    /// Explicit width override; `None` means the default card width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Explicit height override; `None` means the default card height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Card {
    pub fn new(id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: String::new(),
            date: None,
            key: None,
            tags: Tags::new(),
            background_color: None,
            width: None,
            height: None,
        }
    }

    /// A fresh card as created by the "new card" action: dated now,
    /// default background.
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            date: Some(now),
            background_color: Some(DEFAULT_CARD_COLOR),
            ..Self::new(EntityId::generate("card"), "New card")
        }
    }

    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == needle)
    }

    pub fn background(&self) -> Color {
        self.background_color.unwrap_or(DEFAULT_CARD_COLOR)
    }
}

/// An ordered pile of cards at one canvas position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub cards: Vec<Card>,
}

impl Stack {
    pub fn new(id: EntityId, x: f64, y: f64, cards: Vec<Card>) -> Self {
        Self {
            id,
            x,
            y,
            title: None,
            cards,
        }
    }

    /// The most visible card (last in the list).
    pub fn top_card(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn card_index(&self, card_id: EntityId) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }
}

/// An editable field of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardField {
    Title,
    Content,
    Date,
    Key,
    Tags,
}

impl CardField {
    /// Single-line fields commit on Enter; content takes newlines.
    pub fn is_single_line(self) -> bool {
        !matches!(self, CardField::Content)
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// A directed edge between two stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: EntityId,
    pub from: EntityId,
    pub to: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Connection {
    pub fn new(from: EntityId, to: EntityId) -> Self {
        Self {
            id: EntityId::generate("conn"),
            from,
            to,
            label: None,
        }
    }

    /// True when this edge joins `a` and `b` in either direction.
    pub fn joins(&self, a: EntityId, b: EntityId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

/// Trim free text; blank input means "no value".
pub fn normalize_optional(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
