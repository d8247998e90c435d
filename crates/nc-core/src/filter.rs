//! Search and filtering.
//!
//! Filtering is a view: it returns reduced copies of stacks and never
//! touches the board. All comparisons are case-insensitive.

use crate::id::EntityId;
use crate::model::{Card, CardField, Stack};
use std::collections::{BTreeMap, HashSet};

/// Current filter state, shared by the canvas, focus fitter and timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Substring matched against title, content, tags and key.
    pub search_text: String,
    /// Cards must carry every one of these tags.
    pub selected_tags: Vec<String>,
    /// Cards must have exactly this key.
    pub focused_key: Option<String>,
}

impl SearchFilters {
    pub fn is_active(&self) -> bool {
        !self.search_text.trim().is_empty()
            || !self.selected_tags.is_empty()
            || self.focused_key.is_some()
    }

    /// Toggle a tag in the selected set.
    pub fn toggle_tag(&mut self, tag: &str) {
        let needle = tag.to_lowercase();
        let before = self.selected_tags.len();
        self.selected_tags.retain(|t| t.to_lowercase() != needle);
        if self.selected_tags.len() == before {
            self.selected_tags.push(tag.to_string());
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Does `card` pass all three predicates?
    pub fn matches(&self, card: &Card) -> bool {
        let text = self.search_text.trim();
        let text_ok = text.is_empty() || !matching_fields(card, &text.to_lowercase()).is_empty();
        let tags_ok = self.selected_tags.iter().all(|t| card.has_tag(t));
        let key_ok = match &self.focused_key {
            None => true,
            Some(key) => card
                .key
                .as_deref()
                .is_some_and(|k| k.to_lowercase() == key.to_lowercase()),
        };
        text_ok && tags_ok && key_ok
    }
}

/// Fields of `card` containing the (already lowercased) needle, with the
/// text that matched.
fn matching_fields<'a>(card: &'a Card, needle: &str) -> Vec<(CardField, &'a str)> {
    let mut out = Vec::new();
    let hit = |s: &str| s.to_lowercase().contains(needle);
    if hit(card.title.as_str()) {
        out.push((CardField::Title, card.title.as_str()));
    }
    if hit(card.content.as_str()) {
        out.push((CardField::Content, card.content.as_str()));
    }
    for tag in card.tags.iter().filter(|t| hit(t.as_str())) {
        out.push((CardField::Tags, tag.as_str()));
    }
    if let Some(key) = card.key.as_deref().filter(|k| hit(*k)) {
        out.push((CardField::Key, key));
    }
    out
}

/// Reduce each stack to its passing cards; stacks with none are dropped.
pub fn filter_stacks(stacks: &[Stack], filters: &SearchFilters) -> Vec<Stack> {
    if !filters.is_active() {
        return stacks.to_vec();
    }
    stacks
        .iter()
        .filter_map(|stack| {
            let cards: Vec<Card> = stack
                .cards
                .iter()
                .filter(|c| filters.matches(c))
                .cloned()
                .collect();
            (!cards.is_empty()).then(|| Stack {
                cards,
                ..stack.clone()
            })
        })
        .collect()
}

/// One matching field of one card, for the side-panel results list.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub stack_id: EntityId,
    pub card_id: EntityId,
    pub field: CardField,
    pub snippet: String,
}

const SNIPPET_CONTEXT: usize = 30;

/// All field matches of `text` across the board, one per field per card.
pub fn search_results(stacks: &[Stack], text: &str) -> Vec<SearchResult> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for stack in stacks {
        for card in &stack.cards {
            for (field, value) in matching_fields(card, &needle) {
                out.push(SearchResult {
                    stack_id: stack.id,
                    card_id: card.id,
                    field,
                    snippet: snippet(value, &needle),
                });
            }
        }
    }
    out
}

/// Cards matching the search text, ignoring tag/key filters.
pub fn highlighted_card_ids(stacks: &[Stack], text: &str) -> HashSet<EntityId> {
    search_results(stacks, text)
        .into_iter()
        .map(|r| r.card_id)
        .collect()
}

/// A window of `value` around the first match, on char boundaries.
fn snippet(value: &str, needle: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let lower: Vec<char> = value.to_lowercase().chars().collect();
    // Lowercasing can change char counts; fall back to the head of the text.
    let start = if lower.len() == chars.len() {
        let needle: Vec<char> = needle.chars().collect();
        lower
            .windows(needle.len().max(1))
            .position(|w| w == needle.as_slice())
            .unwrap_or(0)
    } else {
        0
    };
    let from = start.saturating_sub(SNIPPET_CONTEXT);
    let to = (start + needle.chars().count() + SNIPPET_CONTEXT).min(chars.len());
    let mut s: String = chars[from..to].iter().collect::<String>().replace('\n', " ");
    if from > 0 {
        s.insert(0, '…');
    }
    if to < chars.len() {
        s.push('…');
    }
    s
}

/// Distinct tags across all cards, sorted, deduplicated case-insensitively
/// (first spelling wins).
pub fn all_tags(stacks: &[Stack]) -> Vec<String> {
    distinct(stacks.iter().flat_map(|s| &s.cards).flat_map(|c| c.tags.iter()))
}

/// Distinct keys across all cards, sorted.
pub fn all_keys(stacks: &[Stack]) -> Vec<String> {
    distinct(stacks.iter().flat_map(|s| &s.cards).filter_map(|c| c.key.as_ref()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for v in values {
        seen.entry(v.to_lowercase()).or_insert_with(|| v.clone());
    }
    seen.into_values().collect()
}
