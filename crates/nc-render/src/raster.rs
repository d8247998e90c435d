//! Rich-text raster cache.
//!
//! Card content is rendered to a bitmap by an external [`Rasterizer`] and
//! cached under a content-addressed [`RasterKey`] (markdown, box size,
//! background colour). Requests for a key already in flight are coalesced.
//! A result is only shown while its key still matches the card, so a
//! conversion that finishes after the card changed is never displayed.
//!
//! Finished results (bitmaps and failures) live in an LRU bounded by
//! [`RasterCacheConfig::capacity`] and are evicted oldest-stored first.
//! In-flight keys are tracked apart from it, so capacity pressure never
//! drops a pending conversion and causes a duplicate one.
//!
//! Between [`RasterCache::begin_resize`] and [`RasterCache::end_resize`] a
//! card's key is computed from the size frozen at resize start and no new
//! conversions are started for it.

use kurbo::Size;
use lru::LruCache;
use nc_core::geometry::card_size;
use nc_core::id::EntityId;
use nc_core::model::{Card, Color};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// RGBA8 image produced by a [`Rasterizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Markdown → bitmap conversion, supplied by the host.
pub trait Rasterizer {
    /// Render `markdown` into a `width` × `height` box on `background`.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure; the card then shows no content
    /// layer.
    fn render(&mut self, markdown: &str, width: u32, height: u32, background: Color) -> Result<Bitmap, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RasterKey {
    pub content: String,
    pub width: u32,
    pub height: u32,
    /// Background as lowercase hex.
    pub background: String,
}

impl RasterKey {
    pub fn new(card: &Card, size: Size) -> Self {
        Self {
            content: card.content.clone(),
            width: size.width.round().max(1.0) as u32,
            height: size.height.round().max(1.0) as u32,
            background: card.background().to_hex(),
        }
    }
}

/// A conversion the host should run, then report via [`RasterCache::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterJob {
    pub card: EntityId,
    pub key: RasterKey,
}

impl RasterJob {
    /// Run this job synchronously.
    ///
    /// # Errors
    ///
    /// Propagates the rasterizer's failure.
    pub fn run(&self, rasterizer: &mut dyn Rasterizer) -> Result<Bitmap, String> {
        let background = Color::from_hex(&self.key.background).unwrap_or_default();
        rasterizer.render(&self.key.content, self.key.width, self.key.height, background)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RasterRequest {
    Ready(Arc<Bitmap>),
    /// Same key already in flight.
    Pending,
    /// Nothing cached; the caller should run this job.
    Start(RasterJob),
    /// Card is being resized and nothing is cached at the frozen size.
    Suspended,
    /// Conversion failed earlier; render no content layer.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterCacheConfig {
    /// Finished results kept; in-flight conversions do not count.
    pub capacity: usize,
    /// Results and in-flight markers older than this are dropped.
    pub max_age: Duration,
}

impl Default for RasterCacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            max_age: Duration::from_secs(10 * 60),
        }
    }
}

#[derive(Debug, Clone)]
enum EntryState {
    Ready(Arc<Bitmap>),
    Failed,
}

#[derive(Debug, Clone)]
struct Entry {
    state: EntryState,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct RasterCache {
    config: RasterCacheConfig,
    /// Finished results. Read with `peek` so order stays insertion order.
    entries: LruCache<RasterKey, Entry>,
    /// In-flight keys → when the conversion was started.
    pending: HashMap<RasterKey, Instant>,
    /// Cards mid-resize → size frozen at resize start.
    frozen: HashMap<EntityId, Size>,
}

impl Default for RasterCache {
    fn default() -> Self {
        Self::new(RasterCacheConfig::default())
    }
}

impl RasterCache {
    pub fn new(config: RasterCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            entries: LruCache::new(capacity),
            pending: HashMap::new(),
            frozen: HashMap::new(),
        }
    }

    /// Finished results plus in-flight conversions.
    pub fn len(&self) -> usize {
        self.entries.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.pending.is_empty()
    }

    pub fn is_pending(&self, key: &RasterKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn is_resizing(&self, card: EntityId) -> bool {
        self.frozen.contains_key(&card)
    }

    /// The key `card` should currently display.
    pub fn key_for(&self, card: &Card) -> RasterKey {
        let size = self.frozen.get(&card.id).copied().unwrap_or_else(|| card_size(card));
        RasterKey::new(card, size)
    }

    /// Ask for `card`'s bitmap, starting a conversion if none is cached or
    /// in flight.
    pub fn request(&mut self, card: &Card, now: Instant) -> RasterRequest {
        self.evict_expired(now);
        let key = self.key_for(card);
        match self.entries.peek(&key).map(|e| &e.state) {
            Some(EntryState::Ready(bitmap)) => return RasterRequest::Ready(Arc::clone(bitmap)),
            Some(EntryState::Failed) => return RasterRequest::Failed,
            None => {}
        }
        if self.pending.contains_key(&key) {
            return RasterRequest::Pending;
        }
        if self.is_resizing(card.id) {
            return RasterRequest::Suspended;
        }
        log::trace!("raster start {} {}x{}", card.id, key.width, key.height);
        self.pending.insert(key.clone(), now);
        RasterRequest::Start(RasterJob { card: card.id, key })
    }

    /// Record the outcome of a conversion. Failures are cached so the same
    /// key is not retried until it is evicted.
    pub fn complete(&mut self, key: RasterKey, result: Result<Bitmap, String>, now: Instant) {
        let state = match result {
            Ok(bitmap) => EntryState::Ready(Arc::new(bitmap)),
            Err(err) => {
                log::warn!("rasterization failed ({}x{}): {err}", key.width, key.height);
                EntryState::Failed
            }
        };
        self.pending.remove(&key);
        if let Some((evicted, _)) = self.entries.push(key.clone(), Entry { state, stored_at: now })
            && evicted != key
        {
            log::trace!("raster evict {}x{}", evicted.width, evicted.height);
        }
    }

    /// Bitmap to draw for `card` right now, if one matches its current key.
    pub fn current_bitmap(&self, card: &Card) -> Option<Arc<Bitmap>> {
        match &self.entries.peek(&self.key_for(card))?.state {
            EntryState::Ready(bitmap) => Some(Arc::clone(bitmap)),
            EntryState::Failed => None,
        }
    }

    /// Request and, when a conversion is needed, run it inline.
    pub fn render_now(&mut self, rasterizer: &mut dyn Rasterizer, card: &Card, now: Instant) -> Option<Arc<Bitmap>> {
        match self.request(card, now) {
            RasterRequest::Ready(bitmap) => Some(bitmap),
            RasterRequest::Start(job) => {
                let result = job.run(rasterizer);
                self.complete(job.key, result, now);
                self.current_bitmap(card)
            }
            RasterRequest::Pending | RasterRequest::Suspended | RasterRequest::Failed => None,
        }
    }

    /// Freeze `card`'s raster size until [`end_resize`](Self::end_resize).
    pub fn begin_resize(&mut self, card: EntityId, size: Size) {
        log::debug!("raster suspended for {card} at {}x{}", size.width, size.height);
        self.frozen.insert(card, size);
    }

    pub fn end_resize(&mut self, card: EntityId) {
        if self.frozen.remove(&card).is_some() {
            log::debug!("raster resumed for {card}");
        }
    }

    fn evict_expired(&mut self, now: Instant) {
        let max_age = self.config.max_age;
        while let Some((_, entry)) = self.entries.peek_lru() {
            if now.saturating_duration_since(entry.stored_at) <= max_age {
                break;
            }
            self.entries.pop_lru();
        }
        // A job the host never completed is retried once its marker expires.
        self.pending
            .retain(|_, started| now.saturating_duration_since(*started) <= max_age);
    }
}
