//! Resource caches owned by the renderer: rasterized inline graphics and loaded image assets.

use crate::frame::FrameQueue;
use crate::raster::{self, RasterHandle};
use keycap_core::{CacheStats, LruCache};
use rustc_hash::FxHashMap;
use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_RASTER_CACHE_CAPACITY: usize = 100;
pub const DEFAULT_ASSET_CACHE_CAPACITY: usize = 200;
pub const DEFAULT_ASSET_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of looking up an inline graphic.
#[derive(Debug, Clone)]
pub enum RasterLookup {
    Hit(RasterHandle),
    /// The source was rasterized before and failed; it is not retried.
    Invalid,
    Miss,
}

/// Inline `<svg>` source text → raster handle.
pub struct VectorRasterCache {
    cache: LruCache<String, Option<RasterHandle>>,
    scale: f32,
}

impl fmt::Debug for VectorRasterCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorRasterCache")
            .field("stats", &self.cache.stats())
            .field("scale", &self.scale)
            .finish()
    }
}

impl VectorRasterCache {
    pub fn new(capacity: usize, scale: f32) -> Self {
        Self {
            cache: LruCache::named("vector-raster", capacity),
            scale,
        }
    }

    pub fn lookup(&mut self, source: &str) -> RasterLookup {
        match self.cache.get(source) {
            Some(Some(handle)) => RasterLookup::Hit(handle.clone()),
            Some(None) => RasterLookup::Invalid,
            None => RasterLookup::Miss,
        }
    }

    /// Rasterizes `source` and caches the outcome, including failure.
    pub fn rasterize(&mut self, source: &str) -> Option<RasterHandle> {
        let handle = match raster::rasterize_svg(source, self.scale) {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(error = %err, "inline graphic could not be rasterized");
                None
            }
        };
        self.cache.set(source.to_string(), handle.clone());
        handle
    }

    pub fn contains(&self, source: &str) -> bool {
        self.cache.has(source)
    }

    pub fn natural_size(&self, source: &str) -> Option<(f64, f64)> {
        self.cache
            .peek(source)
            .and_then(|h| h.as_ref())
            .map(|h| (h.width(), h.height()))
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[derive(Debug, Clone)]
pub enum AssetState {
    Pending,
    Loaded(RasterHandle),
    Failed,
}

impl AssetState {
    pub fn is_pending(&self) -> bool {
        matches!(self, AssetState::Pending)
    }

    pub fn handle(&self) -> Option<&RasterHandle> {
        match self {
            AssetState::Loaded(h) => Some(h),
            _ => None,
        }
    }
}

/// Invoked once when the load it was attached to finishes (or times out).
pub type AssetCallback = Box<dyn FnOnce(&AssetState)>;

/// Host side of asset fetching.
///
/// `begin` is called at most once per URL while a load is pending; the host reports the outcome
/// back through [`AssetCache::complete`] (usually via `LabelRenderer::complete_asset`).
pub trait AssetLoader {
    fn begin(&mut self, url: &str);
}

/// Loader that only remembers what was asked for; the host drains and fetches later.
#[derive(Debug, Default)]
pub struct QueuedLoader {
    requested: Vec<String>,
}

impl QueuedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.requested)
    }
}

impl AssetLoader for QueuedLoader {
    fn begin(&mut self, url: &str) {
        self.requested.push(url.to_string());
    }
}

/// A finished load and the callbacks that were waiting on it.
pub struct Completion {
    pub url: String,
    pub state: AssetState,
    callbacks: Vec<AssetCallback>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("url", &self.url)
            .field("state", &self.state)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl Completion {
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Moves every waiting callback into the frame queue; returns whether the queue was armed.
    pub fn schedule_on(self, frames: &mut FrameQueue) -> bool {
        let mut armed = false;
        for cb in self.callbacks {
            let state = self.state.clone();
            armed |= frames.schedule(Box::new(move || cb(&state)));
        }
        armed
    }
}

struct InFlight {
    started: Instant,
    callbacks: Vec<AssetCallback>,
}

/// URL → load state, with one in-flight record per pending URL.
///
/// The in-flight table is authoritative for pending loads, so an LRU eviction of a pending entry
/// can never start a second load for the same URL.
pub struct AssetCache {
    states: LruCache<String, AssetState>,
    in_flight: FxHashMap<String, InFlight>,
    timeout: Duration,
    loads_started: u64,
}

impl fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCache")
            .field("stats", &self.states.stats())
            .field("in_flight", &self.in_flight.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AssetCache {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        Self {
            states: LruCache::named("assets", capacity),
            in_flight: FxHashMap::default(),
            timeout,
            loads_started: 0,
        }
    }

    /// Returns the current state of `url`, starting a load when it is unknown.
    ///
    /// While the load is pending `callback` is queued and fires exactly once on completion. For
    /// settled URLs the state is returned directly and `callback` is dropped.
    pub fn request(
        &mut self,
        url: &str,
        now: Instant,
        loader: &mut dyn AssetLoader,
        callback: Option<AssetCallback>,
    ) -> AssetState {
        if let Some(flight) = self.in_flight.get_mut(url) {
            flight.callbacks.extend(callback);
            return AssetState::Pending;
        }
        match self.states.get(url) {
            Some(AssetState::Pending) | None => {}
            Some(settled) => return settled.clone(),
        }

        self.states.set(url.to_string(), AssetState::Pending);
        self.in_flight.insert(
            url.to_string(),
            InFlight {
                started: now,
                callbacks: callback.into_iter().collect(),
            },
        );
        self.loads_started += 1;
        tracing::debug!(url, "starting asset load");
        loader.begin(url);
        AssetState::Pending
    }

    /// Settles a pending load. Late reports for URLs that are no longer in flight are ignored.
    pub fn complete(&mut self, url: &str, handle: Option<RasterHandle>) -> Option<Completion> {
        let Some(flight) = self.in_flight.remove(url) else {
            tracing::debug!(url, "ignoring completion for an asset that is not loading");
            return None;
        };
        let state = match handle {
            Some(h) => AssetState::Loaded(h),
            None => AssetState::Failed,
        };
        self.states.set(url.to_string(), state.clone());
        Some(Completion {
            url: url.to_string(),
            state,
            callbacks: flight.callbacks,
        })
    }

    /// Fails every load that has been pending longer than the timeout.
    pub fn expire_overdue(&mut self, now: Instant) -> Vec<Completion> {
        let overdue: Vec<String> = self
            .in_flight
            .iter()
            .filter(|(_, f)| now.saturating_duration_since(f.started) > self.timeout)
            .map(|(url, _)| url.clone())
            .collect();

        let mut out = Vec::with_capacity(overdue.len());
        for url in overdue {
            tracing::warn!(url = %url, "asset load timed out");
            out.extend(self.complete(&url, None));
        }
        out.sort_by(|a, b| a.url.cmp(&b.url));
        out
    }

    /// Loaded handle without touching recency or counters.
    pub fn loaded(&self, url: &str) -> Option<&RasterHandle> {
        self.states.peek(url).and_then(AssetState::handle)
    }

    pub fn state(&mut self, url: &str) -> Option<AssetState> {
        if self.in_flight.contains_key(url) {
            return Some(AssetState::Pending);
        }
        self.states.get(url).cloned()
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.in_flight.contains_key(url)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn loads_started(&self) -> u64 {
        self.loads_started
    }

    pub fn stats(&self) -> CacheStats {
        self.states.stats()
    }
}
