//! Token counter implementations.

use crate::types::Turn;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`. Never fails; `count("")` is 0.
    fn count(&self, text: &str) -> usize;

    /// Short identifier used in logs and health reports.
    fn name(&self) -> &'static str;

    fn count_turns(&self, turns: &[Turn]) -> usize {
        turns.iter().map(|t| self.count(&t.content)).sum()
    }
}

/// Deterministic `ceil(chars / ratio)` estimate, 4 characters per token by default.
#[derive(Debug, Clone)]
pub struct CharacterEstimator {
    chars_per_token: f64,
}

impl CharacterEstimator {
    pub fn new() -> Self {
        Self::with_ratio(4.0)
    }

    /// Non-positive or non-finite ratios fall back to 4.0.
    pub fn with_ratio(r: f64) -> Self {
        let chars_per_token = if r.is_finite() && r > 0.0 { r } else { 4.0 };
        Self { chars_per_token }
    }
}

impl Default for CharacterEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for CharacterEstimator {
    fn count(&self, text: &str) -> usize {
        let chars = text.chars().count();
        if chars == 0 {
            return 0;
        }
        (chars as f64 / self.chars_per_token).ceil() as usize
    }

    fn name(&self) -> &'static str {
        "estimate"
    }
}

/// Bounded LRU memo in front of another counter.
///
/// History turns are re-counted on every call, so repeated content is the
/// common case.
pub struct CachingCounter {
    inner: Arc<dyn TokenCounter>,
    cache: Mutex<LruCache<String, usize>>,
}

impl CachingCounter {
    pub fn new(inner: Arc<dyn TokenCounter>, max_size: usize) -> Self {
        let cap = NonZeroUsize::new(max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn clear_cache(&self) {
        if let Ok(mut c) = self.cache.lock() {
            c.clear();
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl TokenCounter for CachingCounter {
    fn count(&self, text: &str) -> usize {
        if let Ok(mut c) = self.cache.lock() {
            if let Some(&n) = c.get(text) {
                return n;
            }
        }
        let n = self.inner.count(text);
        if let Ok(mut c) = self.cache.lock() {
            c.put(text.to_string(), n);
        }
        n
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
