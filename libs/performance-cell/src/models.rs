use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub total_entries: u64,
    pub invalidations: u64,
    pub ttl_secs: u64,
}

impl CacheStats {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            hits: 0,
            misses: 0,
            hit_rate: 0.0,
            total_entries: 0,
            invalidations: 0,
            ttl_secs: 0,
        }
    }
}

pub(crate) fn hit_rate(hits: u64, misses: u64) -> f64 {
    let lookups = hits + misses;
    if lookups == 0 {
        0.0
    } else {
        hits as f64 / lookups as f64
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache invalidation rejected: {0}")]
    Invalidation(String),
}
