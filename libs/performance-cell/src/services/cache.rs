use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::scheduling::{AppointmentView, PatientView};
use shared_utils::pagination::{Page, PageWindow};

use crate::models::{hit_rate, CacheError, CacheStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingKind {
    Appointments,
    AppointmentsByDate,
    Patients,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingScope {
    Page { page: i64, page_size: i64 },
    Date(NaiveDate),
}

/// Addresses one cached listing. Every key carries the owning admin so that a
/// write can drop everything derived from that admin in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub admin_id: Uuid,
    pub kind: ListingKind,
    pub scope: ListingScope,
}

impl ScopeKey {
    pub fn appointments(admin_id: Uuid, window: PageWindow) -> Self {
        Self {
            admin_id,
            kind: ListingKind::Appointments,
            scope: ListingScope::Page {
                page: window.page,
                page_size: window.page_size,
            },
        }
    }

    pub fn appointments_on(admin_id: Uuid, date: NaiveDate) -> Self {
        Self {
            admin_id,
            kind: ListingKind::AppointmentsByDate,
            scope: ListingScope::Date(date),
        }
    }

    pub fn patients(admin_id: Uuid, window: PageWindow) -> Self {
        Self {
            admin_id,
            kind: ListingKind::Patients,
            scope: ListingScope::Page {
                page: window.page,
                page_size: window.page_size,
            },
        }
    }
}

/// Already-assembled listing results. Entries are immutable once inserted.
#[derive(Debug, Clone)]
pub enum CachedListing {
    Appointments(Arc<Page<AppointmentView>>),
    AppointmentsByDate(Arc<Vec<AppointmentView>>),
    Patients(Arc<Page<PatientView>>),
}

#[async_trait]
pub trait ListingCache: Send + Sync {
    async fn get(&self, key: &ScopeKey) -> Option<CachedListing>;

    /// Stores under the deployment-wide TTL.
    async fn put(&self, key: ScopeKey, listing: CachedListing);

    /// Drops every entry derived from `admin_id`, across all kinds and pages.
    async fn invalidate_admin(&self, admin_id: Uuid) -> Result<(), CacheError>;

    /// Evicts expired entries nobody has read since they expired.
    async fn sweep(&self);

    async fn stats(&self) -> CacheStats;
}

pub struct MokaListingCache {
    entries: Cache<ScopeKey, CachedListing>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl MokaListingCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self {
            entries,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ListingCache for MokaListingCache {
    async fn get(&self, key: &ScopeKey) -> Option<CachedListing> {
        let found = self.entries.get(key).await;
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    async fn put(&self, key: ScopeKey, listing: CachedListing) {
        self.entries.insert(key, listing).await;
    }

    async fn invalidate_admin(&self, admin_id: Uuid) -> Result<(), CacheError> {
        self.entries
            .invalidate_entries_if(move |key, _| key.admin_id == admin_id)
            .map_err(|e| CacheError::Invalidation(e.to_string()))?;

        self.invalidations.fetch_add(1, Ordering::Relaxed);
        debug!("Invalidated cached listings for admin {}", admin_id);
        Ok(())
    }

    async fn sweep(&self) {
        self.entries.run_pending_tasks().await;
    }

    async fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        CacheStats {
            enabled: true,
            hits,
            misses,
            hit_rate: hit_rate(hits, misses),
            total_entries: self.entries.entry_count(),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

/// Stand-in used when caching is switched off; every read misses.
#[derive(Debug, Default)]
pub struct NoopListingCache;

#[async_trait]
impl ListingCache for NoopListingCache {
    async fn get(&self, _key: &ScopeKey) -> Option<CachedListing> {
        None
    }

    async fn put(&self, _key: ScopeKey, _listing: CachedListing) {}

    async fn invalidate_admin(&self, _admin_id: Uuid) -> Result<(), CacheError> {
        Ok(())
    }

    async fn sweep(&self) {}

    async fn stats(&self) -> CacheStats {
        CacheStats::disabled()
    }
}

pub fn build_listing_cache(config: &AppConfig) -> Arc<dyn ListingCache> {
    if config.listing_cache_enabled {
        info!(
            "Listing cache enabled (ttl {:?}, max {} entries)",
            config.listing_cache_ttl, config.listing_cache_max_entries
        );
        Arc::new(MokaListingCache::new(
            config.listing_cache_ttl,
            config.listing_cache_max_entries,
        ))
    } else {
        info!("Listing cache disabled");
        Arc::new(NoopListingCache)
    }
}

/// Periodically sweeps the cache until the returned handle is aborted.
pub fn spawn_sweeper(cache: Arc<dyn ListingCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cache.sweep().await;
            debug!("Listing cache sweep complete");
        }
    })
}
