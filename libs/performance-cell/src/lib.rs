// =====================================================================================
// PERFORMANCE CELL - LISTING CACHE
// =====================================================================================

pub mod models;
pub mod handlers;
pub mod router;
pub mod services;

pub use models::*;
pub use router::create_performance_router;
pub use services::cache::{
    build_listing_cache, spawn_sweeper, CachedListing, ListingCache, ListingKind, ListingScope,
    MokaListingCache, NoopListingCache, ScopeKey,
};
