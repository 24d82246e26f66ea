use axum::{routing::get, Router};
use std::sync::Arc;

use crate::handlers::get_cache_stats;
use crate::services::cache::ListingCache;

pub fn create_performance_router(cache: Arc<dyn ListingCache>) -> Router {
    Router::new()
        .route("/stats", get(get_cache_stats))
        .with_state(cache)
}
