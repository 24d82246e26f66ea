use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::{appointment_routes, BookingNotifier};
use availability_cell::availability_routes;
use patient_cell::create_patient_router;
use performance_cell::{create_performance_router, ListingCache};
use shared_config::AppConfig;
use shared_database::SchedulingStore;

pub fn create_router(
    config: Arc<AppConfig>,
    store: Arc<dyn SchedulingStore>,
    cache: Arc<dyn ListingCache>,
    notifier: Arc<dyn BookingNotifier>,
) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/availability", availability_routes(config.clone(), store.clone()))
        .nest(
            "/appointments",
            appointment_routes(config.clone(), store.clone(), cache.clone(), notifier),
        )
        .nest("/patients", create_patient_router(config, store, cache.clone()))
        .nest("/cache", create_performance_router(cache))
}
