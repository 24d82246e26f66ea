use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use performance_cell::ListingCache;
use shared_config::AppConfig;
use shared_database::SchedulingStore;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::booking::AppointmentBookingService;
use crate::services::notification::BookingNotifier;

pub fn appointment_routes(
    config: Arc<AppConfig>,
    store: Arc<dyn SchedulingStore>,
    cache: Arc<dyn ListingCache>,
    notifier: Arc<dyn BookingNotifier>,
) -> Router {
    let service = Arc::new(AppointmentBookingService::new(&config, store, cache, notifier));

    Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::list_appointments))
        .route("/count", get(handlers::count_appointments))
        .route("/date/{date}", get(handlers::list_appointments_by_date))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
