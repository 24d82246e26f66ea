use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};

use shared_config::AppConfig;
use shared_database::SchedulingStore;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::availability::AvailabilityService;

pub fn availability_routes(config: Arc<AppConfig>, store: Arc<dyn SchedulingStore>) -> Router {
    let service = Arc::new(AvailabilityService::new(store, &config));

    Router::new()
        .route("/", get(handlers::list_windows).post(handlers::create_window))
        .route("/{window_id}", delete(handlers::delete_window))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
