use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};

use performance_cell::ListingCache;
use shared_config::AppConfig;
use shared_database::SchedulingStore;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{create_patient, delete_patient, list_patients};
use crate::services::patient::PatientService;

pub fn create_patient_router(
    config: Arc<AppConfig>,
    store: Arc<dyn SchedulingStore>,
    cache: Arc<dyn ListingCache>,
) -> Router {
    let service = Arc::new(PatientService::new(&config, store, cache));

    Router::new()
        .route("/", get(list_patients).post(create_patient))
        .route("/{id}", delete(delete_patient))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
