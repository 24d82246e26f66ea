use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::auth::AuthenticatedAdmin;
use shared_models::error::AppError;
use shared_models::scheduling::WindowView;

use crate::models::{CreateWindowRequest, WindowCreated};
use crate::services::availability::AvailabilityService;

#[axum::debug_handler]
pub async fn create_window(
    State(service): State<Arc<AvailabilityService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Json(request): Json<CreateWindowRequest>,
) -> Result<(StatusCode, Json<WindowCreated>), AppError> {
    let id = service.create_window(admin.admin_id, request).await?;
    Ok((StatusCode::CREATED, Json(WindowCreated { id })))
}

#[axum::debug_handler]
pub async fn list_windows(
    State(service): State<Arc<AvailabilityService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
) -> Result<Json<Vec<WindowView>>, AppError> {
    let windows = service.list_windows(admin.admin_id).await?;
    Ok(Json(windows))
}

#[axum::debug_handler]
pub async fn delete_window(
    State(service): State<Arc<AvailabilityService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Path(window_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service.delete_window(admin.admin_id, window_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
