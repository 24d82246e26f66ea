use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::AuthenticatedAdmin;
use shared_models::error::AppError;
use shared_models::scheduling::{Appointment, AppointmentView};
use shared_utils::pagination::Page;

use crate::models::{AppointmentBooked, BookAppointmentRequest, ListQuery};
use crate::services::booking::AppointmentBookingService;

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentBooked>), AppError> {
    let id = service.book_appointment(admin.admin_id, request).await?;
    Ok((StatusCode::CREATED, Json(AppointmentBooked { id })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(service): State<Arc<AppointmentBookingService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<AppointmentView>>, AppError> {
    let page = service
        .list_appointments(admin.admin_id, query.page, query.limit)
        .await?;
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn list_appointments_by_date(
    State(service): State<Arc<AppointmentBookingService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Path(date): Path<String>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    let appointments = service.list_appointments_by_date(admin.admin_id, &date).await?;
    Ok(Json(appointments))
}

pub async fn count_appointments(
    State(service): State<Arc<AppointmentBookingService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
) -> Result<Json<Value>, AppError> {
    let total = service.count_appointments(admin.admin_id).await?;
    Ok(Json(json!({ "total": total })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = service.cancel_appointment(admin.admin_id, appointment_id).await?;
    Ok(Json(appointment))
}
