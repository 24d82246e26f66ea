use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::auth::AuthenticatedAdmin;
use shared_models::error::AppError;
use shared_models::scheduling::PatientView;
use shared_utils::pagination::Page;

use crate::models::{CreatePatientRequest, PatientCreated, PatientListQuery};
use crate::services::patient::PatientService;

#[axum::debug_handler]
pub async fn create_patient(
    State(service): State<Arc<PatientService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<PatientCreated>), AppError> {
    let id = service.create_patient(admin.admin_id, request).await?;
    Ok((StatusCode::CREATED, Json(PatientCreated { id })))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(service): State<Arc<PatientService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Page<PatientView>>, AppError> {
    let page = service
        .list_patients(admin.admin_id, query.page, query.limit)
        .await?;
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(service): State<Arc<PatientService>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Path(patient_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service.delete_patient(admin.admin_id, patient_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
