use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /patients`. `birth_date` is `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientCreated {
    pub id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
