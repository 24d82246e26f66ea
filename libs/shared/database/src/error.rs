use serde::Deserialize;
use thiserror::Error;
use tracing::error;

use shared_models::SchedulingError;

use crate::supabase::SupabaseError;

const EXCLUSION_VIOLATION: &str = "23P01";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
}

/// SQLSTATE carried in a PostgREST error body, if the body is one.
fn postgres_code(body: &str) -> Option<String> {
    serde_json::from_str::<PostgrestErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.code)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no matching row")]
    NotFound,

    /// The storage-level exclusion constraint rejected the write.
    #[error("write rejected by exclusion constraint")]
    Conflict,

    /// The row is still referenced by another relation.
    #[error("row is still referenced")]
    Referenced,

    #[error("storage deadline exceeded during {operation}")]
    Timeout { operation: &'static str },

    #[error("storage failure during {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    /// Logs and wraps a backend failure. Every storage failure passes through here
    /// or through the deadline wrapper before being translated.
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        error!(operation, %message, "storage operation failed");
        StoreError::Backend { operation, message }
    }

    pub(crate) fn from_supabase(operation: &'static str, err: SupabaseError) -> Self {
        match err {
            SupabaseError::Status { status: 409, body } => match postgres_code(&body).as_deref() {
                Some(EXCLUSION_VIOLATION) => StoreError::Conflict,
                Some(FOREIGN_KEY_VIOLATION) => StoreError::Referenced,
                _ => StoreError::backend(operation, format!("API error (409): {}", body)),
            },
            other => StoreError::backend(operation, other.to_string()),
        }
    }

    /// Translates into the domain taxonomy; `entity` names what was missing.
    pub fn for_entity(self, entity: &'static str) -> SchedulingError {
        match self {
            StoreError::NotFound => SchedulingError::NotFound(entity),
            StoreError::Conflict => SchedulingError::SlotConflict,
            StoreError::Referenced => SchedulingError::InUse(entity),
            StoreError::Timeout { operation } => {
                SchedulingError::Storage(format!("timeout during {}", operation))
            }
            StoreError::Backend { operation, .. } => {
                SchedulingError::Storage(format!("backend failure during {}", operation))
            }
        }
    }
}
