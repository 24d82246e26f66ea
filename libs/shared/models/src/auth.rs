use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

/// Identity of the practitioner on whose calendar a request operates.
///
/// Attached to request extensions by the auth middleware; handlers trust it
/// without re-validating credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedAdmin {
    pub admin_id: Uuid,
    pub email: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl AuthenticatedAdmin {
    pub fn new(admin_id: Uuid) -> Self {
        Self {
            admin_id,
            email: None,
            issued_at: None,
        }
    }
}
