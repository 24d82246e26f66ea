use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestAdmin {
    pub id: Uuid,
    pub email: String,
}

impl Default for TestAdmin {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
        }
    }
}

impl TestAdmin {
    pub fn new(email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
        }
    }

    /// `Authorization` header value signed with the given config's secret.
    pub fn bearer(&self, config: &AppConfig) -> String {
        format!(
            "Bearer {}",
            JwtTestUtils::create_test_token(self, &config.supabase_jwt_secret, Some(1))
        )
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(admin: &TestAdmin, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        Self::sign(
            json!({
                "sub": admin.id,
                "email": admin.email,
                "role": "admin",
                "iat": now.timestamp(),
                "exp": exp.timestamp()
            }),
            secret,
        )
    }

    pub fn create_token_with_subject(subject: &str, secret: &str) -> String {
        let now = Utc::now();
        Self::sign(
            json!({
                "sub": subject,
                "iat": now.timestamp(),
                "exp": (now + Duration::hours(1)).timestamp()
            }),
            secret,
        )
    }

    pub fn create_expired_token(admin: &TestAdmin, secret: &str) -> String {
        Self::create_test_token(admin, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(admin: &TestAdmin) -> String {
        Self::create_test_token(admin, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    fn sign(payload: serde_json::Value, secret: &str) -> String {
        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature_encoded)
    }
}

/// PostgREST row shapes for the scheduling tables.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn window_row(id: Uuid, admin_id: Uuid, weekday: u8, start: &str, end: &str) -> serde_json::Value {
        json!({
            "id": id,
            "client_id": admin_id,
            "weekday": weekday,
            "start_time": start,
            "end_time": end
        })
    }

    pub fn appointment_row(
        id: Uuid,
        admin_id: Uuid,
        patient_id: Uuid,
        full_name: &str,
        date: &str,
        start: &str,
        end: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "client_id": admin_id,
            "patient_id": patient_id,
            "date": date,
            "start_time": start,
            "end_time": end,
            "status": status,
            "patients": { "full_name": full_name }
        })
    }

    pub fn patient_row(id: Uuid, admin_id: Uuid, full_name: &str, email: &str) -> serde_json::Value {
        json!({
            "id": id,
            "client_id": admin_id,
            "full_name": full_name,
            "email": email,
            "phone": "+55 11 99999-0000",
            "birth_date": "1990-01-01"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code,
            "details": null,
            "hint": null
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_service_key, "test-service-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_jwt_token_creation() {
        let admin = TestAdmin::default();
        let token = JwtTestUtils::create_test_token(&admin, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_bearer_header_shape() {
        let config = TestConfig::default().to_app_config();
        let header = TestAdmin::new("doc@example.com").bearer(&config);

        assert!(header.starts_with("Bearer "));
    }
}
