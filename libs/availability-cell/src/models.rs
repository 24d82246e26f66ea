use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /availability`. Times are `HH:MM`, weekday 0 = Sunday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWindowRequest {
    pub weekday: i64,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCreated {
    pub id: Uuid,
}
