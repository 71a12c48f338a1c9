//! Insurer: shared reference data, not owned by any clinic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insurer {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub avg_response_days: Option<i64>,
    pub created_at: DateTime<Utc>,
}
