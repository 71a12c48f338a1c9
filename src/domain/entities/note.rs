//! Case notes: free-text annotations, immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseNote {
    pub id: Uuid,
    pub case_id: Uuid,
    pub content: String,
    pub is_internal: bool,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
}
