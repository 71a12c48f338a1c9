//! Clinic entity: the tenant boundary. All other data scopes to one clinic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days added to a case's creation time when the clinic has no configured SLA.
pub const DEFAULT_SLA_DAYS: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub sla_default_days: Option<i64>,
    pub subscription_tier: String,
    pub created_at: DateTime<Utc>,
}

impl Clinic {
    /// Configured SLA days, falling back to the system default.
    pub fn sla_days(&self) -> i64 {
        self.sla_default_days.unwrap_or(DEFAULT_SLA_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clinic(sla: Option<i64>) -> Clinic {
        Clinic {
            id: Uuid::new_v4(),
            name: "Harley Street Physio".to_string(),
            contact_email: None,
            contact_phone: None,
            sla_default_days: sla,
            subscription_tier: "STANDARD".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sla_days_falls_back_to_default() {
        assert_eq!(clinic(None).sla_days(), 5);
        assert_eq!(clinic(Some(10)).sla_days(), 10);
    }
}
