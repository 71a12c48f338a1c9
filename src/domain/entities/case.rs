//! Case entity: the central referral record, its status state machine and
//! the year-scoped reference number scheme.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow status of a case. `Closed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Received,
    Submitted,
    AwaitingInsurer,
    Approved,
    Denied,
    TreatmentScheduled,
    Closed,
    Cancelled,
}

impl CaseStatus {
    /// All statuses, in workflow order.
    pub const ALL: [CaseStatus; 8] = [
        CaseStatus::Received,
        CaseStatus::Submitted,
        CaseStatus::AwaitingInsurer,
        CaseStatus::Approved,
        CaseStatus::Denied,
        CaseStatus::TreatmentScheduled,
        CaseStatus::Closed,
        CaseStatus::Cancelled,
    ];

    /// The fixed transition table. Any edge not listed here is rejected.
    pub fn allowed_transitions(self) -> &'static [CaseStatus] {
        match self {
            CaseStatus::Received => &[CaseStatus::Submitted, CaseStatus::Cancelled],
            CaseStatus::Submitted => &[CaseStatus::AwaitingInsurer, CaseStatus::Cancelled],
            CaseStatus::AwaitingInsurer => &[
                CaseStatus::Approved,
                CaseStatus::Denied,
                CaseStatus::Cancelled,
            ],
            CaseStatus::Approved => &[CaseStatus::TreatmentScheduled, CaseStatus::Cancelled],
            // A denied case may be resubmitted to the insurer.
            CaseStatus::Denied => &[CaseStatus::Closed, CaseStatus::Submitted],
            CaseStatus::TreatmentScheduled => &[CaseStatus::Closed, CaseStatus::Cancelled],
            CaseStatus::Closed | CaseStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, to: CaseStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CaseStatus::Closed | CaseStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Received => "RECEIVED",
            CaseStatus::Submitted => "SUBMITTED",
            CaseStatus::AwaitingInsurer => "AWAITING_INSURER",
            CaseStatus::Approved => "APPROVED",
            CaseStatus::Denied => "DENIED",
            CaseStatus::TreatmentScheduled => "TREATMENT_SCHEDULED",
            CaseStatus::Closed => "CLOSED",
            CaseStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIVED" => Ok(CaseStatus::Received),
            "SUBMITTED" => Ok(CaseStatus::Submitted),
            "AWAITING_INSURER" => Ok(CaseStatus::AwaitingInsurer),
            "APPROVED" => Ok(CaseStatus::Approved),
            "DENIED" => Ok(CaseStatus::Denied),
            "TREATMENT_SCHEDULED" => Ok(CaseStatus::TreatmentScheduled),
            "CLOSED" => Ok(CaseStatus::Closed),
            "CANCELLED" => Ok(CaseStatus::Cancelled),
            other => Err(format!("unknown case status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CasePriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl CasePriority {
    pub const ALL: [CasePriority; 4] = [
        CasePriority::Low,
        CasePriority::Medium,
        CasePriority::High,
        CasePriority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CasePriority::Low => "LOW",
            CasePriority::Medium => "MEDIUM",
            CasePriority::High => "HIGH",
            CasePriority::Urgent => "URGENT",
        }
    }
}

impl std::fmt::Display for CasePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CasePriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(CasePriority::Low),
            "MEDIUM" => Ok(CasePriority::Medium),
            "HIGH" => Ok(CasePriority::High),
            "URGENT" => Ok(CasePriority::Urgent),
            other => Err(format!("unknown case priority: {other}")),
        }
    }
}

/// Channel through which the referral arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseSource {
    Portal,
    Email,
    Api,
    Phone,
}

impl CaseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseSource::Portal => "PORTAL",
            CaseSource::Email => "EMAIL",
            CaseSource::Api => "API",
            CaseSource::Phone => "PHONE",
        }
    }
}

impl std::fmt::Display for CaseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CaseSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PORTAL" => Ok(CaseSource::Portal),
            "EMAIL" => Ok(CaseSource::Email),
            "API" => Ok(CaseSource::Api),
            "PHONE" => Ok(CaseSource::Phone),
            other => Err(format!("unknown case source: {other}")),
        }
    }
}

/// A patient referral tracked through the authorisation workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: Uuid,
    pub reference_number: String,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_dob: NaiveDate,
    pub patient_nhs_number: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub referral_type: String,
    pub referring_clinician: String,
    pub clinical_notes: Option<String>,
    pub insurer_id: Uuid,
    pub insurer_policy_number: Option<String>,
    pub insurer_auth_code: Option<String>,
    pub priority: CasePriority,
    pub status: CaseStatus,
    pub sla_deadline: DateTime<Utc>,
    pub sla_breached: bool,
    pub source_type: CaseSource,
    pub clinic_id: Uuid,
    pub created_by_id: Uuid,
    pub assigned_to_id: Uuid,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row per status transition, including the creation transition
/// (from = None, to = RECEIVED). Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStatusHistory {
    pub id: Uuid,
    pub case_id: Uuid,
    pub from_status: Option<CaseStatus>,
    pub to_status: CaseStatus,
    pub changed_by_id: Uuid,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Prefix for reference numbers issued in the given year, e.g. `REF-2026`.
pub fn reference_prefix(now: DateTime<Utc>) -> String {
    format!("REF-{}", now.year())
}

/// Compute the next reference number for a year given the lexically greatest
/// existing number with that year's prefix. Sequences are zero-padded to four
/// digits so lexical order matches numeric order within a year.
///
/// Not safe against concurrent creates; the storage layer's uniqueness
/// constraint is the backstop and callers surface a Conflict on violation.
pub fn next_reference(prefix: &str, latest: Option<&str>) -> String {
    let next = latest
        .and_then(|r| r.rsplit('-').next())
        .and_then(|seq| seq.parse::<u32>().ok())
        .map_or(1, |n| n + 1);
    format!("{prefix}-{next:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_legal_edge_is_accepted() {
        use CaseStatus::*;
        let legal: [(CaseStatus, CaseStatus); 13] = [
            (Received, Submitted),
            (Received, Cancelled),
            (Submitted, AwaitingInsurer),
            (Submitted, Cancelled),
            (AwaitingInsurer, Approved),
            (AwaitingInsurer, Denied),
            (AwaitingInsurer, Cancelled),
            (Approved, TreatmentScheduled),
            (Approved, Cancelled),
            (Denied, Closed),
            (Denied, Submitted),
            (TreatmentScheduled, Closed),
            (TreatmentScheduled, Cancelled),
        ];
        for (from, to) in legal {
            assert!(from.can_transition_to(to), "{from} -> {to} should be legal");
        }
    }

    #[test]
    fn every_other_edge_is_rejected() {
        use CaseStatus::*;
        let legal: &[(CaseStatus, CaseStatus)] = &[
            (Received, Submitted),
            (Received, Cancelled),
            (Submitted, AwaitingInsurer),
            (Submitted, Cancelled),
            (AwaitingInsurer, Approved),
            (AwaitingInsurer, Denied),
            (AwaitingInsurer, Cancelled),
            (Approved, TreatmentScheduled),
            (Approved, Cancelled),
            (Denied, Closed),
            (Denied, Submitted),
            (TreatmentScheduled, Closed),
            (TreatmentScheduled, Cancelled),
        ];
        for from in CaseStatus::ALL {
            for to in CaseStatus::ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} mismatch"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(CaseStatus::Closed.allowed_transitions().is_empty());
        assert!(CaseStatus::Cancelled.allowed_transitions().is_empty());
        assert!(CaseStatus::Closed.is_terminal());
        assert!(CaseStatus::Cancelled.is_terminal());
        assert!(!CaseStatus::Received.is_terminal());
    }

    #[test]
    fn submitted_cannot_jump_to_approved() {
        assert!(!CaseStatus::Submitted.can_transition_to(CaseStatus::Approved));
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in CaseStatus::ALL {
            let parsed: CaseStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("APROVED".parse::<CaseStatus>().is_err());
    }

    #[test]
    fn first_reference_of_the_year() {
        assert_eq!(next_reference("REF-2026", None), "REF-2026-0001");
    }

    #[test]
    fn reference_increments_from_latest() {
        assert_eq!(
            next_reference("REF-2026", Some("REF-2026-0041")),
            "REF-2026-0042"
        );
        assert_eq!(
            next_reference("REF-2026", Some("REF-2026-9999")),
            "REF-2026-10000"
        );
    }

    #[test]
    fn reference_prefix_uses_year() {
        let now = DateTime::parse_from_rfc3339("2026-08-30T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(reference_prefix(now), "REF-2026");
    }
}
