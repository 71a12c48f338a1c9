//! Read-only reporting over the case store. Every figure is partitioned by
//! the caller's clinic; empty denominators yield 0 (compliance: 100).

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{CaseStatus, CurrentUser};
use crate::domain::repositories::{
    DynCaseRepository, DynInsurerRepository, DynUserRepository,
};
use crate::shared::AppResult;

const PROCESSING_SAMPLE: i64 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub active_cases: i64,
    pub overdue_cases: i64,
    pub new_today: i64,
    pub new_this_week: i64,
    pub new_this_month: i64,
    pub avg_processing_days: f64,
    pub by_status: Vec<StatusSlice>,
    pub by_insurer: Vec<InsurerSlice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSlice {
    pub status: CaseStatus,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsurerSlice {
    pub insurer_id: Uuid,
    pub insurer_name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrendPoint {
    pub week_starting: DateTime<Utc>,
    pub received: i64,
    pub completed: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsurerPerformance {
    pub insurer_id: Uuid,
    pub insurer_name: String,
    pub total_cases: i64,
    pub closed_cases: i64,
    pub avg_processing_days: f64,
    pub approval_rate: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaCompliance {
    pub month_starting: DateTime<Utc>,
    pub closed_cases: i64,
    pub breached_cases: i64,
    pub compliance_rate: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProductivity {
    pub user_id: Uuid,
    pub user_name: String,
    pub role: crate::domain::entities::Role,
    pub assigned_this_month: i64,
    pub completed_this_month: i64,
}

pub struct ReportService {
    cases: DynCaseRepository,
    users: DynUserRepository,
    insurers: DynInsurerRepository,
}

impl ReportService {
    pub fn new(
        cases: DynCaseRepository,
        users: DynUserRepository,
        insurers: DynInsurerRepository,
    ) -> Self {
        Self {
            cases,
            users,
            insurers,
        }
    }

    pub async fn dashboard(&self, current: &CurrentUser) -> AppResult<Dashboard> {
        let clinic_id = current.clinic_id;
        let now = Utc::now();
        let today = start_of_day(now);
        let week_ago = now - Duration::days(7);
        let month_start = start_of_month(now);

        let active_cases = self.cases.count_active(clinic_id).await?;
        let overdue_cases = self.cases.count_overdue(clinic_id).await?;
        let new_today = self
            .cases
            .count_created_between(clinic_id, today, None)
            .await?;
        let new_this_week = self
            .cases
            .count_created_between(clinic_id, week_ago, None)
            .await?;
        let new_this_month = self
            .cases
            .count_created_between(clinic_id, month_start, None)
            .await?;

        let durations = self
            .cases
            .closed_case_durations(clinic_id, None, Some(PROCESSING_SAMPLE))
            .await?;
        let avg_processing_days = average_days(&durations);

        let by_status = self
            .cases
            .status_counts(clinic_id)
            .await?
            .into_iter()
            .map(|(status, count)| StatusSlice { status, count })
            .collect();

        let insurer_counts = self.cases.insurer_counts(clinic_id).await?;
        let names = self.insurer_names(&insurer_counts).await?;
        let by_insurer = insurer_counts
            .into_iter()
            .map(|(insurer_id, count)| InsurerSlice {
                insurer_id,
                insurer_name: names.get(&insurer_id).cloned().unwrap_or_default(),
                count,
            })
            .collect();

        Ok(Dashboard {
            active_cases,
            overdue_cases,
            new_today,
            new_this_week,
            new_this_month,
            avg_processing_days,
            by_status,
            by_insurer,
        })
    }

    /// Received vs completed counts per week, oldest week first.
    pub async fn weekly_trend(
        &self,
        current: &CurrentUser,
        weeks: Option<u32>,
    ) -> AppResult<Vec<WeeklyTrendPoint>> {
        let clinic_id = current.clinic_id;
        let weeks = weeks.unwrap_or(4).clamp(1, 52) as i64;
        let now = Utc::now();

        let mut points = Vec::with_capacity(weeks as usize);
        for offset in (0..weeks).rev() {
            let week_start = now - Duration::weeks(offset + 1);
            let week_end = now - Duration::weeks(offset);
            let received = self
                .cases
                .count_created_between(clinic_id, week_start, Some(week_end))
                .await?;
            let completed = self
                .cases
                .count_completed_between(clinic_id, week_start, Some(week_end))
                .await?;
            points.push(WeeklyTrendPoint {
                week_starting: week_start,
                received,
                completed,
            });
        }
        Ok(points)
    }

    pub async fn insurer_performance(
        &self,
        current: &CurrentUser,
    ) -> AppResult<Vec<InsurerPerformance>> {
        let clinic_id = current.clinic_id;
        let totals = self.cases.insurer_counts(clinic_id).await?;
        let closed: HashMap<Uuid, i64> = self
            .cases
            .closed_insurer_counts(clinic_id)
            .await?
            .into_iter()
            .collect();
        let names = self.insurer_names(&totals).await?;

        let mut report = Vec::with_capacity(totals.len());
        for (insurer_id, total_cases) in totals {
            let durations = self
                .cases
                .closed_case_durations(clinic_id, Some(insurer_id), None)
                .await?;
            let approved = self
                .cases
                .count_with_status_in(
                    clinic_id,
                    Some(insurer_id),
                    &[
                        CaseStatus::Approved,
                        CaseStatus::TreatmentScheduled,
                        CaseStatus::Closed,
                    ],
                )
                .await?;
            let denied = self
                .cases
                .count_with_status_in(clinic_id, Some(insurer_id), &[CaseStatus::Denied])
                .await?;
            let decided = approved + denied;
            let approval_rate = if decided == 0 {
                0.0
            } else {
                approved as f64 / decided as f64 * 100.0
            };

            report.push(InsurerPerformance {
                insurer_id,
                insurer_name: names.get(&insurer_id).cloned().unwrap_or_default(),
                total_cases,
                closed_cases: closed.get(&insurer_id).copied().unwrap_or(0),
                avg_processing_days: average_days(&durations),
                approval_rate,
            });
        }
        Ok(report)
    }

    /// SLA compliance over cases closed in the current calendar month.
    /// Nothing closed means full compliance.
    pub async fn sla_compliance(&self, current: &CurrentUser) -> AppResult<SlaCompliance> {
        let clinic_id = current.clinic_id;
        let month_start = start_of_month(Utc::now());

        let closed_cases = self
            .cases
            .count_closed_completed_since(clinic_id, month_start)
            .await?;
        let breached_cases = self
            .cases
            .count_closed_breached_completed_since(clinic_id, month_start)
            .await?;
        let compliance_rate = if closed_cases == 0 {
            100.0
        } else {
            (closed_cases - breached_cases) as f64 / closed_cases as f64 * 100.0
        };

        Ok(SlaCompliance {
            month_starting: month_start,
            closed_cases,
            breached_cases,
            compliance_rate,
        })
    }

    /// Per-user workload for the current calendar month, active users only.
    pub async fn user_productivity(
        &self,
        current: &CurrentUser,
    ) -> AppResult<Vec<UserProductivity>> {
        let month_start = start_of_month(Utc::now());
        let users = self.users.list_active_in_clinic(current.clinic_id).await?;

        let mut report = Vec::with_capacity(users.len());
        for user in users {
            let assigned = self
                .cases
                .count_assigned_created_since(user.id, month_start)
                .await?;
            let completed = self
                .cases
                .count_closed_by_assignee_since(user.id, month_start)
                .await?;
            report.push(UserProductivity {
                user_id: user.id,
                user_name: user.full_name(),
                role: user.role,
                assigned_this_month: assigned,
                completed_this_month: completed,
            });
        }
        Ok(report)
    }

    async fn insurer_names(
        &self,
        counts: &[(Uuid, i64)],
    ) -> AppResult<HashMap<Uuid, String>> {
        let ids: Vec<Uuid> = counts.iter().map(|(id, _)| *id).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self.insurers.find_names(&ids).await?.into_iter().collect())
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
        .single()
        .unwrap_or(now)
}

fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

fn average_days(durations: &[(DateTime<Utc>, DateTime<Utc>)]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    let total_days: f64 = durations
        .iter()
        .map(|(created, completed)| (*completed - *created).num_seconds() as f64 / 86_400.0)
        .sum();
    total_days / durations.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average_days(&[]), 0.0);
    }

    #[test]
    fn average_days_spans_durations() {
        let t0 = Utc::now();
        let pairs = vec![(t0, t0 + Duration::days(2)), (t0, t0 + Duration::days(4))];
        let avg = average_days(&pairs);
        assert!((avg - 3.0).abs() < 1e-9);
    }
}
