use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum LeaveType {
        Sick => "SICK",
        Vacation => "VACATION",
        Personal => "PERSONAL",
        Maternity => "MATERNITY",
        Paternity => "PATERNITY",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum LeaveStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
}

impl LeaveStatus {
    /// PENDING and APPROVED requests block overlapping ones.
    pub fn is_active(&self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }

    /// Review is only legal from PENDING.
    pub fn can_transition_to(&self, next: LeaveStatus) -> bool {
        matches!(
            (self, next),
            (LeaveStatus::Pending, LeaveStatus::Approved)
                | (LeaveStatus::Pending, LeaveStatus::Rejected)
        )
    }
}

impl LeaveRequest {
    /// Inclusive number of calendar days covered.
    pub fn day_count(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestInput {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLeaveInput {
    pub status: LeaveStatus,
    pub review_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveFilter {
    pub employee_id: Option<Uuid>,
    pub status: Option<LeaveStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveStats {
    pub year: i32,
    pub total_days: i64,
    pub by_type: BTreeMap<LeaveType, i64>,
}

impl LeaveStats {
    /// Sums approved days whose start date falls in `year`, grouped by type.
    pub fn from_requests(year: i32, requests: &[LeaveRequest]) -> Self {
        let mut by_type = BTreeMap::new();
        let mut total_days = 0;

        for request in requests
            .iter()
            .filter(|r| r.status == LeaveStatus::Approved && r.start_date.year() == year)
        {
            let days = request.day_count();
            total_days += days;
            *by_type.entry(request.leave_type).or_insert(0) += days;
        }

        Self {
            year,
            total_days,
            by_type,
        }
    }
}

pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}
