use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub work_hours: Option<f64>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum AttendanceStatus {
        Present => "PRESENT",
        Absent => "ABSENT",
        Late => "LATE",
        HalfDay => "HALF_DAY",
    }
}

/// Admin-entered attendance; omitted fields keep the stored values on merge.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAttendanceInput {
    pub employee_id: Uuid,
    pub date: DayInput,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

/// A calendar date or a full timestamp; either is truncated to its day.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DayInput {
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl DayInput {
    pub fn day(&self) -> NaiveDate {
        match self {
            DayInput::Date(date) => *date,
            DayInput::Timestamp(at) => day_key(*at),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceFilter {
    pub employee_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

/// How the hours between check-in and check-out are turned into `work_hours`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkHoursPolicy {
    /// Truncate toward zero to whole hours.
    #[default]
    WholeHours,
    /// Keep fractional hours, rounded to two decimals.
    Exact,
}

impl std::str::FromStr for WorkHoursPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whole" | "whole_hours" | "truncate" => Ok(WorkHoursPolicy::WholeHours),
            "exact" | "fractional" => Ok(WorkHoursPolicy::Exact),
            _ => Err(format!("Invalid work hours policy: {}", s)),
        }
    }
}

impl WorkHoursPolicy {
    /// Hours worked between two timestamps, never negative.
    pub fn compute(&self, check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
        let elapsed = check_out.signed_duration_since(check_in);
        let hours = match self {
            WorkHoursPolicy::WholeHours => elapsed.num_hours() as f64,
            WorkHoursPolicy::Exact => {
                let exact = elapsed.num_seconds() as f64 / 3600.0;
                (exact * 100.0).round() / 100.0
            }
        };
        hours.max(0.0)
    }
}

/// The calendar day used as the attendance uniqueness key.
pub fn day_key(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}
