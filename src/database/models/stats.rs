use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Attendance, AttendanceStatus, LeaveRequest, LeaveStatus};

/// Inclusive calendar window used by the read-side rollups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Period {
    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start_date = date.with_day(1).unwrap_or(date);
        let next_month = if start_date.month() == 12 {
            NaiveDate::from_ymd_opt(start_date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start_date.year(), start_date.month() + 1, 1)
        };
        let end_date = next_month
            .and_then(|d| d.pred_opt())
            .unwrap_or(start_date);
        Self {
            start_date,
            end_date,
        }
    }

    pub fn month(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self::month_of)
    }

    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start_date: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end_date: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    /// The `days` days ending at `end`, oldest first.
    pub fn trailing_days(end: NaiveDate, days: u32) -> Vec<NaiveDate> {
        (0..days as i64)
            .rev()
            .map(|offset| end - Duration::days(offset))
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_days: i64,
    pub present_days: i64,
    pub late_days: i64,
    pub absent_days: i64,
    pub half_days: i64,
    pub total_work_hours: f64,
}

impl AttendanceSummary {
    pub fn from_records(records: &[Attendance]) -> Self {
        let mut summary = records.iter().fold(Self::default(), |mut acc, record| {
            acc.total_days += 1;
            match record.status {
                AttendanceStatus::Present => acc.present_days += 1,
                AttendanceStatus::Late => acc.late_days += 1,
                AttendanceStatus::Absent => acc.absent_days += 1,
                AttendanceStatus::HalfDay => acc.half_days += 1,
            }
            acc.total_work_hours += record.work_hours.unwrap_or(0.0);
            acc
        });
        summary.total_work_hours = round_one_decimal(summary.total_work_hours);
        summary
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveTally {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub total: i64,
}

impl LeaveTally {
    pub fn from_requests(requests: &[LeaveRequest]) -> Self {
        requests.iter().fold(Self::default(), |mut acc, request| {
            acc.total += 1;
            match request.status {
                LeaveStatus::Pending => acc.pending += 1,
                LeaveStatus::Approved => acc.approved += 1,
                LeaveStatus::Rejected => acc.rejected += 1,
            }
            acc
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStats {
    pub period: Period,
    pub attendance: AttendanceSummary,
    pub leaves: LeaveTally,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeadCount {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodayAttendance {
    pub present: i64,
    pub late: i64,
    pub absent: i64,
    pub on_leave: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatus {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub work_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAttendanceStats {
    pub today: TodayAttendance,
    pub last_7_days: Vec<DailyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLeaveStats {
    pub pending: i64,
    pub approved_this_month: i64,
    pub recent_requests: Vec<LeaveRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub employees: HeadCount,
    pub attendance: AdminAttendanceStats,
    pub leaves: AdminLeaveStats,
    pub departments: Vec<DepartmentCount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeLeaveStats {
    pub pending: i64,
    pub approved_this_month: i64,
    pub rejected_this_month: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDashboard {
    pub today: Option<Attendance>,
    pub this_month: AttendanceSummary,
    pub leaves: EmployeeLeaveStats,
    pub recent_leave_requests: Vec<LeaveRequest>,
    pub last_7_days: Vec<DailyStatus>,
}

/// Fills days without a record as ABSENT with zero hours.
pub fn daily_statuses(days: &[NaiveDate], records: &[Attendance]) -> Vec<DailyStatus> {
    days.iter()
        .map(|day| match records.iter().find(|r| r.date == *day) {
            Some(record) => DailyStatus {
                date: *day,
                status: record.status,
                work_hours: record.work_hours.unwrap_or(0.0),
            },
            None => DailyStatus {
                date: *day,
                status: AttendanceStatus::Absent,
                work_hours: 0.0,
            },
        })
        .collect()
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(date: NaiveDate, status: AttendanceStatus, hours: Option<f64>) -> Attendance {
        let now = Utc::now();
        Attendance {
            id: Uuid::new_v4(),
            employee_id: Uuid::nil(),
            date,
            check_in: None,
            check_out: None,
            work_hours: hours,
            status,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn month_bounds() {
        assert_eq!(
            Period::month_of(d(2024, 2, 14)),
            Period {
                start_date: d(2024, 2, 1),
                end_date: d(2024, 2, 29)
            }
        );
        assert_eq!(Period::month(2024, 12).unwrap().end_date, d(2024, 12, 31));
        assert!(Period::month(2024, 13).is_none());
    }

    #[test]
    fn trailing_days_oldest_first() {
        let days = Period::trailing_days(d(2024, 3, 2), 3);
        assert_eq!(days, vec![d(2024, 2, 29), d(2024, 3, 1), d(2024, 3, 2)]);
    }

    #[test]
    fn empty_summary_is_zero() {
        assert_eq!(AttendanceSummary::from_records(&[]), AttendanceSummary::default());
        assert_eq!(LeaveTally::from_requests(&[]), LeaveTally::default());
    }

    #[test]
    fn summary_counts_statuses_and_hours() {
        let records = vec![
            record(d(2024, 5, 1), AttendanceStatus::Present, Some(8.0)),
            record(d(2024, 5, 2), AttendanceStatus::Late, Some(6.5)),
            record(d(2024, 5, 3), AttendanceStatus::Absent, None),
            record(d(2024, 5, 4), AttendanceStatus::HalfDay, Some(4.0)),
        ];
        let summary = AttendanceSummary::from_records(&records);
        assert_eq!(summary.total_days, 4);
        assert_eq!(summary.present_days, 1);
        assert_eq!(summary.late_days, 1);
        assert_eq!(summary.absent_days, 1);
        assert_eq!(summary.half_days, 1);
        assert_eq!(summary.total_work_hours, 18.5);
    }

    #[test]
    fn missing_days_are_absent() {
        let days = Period::trailing_days(d(2024, 5, 3), 3);
        let records = vec![record(d(2024, 5, 2), AttendanceStatus::Late, Some(7.0))];
        let series = daily_statuses(&days, &records);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].status, AttendanceStatus::Absent);
        assert_eq!(series[1].status, AttendanceStatus::Late);
        assert_eq!(series[1].work_hours, 7.0);
        assert_eq!(series[2].work_hours, 0.0);
    }
}
