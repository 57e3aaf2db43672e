use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{
    AdminAttendanceStats, AdminDashboard, AdminLeaveStats, Attendance, AttendanceStatus,
    AttendanceSummary, DailyCount, DepartmentCount, EmployeeDashboard, EmployeeLeaveStats,
    EmployeeStats, HeadCount, LeaveRequest, LeaveTally, Period, TodayAttendance, daily_statuses,
};
use crate::error::AppError;

const TRAILING_DAYS: u32 = 7;
const RECENT_REQUESTS: i64 = 5;

const ATTENDANCE_COLUMNS: &str = r#"
    a.id,
    a.employee_id,
    a.date,
    a.check_in,
    a.check_out,
    a.work_hours,
    a.status,
    a.notes,
    a.created_at,
    a.updated_at
"#;

const LEAVE_COLUMNS: &str = r#"
    l.id,
    l.employee_id,
    l.leave_type,
    l.start_date,
    l.end_date,
    l.reason,
    l.status,
    l.reviewed_by,
    l.reviewed_at,
    l.review_notes,
    l.created_at,
    l.updated_at
"#;

/// Read-only rollups; everything is recomputed from the ledger on each call.
#[derive(Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn employee_stats(
        &self,
        employee_id: Uuid,
        period: Period,
    ) -> Result<EmployeeStats, AppError> {
        let attendances = self
            .attendances_between(employee_id, period.start_date, period.end_date)
            .await?;

        let leaves = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests l
            WHERE
                l.employee_id = ?
                AND l.start_date <= ?
                AND l.end_date >= ?
            "#
        ))
        .bind(employee_id)
        .bind(period.end_date)
        .bind(period.start_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(EmployeeStats {
            period,
            attendance: AttendanceSummary::from_records(&attendances),
            leaves: LeaveTally::from_requests(&leaves),
        })
    }

    /// Organisation-wide dashboard, optionally narrowed to one department.
    pub async fn admin_dashboard(
        &self,
        today: NaiveDate,
        department: Option<&str>,
    ) -> Result<AdminDashboard, AppError> {
        let month = Period::month_of(today);

        let (total, active): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN e.is_active THEN 1 ELSE 0 END), 0)
            FROM employees e
            WHERE (? IS NULL OR e.department = ?)
            "#,
        )
        .bind(department)
        .bind(department)
        .fetch_one(&self.pool)
        .await?;

        let today_by_status: Vec<(AttendanceStatus, i64)> = sqlx::query_as(
            r#"
            SELECT a.status, COUNT(*)
            FROM attendances a
            JOIN employees e ON e.id = a.employee_id
            WHERE
                a.date = ?
                AND e.is_active = 1
                AND (? IS NULL OR e.department = ?)
            GROUP BY a.status
            "#,
        )
        .bind(today)
        .bind(department)
        .bind(department)
        .fetch_all(&self.pool)
        .await?;

        let on_leave: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT l.employee_id)
            FROM leave_requests l
            JOIN employees e ON e.id = l.employee_id
            WHERE
                l.status = 'APPROVED'
                AND l.start_date <= ?
                AND l.end_date >= ?
                AND e.is_active = 1
                AND (? IS NULL OR e.department = ?)
            "#,
        )
        .bind(today)
        .bind(today)
        .bind(department)
        .bind(department)
        .fetch_one(&self.pool)
        .await?;

        let days = Period::trailing_days(today, TRAILING_DAYS);
        let present_by_day: Vec<(NaiveDate, i64)> = sqlx::query_as(
            r#"
            SELECT a.date, COUNT(*)
            FROM attendances a
            JOIN employees e ON e.id = a.employee_id
            WHERE
                a.status = 'PRESENT'
                AND a.date >= ?
                AND a.date <= ?
                AND e.is_active = 1
                AND (? IS NULL OR e.department = ?)
            GROUP BY a.date
            "#,
        )
        .bind(days.first().copied().unwrap_or(today))
        .bind(today)
        .bind(department)
        .bind(department)
        .fetch_all(&self.pool)
        .await?;

        let (pending, approved_this_month): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN l.status = 'PENDING' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN l.status = 'APPROVED' AND l.start_date >= ? AND l.start_date <= ? THEN 1 ELSE 0 END), 0)
            FROM leave_requests l
            JOIN employees e ON e.id = l.employee_id
            WHERE (? IS NULL OR e.department = ?)
            "#,
        )
        .bind(month.start_date)
        .bind(month.end_date)
        .bind(department)
        .bind(department)
        .fetch_one(&self.pool)
        .await?;

        let recent_requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests l
            JOIN employees e ON e.id = l.employee_id
            WHERE
                l.status = 'PENDING'
                AND (? IS NULL OR e.department = ?)
            ORDER BY l.created_at DESC
            LIMIT ?
            "#
        ))
        .bind(department)
        .bind(department)
        .bind(RECENT_REQUESTS)
        .fetch_all(&self.pool)
        .await?;

        let departments = sqlx::query_as::<_, DepartmentCount>(
            r#"
            SELECT e.department AS name, COUNT(*) AS count
            FROM employees e
            WHERE
                e.is_active = 1
                AND (? IS NULL OR e.department = ?)
            GROUP BY e.department
            ORDER BY count DESC, name ASC
            "#,
        )
        .bind(department)
        .bind(department)
        .fetch_all(&self.pool)
        .await?;

        let count_of = |status: AttendanceStatus| {
            today_by_status
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, count)| *count)
        };
        let recorded_today: i64 = today_by_status.iter().map(|(_, count)| count).sum();

        let last_7_days = days
            .iter()
            .map(|day| DailyCount {
                date: *day,
                count: present_by_day
                    .iter()
                    .find(|(d, _)| d == day)
                    .map_or(0, |(_, count)| *count),
            })
            .collect();

        Ok(AdminDashboard {
            employees: HeadCount {
                total,
                active,
                inactive: total - active,
            },
            attendance: AdminAttendanceStats {
                today: TodayAttendance {
                    present: count_of(AttendanceStatus::Present),
                    late: count_of(AttendanceStatus::Late),
                    absent: (active - recorded_today).max(0),
                    on_leave,
                },
                last_7_days,
            },
            leaves: AdminLeaveStats {
                pending,
                approved_this_month,
                recent_requests,
            },
            departments,
        })
    }

    pub async fn employee_dashboard(
        &self,
        employee_id: Uuid,
        today: NaiveDate,
    ) -> Result<EmployeeDashboard, AppError> {
        let month = Period::month_of(today);
        let month_start_at: DateTime<Utc> = month.start_date.and_time(NaiveTime::MIN).and_utc();

        let month_records = self
            .attendances_between(employee_id, month.start_date, month.end_date)
            .await?;

        let days = Period::trailing_days(today, TRAILING_DAYS);
        let week_start = days.first().copied().unwrap_or(today);
        let week_records = if month.contains(week_start) {
            month_records
                .iter()
                .filter(|r| r.date >= week_start && r.date <= today)
                .cloned()
                .collect()
        } else {
            self.attendances_between(employee_id, week_start, today).await?
        };

        let today_record = month_records.iter().find(|r| r.date == today).cloned();

        let (pending, approved_this_month, rejected_this_month): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COALESCE(SUM(CASE WHEN status = 'PENDING' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'APPROVED' AND start_date >= ? AND start_date <= ? THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'REJECTED' AND created_at >= ? THEN 1 ELSE 0 END), 0)
                FROM leave_requests
                WHERE employee_id = ?
                "#,
            )
            .bind(month.start_date)
            .bind(month.end_date)
            .bind(month_start_at)
            .bind(employee_id)
            .fetch_one(&self.pool)
            .await?;

        let recent_leave_requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests l
            WHERE l.employee_id = ?
            ORDER BY l.created_at DESC
            LIMIT ?
            "#
        ))
        .bind(employee_id)
        .bind(RECENT_REQUESTS)
        .fetch_all(&self.pool)
        .await?;

        Ok(EmployeeDashboard {
            today: today_record,
            this_month: AttendanceSummary::from_records(&month_records),
            leaves: EmployeeLeaveStats {
                pending,
                approved_this_month,
                rejected_this_month,
            },
            recent_leave_requests,
            last_7_days: daily_statuses(&days, &week_records),
        })
    }

    async fn attendances_between(
        &self,
        employee_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Attendance>, AppError> {
        let records = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendances a
            WHERE
                a.employee_id = ?
                AND a.date >= ?
                AND a.date <= ?
            ORDER BY a.date ASC
            "#
        ))
        .bind(employee_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
