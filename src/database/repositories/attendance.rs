use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::database::{
    models::{
        Attendance, AttendanceFilter, AttendanceStatus, ManualAttendanceInput, Page, Paginated,
        WorkHoursPolicy, day_key,
    },
    transaction::DatabaseTransaction,
};
use crate::error::AppError;

const ATTENDANCE_COLUMNS: &str = r#"
    id,
    employee_id,
    date,
    check_in,
    check_out,
    work_hours,
    status,
    notes,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: SqlitePool,
    policy: WorkHoursPolicy,
}

impl AttendanceRepository {
    pub fn new(pool: SqlitePool, policy: WorkHoursPolicy) -> Self {
        Self { pool, policy }
    }

    /// Opens today's record. The `(employee_id, date)` unique constraint is the
    /// only race guard: a losing concurrent insert surfaces as `AlreadyCheckedIn`.
    pub async fn check_in(
        &self,
        employee_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Attendance, AppError> {
        let date = day_key(now);

        let inserted = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            INSERT INTO
                attendances (
                    id,
                    employee_id,
                    date,
                    check_in,
                    status,
                    created_at,
                    updated_at
                )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(employee_id)
        .bind(date)
        .bind(now)
        .bind(AttendanceStatus::Present)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(record) => {
                log::info!("Employee {} checked in for {}", employee_id, date);
                Ok(record)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let existing = self.find_for_day(employee_id, date).await?.ok_or_else(|| {
                    AppError::internal_server_error_message("Attendance vanished after conflict")
                })?;
                Err(AppError::AlreadyCheckedIn(Box::new(existing)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Closes today's open record. The update is guarded by `check_out IS NULL`
    /// so only one of two concurrent check-outs can win.
    pub async fn check_out(
        &self,
        employee_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Attendance, AppError> {
        let date = day_key(now);

        let existing = self
            .find_for_day(employee_id, date)
            .await?
            .ok_or(AppError::NoCheckInYet)?;

        let Some(check_in) = existing.check_in else {
            return Err(AppError::NoCheckInYet);
        };

        if existing.check_out.is_some() {
            return Err(AppError::AlreadyCheckedOut(Box::new(existing)));
        }

        let work_hours = self.policy.compute(check_in, now);

        let updated = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            UPDATE attendances
            SET
                check_out = ?,
                work_hours = ?,
                updated_at = ?
            WHERE
                id = ?
                AND check_out IS NULL
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(work_hours)
        .bind(now)
        .bind(existing.id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(record) => {
                log::info!(
                    "Employee {} checked out for {} ({} h)",
                    employee_id,
                    date,
                    work_hours
                );
                Ok(record)
            }
            None => {
                let current = self.find_by_id(existing.id).await?.unwrap_or(existing);
                Err(AppError::AlreadyCheckedOut(Box::new(current)))
            }
        }
    }

    pub async fn find_for_day(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, AppError> {
        let record = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendances WHERE employee_id = ? AND date = ?"
        ))
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Attendance>, AppError> {
        let record = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendances WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Creates or merges the record for `input.date`'s day. Omitted fields keep
    /// their stored values; `work_hours` is recomputed when both ends are known.
    pub async fn manual_upsert(
        &self,
        input: ManualAttendanceInput,
    ) -> Result<Attendance, AppError> {
        let policy = self.policy;

        DatabaseTransaction::run(&self.pool, move |conn| {
            Box::pin(async move {
                let employee_exists: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE id = ?")
                        .bind(input.employee_id)
                        .fetch_one(&mut *conn)
                        .await?;
                if employee_exists == 0 {
                    return Err(AppError::NotFound("Employee not found".to_string()));
                }

                let date = input.date.day();
                let existing = find_for_day_in(conn, input.employee_id, date).await?;

                let check_in = input
                    .check_in
                    .or(existing.as_ref().and_then(|r| r.check_in));
                let check_out = input
                    .check_out
                    .or(existing.as_ref().and_then(|r| r.check_out));
                let status = input
                    .status
                    .or(existing.as_ref().map(|r| r.status))
                    .unwrap_or(AttendanceStatus::Present);
                let notes = input
                    .notes
                    .or(existing.as_ref().and_then(|r| r.notes.clone()));

                let work_hours = match (check_in, check_out) {
                    (Some(check_in), Some(check_out)) => Some(policy.compute(check_in, check_out)),
                    (None, Some(_)) => {
                        return Err(AppError::validation(
                            "checkOut",
                            "A check-out time requires a check-in time",
                        ));
                    }
                    _ => None,
                };

                let now = Utc::now();

                let record = match existing {
                    Some(existing) => {
                        sqlx::query_as::<_, Attendance>(&format!(
                            r#"
                            UPDATE attendances
                            SET
                                check_in = ?,
                                check_out = ?,
                                work_hours = ?,
                                status = ?,
                                notes = ?,
                                updated_at = ?
                            WHERE
                                id = ?
                            RETURNING {ATTENDANCE_COLUMNS}
                            "#
                        ))
                        .bind(check_in)
                        .bind(check_out)
                        .bind(work_hours)
                        .bind(status)
                        .bind(notes)
                        .bind(now)
                        .bind(existing.id)
                        .fetch_one(&mut *conn)
                        .await?
                    }
                    None => {
                        sqlx::query_as::<_, Attendance>(&format!(
                            r#"
                            INSERT INTO
                                attendances (
                                    id,
                                    employee_id,
                                    date,
                                    check_in,
                                    check_out,
                                    work_hours,
                                    status,
                                    notes,
                                    created_at,
                                    updated_at
                                )
                            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                            RETURNING {ATTENDANCE_COLUMNS}
                            "#
                        ))
                        .bind(Uuid::new_v4())
                        .bind(input.employee_id)
                        .bind(date)
                        .bind(check_in)
                        .bind(check_out)
                        .bind(work_hours)
                        .bind(status)
                        .bind(notes)
                        .bind(now)
                        .bind(now)
                        .fetch_one(&mut *conn)
                        .await?
                    }
                };

                Ok(record)
            })
        })
        .await
    }

    /// Filtered listing, newest day first.
    pub async fn query(
        &self,
        filter: &AttendanceFilter,
        page: Page,
    ) -> Result<Paginated<Attendance>, AppError> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM attendances");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select_query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {ATTENDANCE_COLUMNS} FROM attendances"));
        push_filters(&mut select_query, filter);
        select_query
            .push(" ORDER BY date DESC, created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select_query
            .build_query_as::<Attendance>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated::new(items, total, page))
    }

    pub async fn recent_for_employee(
        &self,
        employee_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Attendance>, AppError> {
        let records = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendances
            WHERE employee_id = ?
            ORDER BY date DESC
            LIMIT ?
            "#
        ))
        .bind(employee_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Hard delete; returns the removed record.
    pub async fn delete(&self, id: Uuid) -> Result<Attendance, AppError> {
        let deleted = sqlx::query_as::<_, Attendance>(&format!(
            "DELETE FROM attendances WHERE id = ? RETURNING {ATTENDANCE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance record not found".to_string()))?;

        Ok(deleted)
    }
}

async fn find_for_day_in(
    conn: &mut SqliteConnection,
    employee_id: Uuid,
    date: NaiveDate,
) -> Result<Option<Attendance>, AppError> {
    let record = sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendances WHERE employee_id = ? AND date = ?"
    ))
    .bind(employee_id)
    .bind(date)
    .fetch_optional(conn)
    .await?;

    Ok(record)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &AttendanceFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(employee_id) = filter.employee_id {
        builder.push(" AND employee_id = ").push_bind(employee_id);
    }
    if let Some(start_date) = filter.start_date {
        builder.push(" AND date >= ").push_bind(start_date);
    }
    if let Some(end_date) = filter.end_date {
        builder.push(" AND date <= ").push_bind(end_date);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
}
