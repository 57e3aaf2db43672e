use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::database::{
    models::{
        LeaveFilter, LeaveRequest, LeaveRequestInput, LeaveStats, LeaveStatus, Page, Paginated,
        Period,
    },
    transaction::DatabaseTransaction,
};
use crate::error::AppError;

const LEAVE_COLUMNS: &str = r#"
    id,
    employee_id,
    leave_type,
    start_date,
    end_date,
    reason,
    status,
    reviewed_by,
    reviewed_at,
    review_notes,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct LeaveRepository {
    pool: SqlitePool,
}

/// Who is cancelling a request, as far as the cancellation rules care.
#[derive(Debug, Clone, Copy)]
pub struct CancelActor {
    pub employee_id: Option<Uuid>,
    pub is_staff: bool,
}

impl LeaveRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Files a PENDING request. The overlap read and the insert share one
    /// `BEGIN IMMEDIATE` transaction so no other writer can slip in between.
    pub async fn create(
        &self,
        employee_id: Uuid,
        input: LeaveRequestInput,
    ) -> Result<LeaveRequest, AppError> {
        if input.reason.trim().is_empty() {
            return Err(AppError::validation("reason", "Reason is required"));
        }
        if input.start_date > input.end_date {
            return Err(AppError::InvalidDateRange);
        }

        let request = DatabaseTransaction::run(&self.pool, move |conn| {
            Box::pin(async move {
                let conflicting = sqlx::query_as::<_, LeaveRequest>(&format!(
                    r#"
                    SELECT {LEAVE_COLUMNS}
                    FROM leave_requests
                    WHERE
                        employee_id = ?
                        AND status IN ('PENDING', 'APPROVED')
                        AND start_date <= ?
                        AND end_date >= ?
                    ORDER BY start_date ASC
                    LIMIT 1
                    "#
                ))
                .bind(employee_id)
                .bind(input.end_date)
                .bind(input.start_date)
                .fetch_optional(&mut *conn)
                .await?;

                if let Some(conflicting) = conflicting {
                    return Err(AppError::OverlappingRequest(Box::new(conflicting)));
                }

                let now = Utc::now();
                let request = sqlx::query_as::<_, LeaveRequest>(&format!(
                    r#"
                    INSERT INTO
                        leave_requests (
                            id,
                            employee_id,
                            leave_type,
                            start_date,
                            end_date,
                            reason,
                            status,
                            created_at,
                            updated_at
                        )
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    RETURNING {LEAVE_COLUMNS}
                    "#
                ))
                .bind(Uuid::new_v4())
                .bind(employee_id)
                .bind(input.leave_type)
                .bind(input.start_date)
                .bind(input.end_date)
                .bind(input.reason.trim().to_string())
                .bind(LeaveStatus::Pending)
                .bind(now)
                .bind(now)
                .fetch_one(&mut *conn)
                .await?;

                Ok(request)
            })
        })
        .await?;

        log::info!(
            "Leave request {} filed by employee {} ({} to {})",
            request.id,
            employee_id,
            request.start_date,
            request.end_date
        );

        Ok(request)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LeaveRequest>, AppError> {
        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Moves a PENDING request to APPROVED or REJECTED.
    pub async fn review(
        &self,
        id: Uuid,
        decision: LeaveStatus,
        reviewer_id: Uuid,
        review_notes: Option<String>,
    ) -> Result<LeaveRequest, AppError> {
        if decision == LeaveStatus::Pending {
            return Err(AppError::validation(
                "status",
                "Decision must be APPROVED or REJECTED",
            ));
        }

        DatabaseTransaction::run(&self.pool, move |conn| {
            Box::pin(async move {
                let current = sqlx::query_as::<_, LeaveRequest>(&format!(
                    "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
                ))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;

                if !current.status.can_transition_to(decision) {
                    return Err(AppError::AlreadyReviewed(current.status));
                }

                let now = Utc::now();
                let reviewed = sqlx::query_as::<_, LeaveRequest>(&format!(
                    r#"
                    UPDATE leave_requests
                    SET
                        status = ?,
                        reviewed_by = ?,
                        reviewed_at = ?,
                        review_notes = ?,
                        updated_at = ?
                    WHERE
                        id = ?
                        AND status = 'PENDING'
                    RETURNING {LEAVE_COLUMNS}
                    "#
                ))
                .bind(decision)
                .bind(reviewer_id)
                .bind(now)
                .bind(review_notes)
                .bind(now)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(AppError::AlreadyReviewed(current.status))?;

                Ok(reviewed)
            })
        })
        .await
    }

    /// Deletes a request subject to the cancellation rules; returns the removed row.
    pub async fn cancel(&self, id: Uuid, actor: CancelActor) -> Result<LeaveRequest, AppError> {
        DatabaseTransaction::run(&self.pool, move |conn| {
            Box::pin(async move {
                let request = sqlx::query_as::<_, LeaveRequest>(&format!(
                    "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
                ))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;

                check_cancellation(&request, actor)?;

                sqlx::query("DELETE FROM leave_requests WHERE id = ?")
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;

                Ok(request)
            })
        })
        .await
    }

    /// Filtered listing, most recently filed first.
    pub async fn list(
        &self,
        filter: &LeaveFilter,
        page: Page,
    ) -> Result<Paginated<LeaveRequest>, AppError> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM leave_requests");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select_query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {LEAVE_COLUMNS} FROM leave_requests"));
        push_filters(&mut select_query, filter);
        select_query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select_query
            .build_query_as::<LeaveRequest>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated::new(items, total, page))
    }

    pub async fn recent(
        &self,
        employee_id: Option<Uuid>,
        status: Option<LeaveStatus>,
        limit: i64,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let filter = LeaveFilter {
            employee_id,
            status,
        };

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {LEAVE_COLUMNS} FROM leave_requests"));
        push_filters(&mut query, &filter);
        query.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

        let requests = query
            .build_query_as::<LeaveRequest>()
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    /// Approved day totals per leave type for requests starting in `year`.
    pub async fn stats_for(&self, employee_id: Uuid, year: i32) -> Result<LeaveStats, AppError> {
        let period =
            Period::year(year).ok_or_else(|| AppError::validation("year", "Year is out of range"))?;

        let approved = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests
            WHERE
                employee_id = ?
                AND status = 'APPROVED'
                AND start_date >= ?
                AND start_date <= ?
            "#
        ))
        .bind(employee_id)
        .bind(period.start_date)
        .bind(period.end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(LeaveStats::from_requests(year, &approved))
    }
}

/// Owners may withdraw PENDING requests; staff may remove any request.
pub fn check_cancellation(request: &LeaveRequest, actor: CancelActor) -> Result<(), AppError> {
    if actor.is_staff {
        return Ok(());
    }

    if actor.employee_id != Some(request.employee_id) {
        return Err(AppError::Forbidden(
            "You can only cancel your own leave requests".to_string(),
        ));
    }

    match request.status {
        LeaveStatus::Pending => Ok(()),
        LeaveStatus::Approved => Err(AppError::CannotCancelApproved),
        LeaveStatus::Rejected => Err(AppError::AlreadyReviewed(LeaveStatus::Rejected)),
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &LeaveFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(employee_id) = filter.employee_id {
        builder.push(" AND employee_id = ").push_bind(employee_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
}
