use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{
    Action, LeaveFilter, LeaveRequestInput, LeaveStatus, PaginationQuery, ReviewLeaveInput,
};
use crate::database::repositories::{CancelActor, LeaveRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{ActivityLogger, AnyRole, Authorized, Staff};

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveListQuery {
    pub employee_id: Option<Uuid>,
    pub status: Option<LeaveStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

pub async fn create_leave_request(
    user_context: Authorized<AnyRole>,
    leaves: web::Data<LeaveRepository>,
    input: web::Json<LeaveRequestInput>,
) -> Result<HttpResponse, AppError> {
    let employee = user_context.require_employee()?;

    let request = leaves.create(employee.id, input.into_inner()).await?;

    Ok(ApiResponse::created(request))
}

pub async fn list_leave_requests(
    _user_context: Authorized<Staff>,
    leaves: web::Data<LeaveRepository>,
    query: web::Query<LeaveListQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let page = PaginationQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);
    let filter = LeaveFilter {
        employee_id: query.employee_id,
        status: query.status,
    };

    let result = leaves.list(&filter, page).await?;

    Ok(ApiResponse::success(result))
}

/// The caller's own requests; `employeeId` in the query is ignored.
pub async fn my_leave_requests(
    user_context: Authorized<AnyRole>,
    leaves: web::Data<LeaveRepository>,
    query: web::Query<LeaveListQuery>,
) -> Result<HttpResponse, AppError> {
    let employee = user_context.require_employee()?;

    let query = query.into_inner();
    let page = PaginationQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);
    let filter = LeaveFilter {
        employee_id: Some(employee.id),
        status: query.status,
    };

    let result = leaves.list(&filter, page).await?;

    Ok(ApiResponse::success(result))
}

pub async fn get_leave_request(
    user_context: Authorized<AnyRole>,
    path: web::Path<Uuid>,
    leaves: web::Data<LeaveRepository>,
) -> Result<HttpResponse, AppError> {
    let request = leaves
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;

    user_context.require_access_to(request.employee_id)?;

    Ok(ApiResponse::success(request))
}

pub async fn review_leave_request(
    user_context: Authorized<Staff>,
    path: web::Path<Uuid>,
    leaves: web::Data<LeaveRepository>,
    activity_logger: web::Data<ActivityLogger>,
    input: web::Json<ReviewLeaveInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let input = input.into_inner();

    let reviewed = leaves
        .review(
            path.into_inner(),
            input.status,
            user_context.user_id(),
            input.review_notes,
        )
        .await?;

    let action = match reviewed.status {
        LeaveStatus::Approved => Action::APPROVED,
        _ => Action::REJECTED,
    };

    if let Err(e) = activity_logger
        .log_leave_activity(
            user_context.user_id(),
            reviewed.id,
            action,
            format!(
                "Leave request {} {} ({} to {})",
                reviewed.id, action, reviewed.start_date, reviewed.end_date
            ),
            Some(ActivityLogger::metadata(vec![
                ("employee_id", reviewed.employee_id.to_string()),
                ("status", reviewed.status.to_string()),
            ])),
            &req,
        )
        .await
    {
        log::warn!("Failed to log leave review activity: {}", e);
    }

    Ok(ApiResponse::success(reviewed))
}

pub async fn cancel_leave_request(
    user_context: Authorized<AnyRole>,
    path: web::Path<Uuid>,
    leaves: web::Data<LeaveRepository>,
    activity_logger: web::Data<ActivityLogger>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = CancelActor {
        employee_id: user_context.employee_id(),
        is_staff: user_context.is_staff(),
    };

    let cancelled = leaves.cancel(path.into_inner(), actor).await?;

    // Removing a reviewed request is a privileged override
    let action = if cancelled.status == LeaveStatus::Pending {
        Action::CANCELLED
    } else {
        Action::OVERRIDE_CANCELLED
    };

    if let Err(e) = activity_logger
        .log_leave_activity(
            user_context.user_id(),
            cancelled.id,
            action,
            format!(
                "Leave request {} ({}) cancelled",
                cancelled.id, cancelled.status
            ),
            Some(ActivityLogger::metadata(vec![
                ("employee_id", cancelled.employee_id.to_string()),
                ("previous_status", cancelled.status.to_string()),
                ("start_date", cancelled.start_date.to_string()),
                ("end_date", cancelled.end_date.to_string()),
            ])),
            &req,
        )
        .await
    {
        log::warn!("Failed to log leave cancellation activity: {}", e);
    }

    Ok(ApiResponse::success_message("Leave request cancelled"))
}

/// Approved leave days per type for a year, defaulting to the current one.
pub async fn leave_stats(
    user_context: Authorized<AnyRole>,
    path: web::Path<Uuid>,
    leaves: web::Data<LeaveRepository>,
    query: web::Query<YearQuery>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    user_context.require_access_to(employee_id)?;

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let stats = leaves.stats_for(employee_id, year).await?;

    Ok(ApiResponse::success(stats))
}
