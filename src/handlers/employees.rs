use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{
    Action, CreateEmployeeInput, EmployeeDetail, EmployeeFilter, PaginationQuery, Period,
    UpdateEmployeeInput, UserRole,
};
use crate::database::repositories::{
    AttendanceRepository, EmployeeRepository, LeaveRepository, StatsRepository,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{ActivityLogger, AnyRole, AuthService, Authorized, Staff};

const DEFAULT_PAGE_SIZE: u32 = 10;
const RECENT_ATTENDANCES: i64 = 10;
const RECENT_LEAVE_REQUESTS: i64 = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListQuery {
    pub search: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

pub async fn list_employees(
    _user_context: Authorized<Staff>,
    employees: web::Data<EmployeeRepository>,
    query: web::Query<EmployeeListQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let page = PaginationQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);
    let filter = EmployeeFilter {
        search: query.search,
        department: query.department,
        is_active: query.is_active,
    };

    let result = employees.list(&filter, page).await?;

    Ok(ApiResponse::success(result))
}

/// Profile plus the latest attendance and leave activity.
pub async fn get_employee(
    user_context: Authorized<AnyRole>,
    path: web::Path<Uuid>,
    employees: web::Data<EmployeeRepository>,
    attendances: web::Data<AttendanceRepository>,
    leaves: web::Data<LeaveRepository>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    user_context.require_access_to(employee_id)?;

    let employee = employees
        .find_with_user(employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    let recent_attendances = attendances
        .recent_for_employee(employee_id, RECENT_ATTENDANCES)
        .await?;
    let recent_leave_requests = leaves
        .recent(Some(employee_id), None, RECENT_LEAVE_REQUESTS)
        .await?;

    Ok(ApiResponse::success(EmployeeDetail {
        employee,
        recent_attendances,
        recent_leave_requests,
    }))
}

pub async fn create_employee(
    user_context: Authorized<Staff>,
    auth_service: web::Data<AuthService>,
    activity_logger: web::Data<ActivityLogger>,
    input: web::Json<CreateEmployeeInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let input = input.into_inner();
    let role = input.role.unwrap_or_default();
    if role != UserRole::Employee && user_context.role() != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only administrators can create HR or ADMIN accounts".to_string(),
        ));
    }

    let created = auth_service
        .create_account(&input.email, &input.password, role, input.profile)
        .await?;

    if let Err(e) = activity_logger
        .log_employee_activity(
            user_context.user_id(),
            created.employee.id,
            Action::CREATED,
            format!("Employee {} created", created.employee.full_name()),
            Some(ActivityLogger::metadata(vec![
                ("email", created.email.clone()),
                ("role", created.role.to_string()),
            ])),
            &req,
        )
        .await
    {
        log::warn!("Failed to log employee creation activity: {}", e);
    }

    Ok(ApiResponse::created(created))
}

pub async fn update_employee(
    user_context: Authorized<Staff>,
    path: web::Path<Uuid>,
    employees: web::Data<EmployeeRepository>,
    activity_logger: web::Data<ActivityLogger>,
    input: web::Json<UpdateEmployeeInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    let input = input.into_inner();

    if let Some(email) = input.email.as_deref() {
        crate::services::auth::validate_email(email)?;
    }

    // Role changes are reserved to administrators
    if let Some(role) = input.role {
        if user_context.role() != UserRole::Admin {
            let current = employees
                .find_with_user(employee_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;
            if current.role != role {
                return Err(AppError::Forbidden(
                    "Only administrators can change roles".to_string(),
                ));
            }
        }
    }

    let updated = employees.update(employee_id, input).await?;

    if let Err(e) = activity_logger
        .log_employee_activity(
            user_context.user_id(),
            employee_id,
            Action::UPDATED,
            format!("Employee {} updated", updated.employee.full_name()),
            None,
            &req,
        )
        .await
    {
        log::warn!("Failed to log employee update activity: {}", e);
    }

    Ok(ApiResponse::success(updated))
}

pub async fn delete_employee(
    user_context: Authorized<Staff>,
    path: web::Path<Uuid>,
    employees: web::Data<EmployeeRepository>,
    activity_logger: web::Data<ActivityLogger>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();

    let deleted = employees.delete(employee_id).await?;

    if let Err(e) = activity_logger
        .log_employee_activity(
            user_context.user_id(),
            employee_id,
            Action::DELETED,
            format!("Employee {} deleted", deleted.full_name()),
            None,
            &req,
        )
        .await
    {
        log::warn!("Failed to log employee deletion activity: {}", e);
    }

    Ok(ApiResponse::success_message("Employee deleted successfully"))
}

/// Monthly attendance and leave rollup; defaults to the current month.
pub async fn employee_stats(
    user_context: Authorized<AnyRole>,
    path: web::Path<Uuid>,
    query: web::Query<MonthQuery>,
    employees: web::Data<EmployeeRepository>,
    stats: web::Data<StatsRepository>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    user_context.require_access_to(employee_id)?;

    if employees.find_by_id(employee_id).await?.is_none() {
        return Err(AppError::NotFound("Employee not found".to_string()));
    }

    let today = Utc::now().date_naive();
    let period = Period::month(
        query.year.unwrap_or(today.year()),
        query.month.unwrap_or(today.month()),
    )
    .ok_or_else(|| AppError::validation("month", "Month must be between 1 and 12"))?;

    let result = stats.employee_stats(employee_id, period).await?;

    Ok(ApiResponse::success(result))
}
