use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{
    Action, AttendanceFilter, AttendanceStatus, ManualAttendanceInput, PaginationQuery, day_key,
};
use crate::database::repositories::{AttendanceRepository, EmployeeRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{ActivityLogger, AnyRole, Authorized, Staff};

const DEFAULT_PAGE_SIZE: u32 = 20;
const HISTORY_PAGE_SIZE: u32 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceListQuery {
    pub employee_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn check_in(
    user_context: Authorized<AnyRole>,
    attendances: web::Data<AttendanceRepository>,
) -> Result<HttpResponse, AppError> {
    let employee = user_context.require_employee()?;

    let record = attendances.check_in(employee.id, Utc::now()).await?;

    Ok(ApiResponse::created(record))
}

pub async fn check_out(
    user_context: Authorized<AnyRole>,
    attendances: web::Data<AttendanceRepository>,
) -> Result<HttpResponse, AppError> {
    let employee = user_context.require_employee()?;

    let record = attendances.check_out(employee.id, Utc::now()).await?;

    Ok(ApiResponse::success(record))
}

/// Today's record for the caller, or `null` before check-in.
pub async fn today(
    user_context: Authorized<AnyRole>,
    attendances: web::Data<AttendanceRepository>,
) -> Result<HttpResponse, AppError> {
    let employee = user_context.require_employee()?;

    let record = attendances
        .find_for_day(employee.id, day_key(Utc::now()))
        .await?;

    Ok(ApiResponse::success(record))
}

pub async fn list_attendances(
    _user_context: Authorized<Staff>,
    attendances: web::Data<AttendanceRepository>,
    query: web::Query<AttendanceListQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let page = PaginationQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);
    let filter = AttendanceFilter {
        employee_id: query.employee_id,
        start_date: query.start_date,
        end_date: query.end_date,
        status: query.status,
    };

    let result = attendances.query(&filter, page).await?;

    Ok(ApiResponse::success(result))
}

pub async fn employee_history(
    user_context: Authorized<AnyRole>,
    path: web::Path<Uuid>,
    attendances: web::Data<AttendanceRepository>,
    employees: web::Data<EmployeeRepository>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    user_context.require_access_to(employee_id)?;

    if employees.find_by_id(employee_id).await?.is_none() {
        return Err(AppError::NotFound("Employee not found".to_string()));
    }

    let query = query.into_inner();
    let page = PaginationQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(HISTORY_PAGE_SIZE);
    let filter = AttendanceFilter {
        employee_id: Some(employee_id),
        start_date: query.start_date,
        end_date: query.end_date,
        status: None,
    };

    let result = attendances.query(&filter, page).await?;

    Ok(ApiResponse::success(result))
}

pub async fn manual_entry(
    user_context: Authorized<Staff>,
    attendances: web::Data<AttendanceRepository>,
    activity_logger: web::Data<ActivityLogger>,
    input: web::Json<ManualAttendanceInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let record = attendances.manual_upsert(input.into_inner()).await?;

    if let Err(e) = activity_logger
        .log_attendance_activity(
            user_context.user_id(),
            record.id,
            Action::MANUAL_ENTRY,
            format!(
                "Manual attendance for employee {} on {}",
                record.employee_id, record.date
            ),
            Some(ActivityLogger::metadata(vec![
                ("employee_id", record.employee_id.to_string()),
                ("date", record.date.to_string()),
                ("status", record.status.to_string()),
            ])),
            &req,
        )
        .await
    {
        log::warn!("Failed to log manual attendance activity: {}", e);
    }

    Ok(ApiResponse::success(record))
}

pub async fn delete_attendance(
    user_context: Authorized<Staff>,
    path: web::Path<Uuid>,
    attendances: web::Data<AttendanceRepository>,
    activity_logger: web::Data<ActivityLogger>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let attendance_id = path.into_inner();

    let deleted = attendances.delete(attendance_id).await?;

    if let Err(e) = activity_logger
        .log_attendance_activity(
            user_context.user_id(),
            deleted.id,
            Action::DELETED,
            format!(
                "Attendance for employee {} on {} deleted",
                deleted.employee_id, deleted.date
            ),
            Some(ActivityLogger::metadata(vec![
                ("employee_id", deleted.employee_id.to_string()),
                ("date", deleted.date.to_string()),
            ])),
            &req,
        )
        .await
    {
        log::warn!("Failed to log attendance deletion activity: {}", e);
    }

    Ok(ApiResponse::success_message("Attendance record deleted"))
}
