use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;

use crate::database::models::day_key;
use crate::database::repositories::StatsRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{AnyRole, Authorized, Staff};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub department: Option<String>,
}

pub async fn admin_dashboard(
    _user_context: Authorized<Staff>,
    stats: web::Data<StatsRepository>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, AppError> {
    let department = query
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let dashboard = stats
        .admin_dashboard(day_key(Utc::now()), department)
        .await?;

    Ok(ApiResponse::success(dashboard))
}

pub async fn employee_dashboard(
    user_context: Authorized<AnyRole>,
    stats: web::Data<StatsRepository>,
) -> Result<HttpResponse, AppError> {
    let employee = user_context.require_employee()?;

    let dashboard = stats
        .employee_dashboard(employee.id, day_key(Utc::now()))
        .await?;

    Ok(ApiResponse::success(dashboard))
}
