use actix_web::{HttpResponse, web};

use crate::database::models::{
    ChangePasswordInput, LoginInput, RegisterInput, UserProfile, UserRole,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{AnyRole, AuthService, Authorized, UserContext};

pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginInput>,
) -> Result<HttpResponse, AppError> {
    let response = auth_service.login(request.into_inner()).await?;

    Ok(ApiResponse::success(response))
}

/// Public for EMPLOYEE accounts; an authenticated ADMIN may also create HR and ADMIN users.
pub async fn register(
    auth_service: web::Data<AuthService>,
    caller: Option<UserContext>,
    request: web::Json<RegisterInput>,
) -> Result<HttpResponse, AppError> {
    let caller_is_admin = caller.is_some_and(|c| c.role() == UserRole::Admin);

    let response = auth_service
        .register(request.into_inner(), caller_is_admin)
        .await?;

    Ok(ApiResponse::created(response))
}

pub async fn me(user_context: Authorized<AnyRole>) -> Result<HttpResponse, AppError> {
    let context = user_context.into_inner();

    Ok(ApiResponse::success(UserProfile::new(
        context.user,
        context.employee,
    )))
}

pub async fn change_password(
    auth_service: web::Data<AuthService>,
    user_context: Authorized<AnyRole>,
    request: web::Json<ChangePasswordInput>,
) -> Result<HttpResponse, AppError> {
    auth_service
        .change_password(&user_context.user, request.into_inner())
        .await?;

    Ok(ApiResponse::success_message("Password changed successfully"))
}
