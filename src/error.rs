use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::database::models::{Attendance, LeaveRequest, LeaveStatus};
use crate::handlers::shared::ApiResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Start date must be on or before end date")]
    InvalidDateRange,

    #[error("Already checked in today")]
    AlreadyCheckedIn(Box<Attendance>),

    #[error("Already checked out today")]
    AlreadyCheckedOut(Box<Attendance>),

    #[error("No check-in recorded for today")]
    NoCheckInYet,

    #[error("Overlaps an existing pending or approved leave request")]
    OverlappingRequest(Box<LeaveRequest>),

    #[error("Leave request has already been reviewed ({0})")]
    AlreadyReviewed(LeaveStatus),

    #[error("Approved leave requests can only be cancelled by HR or an administrator")]
    CannotCancelApproved,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }

    /// Stable machine-readable error kind sent to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } | AppError::BadRequest(_) => "VALIDATION_ERROR",
            AppError::InvalidDateRange => "INVALID_DATE_RANGE",
            AppError::AlreadyCheckedIn(_) => "ALREADY_CHECKED_IN",
            AppError::AlreadyCheckedOut(_) => "ALREADY_CHECKED_OUT",
            AppError::NoCheckInYet => "NO_CHECK_IN_YET",
            AppError::OverlappingRequest(_) => "OVERLAPPING_REQUEST",
            AppError::AlreadyReviewed(_) => "ALREADY_REVIEWED",
            AppError::CannotCancelApproved => "CANNOT_CANCEL_APPROVED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }

    /// The conflicting record, for errors that carry one.
    fn payload(&self) -> Option<serde_json::Value> {
        match self {
            AppError::AlreadyCheckedIn(record) | AppError::AlreadyCheckedOut(record) => {
                serde_json::to_value(record).ok()
            }
            AppError::OverlappingRequest(request) => serde_json::to_value(request).ok(),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest(_) | AppError::InvalidDateRange => {
                StatusCode::BAD_REQUEST
            }
            AppError::AlreadyCheckedIn(_)
            | AppError::AlreadyCheckedOut(_)
            | AppError::NoCheckInYet
            | AppError::OverlappingRequest(_)
            | AppError::AlreadyReviewed(_)
            | AppError::CannotCancelApproved
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        if status_code.is_server_error() {
            log::error!("Request failed with status {}: {}", status_code, error_message);
        } else {
            log::warn!("Request rejected with status {}: {}", status_code, error_message);
        }

        let response_body = ApiResponse::error(self.kind(), &error_message, self.payload());

        HttpResponse::build(status_code).json(response_body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Record already exists".to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::Conflict("Referenced record does not exist".to_string())
            }
            _ => {
                log::error!("Database error: {}", error);
                AppError::DatabaseError(error)
            }
        }
    }
}
