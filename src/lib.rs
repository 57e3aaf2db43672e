use actix_web::web;
use sqlx::SqlitePool;

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;
pub use services::{ActivityLogger, AuthService};

use database::repositories::{
    ActivityRepository, AttendanceRepository, EmployeeRepository, LeaveRepository,
    StatsRepository, UserRepository,
};
use error::AppError;

/// Shared application data, built once per process and cloned into each worker.
#[derive(Clone)]
pub struct AppState {
    pub config: web::Data<Config>,
    pub auth_service: web::Data<AuthService>,
    pub activity_logger: web::Data<ActivityLogger>,
    pub user_repository: web::Data<UserRepository>,
    pub employee_repository: web::Data<EmployeeRepository>,
    pub attendance_repository: web::Data<AttendanceRepository>,
    pub leave_repository: web::Data<LeaveRepository>,
    pub stats_repository: web::Data<StatsRepository>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let user_repository = UserRepository::new(pool.clone());
        let employee_repository = EmployeeRepository::new(pool.clone());
        let attendance_repository =
            AttendanceRepository::new(pool.clone(), config.work_hours_policy);
        let leave_repository = LeaveRepository::new(pool.clone());
        let stats_repository = StatsRepository::new(pool.clone());
        let activity_logger = ActivityLogger::new(ActivityRepository::new(pool));
        let auth_service = AuthService::new(
            config.clone(),
            user_repository.clone(),
            employee_repository.clone(),
        );

        Self {
            config: web::Data::new(config),
            auth_service: web::Data::new(auth_service),
            activity_logger: web::Data::new(activity_logger),
            user_repository: web::Data::new(user_repository),
            employee_repository: web::Data::new(employee_repository),
            attendance_repository: web::Data::new(attendance_repository),
            leave_repository: web::Data::new(leave_repository),
            stats_repository: web::Data::new(stats_repository),
        }
    }

    /// Registers every repository and service as app data, plus extractor
    /// configs that answer malformed input with the JSON error envelope.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
            AppError::validation("body", err.to_string()).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            AppError::validation("query", err.to_string()).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            AppError::validation("path", err.to_string()).into()
        }))
        .app_data(self.config.clone())
            .app_data(self.auth_service.clone())
            .app_data(self.activity_logger.clone())
            .app_data(self.user_repository.clone())
            .app_data(self.employee_repository.clone())
            .app_data(self.attendance_repository.clone())
            .app_data(self.leave_repository.clone())
            .app_data(self.stats_repository.clone());
    }
}
