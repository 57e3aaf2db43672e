use actix_web::web;

pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod employees;
pub mod leaves;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(auth::configure)
            .configure(employees::configure)
            .configure(attendance::configure)
            .configure(leaves::configure)
            .configure(dashboard::configure),
    );
}
