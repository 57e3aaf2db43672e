use actix_web::web;

use crate::handlers::dashboard;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dashboard")
            .route("/admin", web::get().to(dashboard::admin_dashboard))
            .route("/employee", web::get().to(dashboard::employee_dashboard)),
    );
}
