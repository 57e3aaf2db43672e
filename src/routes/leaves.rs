use actix_web::web;

use crate::handlers::leaves;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Literal segments must be registered ahead of `/{id}`
    cfg.service(
        web::scope("/leaves")
            .route("", web::post().to(leaves::create_leave_request))
            .route("", web::get().to(leaves::list_leave_requests))
            .route("/my-requests", web::get().to(leaves::my_leave_requests))
            .route("/stats/{employee_id}", web::get().to(leaves::leave_stats))
            .route("/{id}", web::get().to(leaves::get_leave_request))
            .route("/{id}", web::delete().to(leaves::cancel_leave_request))
            .route("/{id}/review", web::put().to(leaves::review_leave_request)),
    );
}
