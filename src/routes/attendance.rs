use actix_web::web;

use crate::handlers::attendance;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attendance")
            .route("", web::get().to(attendance::list_attendances))
            .route("/check-in", web::post().to(attendance::check_in))
            .route("/check-out", web::post().to(attendance::check_out))
            .route("/today", web::get().to(attendance::today))
            .route("/manual", web::post().to(attendance::manual_entry))
            .route(
                "/employee/{id}",
                web::get().to(attendance::employee_history),
            )
            .route("/{id}", web::delete().to(attendance::delete_attendance)),
    );
}
