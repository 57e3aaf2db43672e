use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger};
use anyhow::Result;

use hrdesk::database::init_database;
use hrdesk::middleware::RequestIdMiddleware;
use hrdesk::{AppState, Config, routes};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("hrdesk API v1")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting hrdesk API server...");

    let config = Config::from_env()?;
    log::info!(
        "Configuration loaded (environment: {}, work hours: {:?})",
        config.environment,
        config.work_hours_policy
    );
    if config.is_production() && std::env::var("JWT_SECRET").is_err() {
        log::warn!("JWT_SECRET is not set; using the built-in development secret");
    }

    let pool = init_database(&config.database_url).await?;
    log::info!("Database initialized");

    let state = AppState::new(pool, config.clone());

    state.auth_service.ensure_bootstrap_admin().await?;

    let server_address = config.server_address();
    let client_base_url = config.client_base_url.clone();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .configure(|cfg| state.configure(cfg))
            .wrap(
                Cors::default()
                    .allowed_origin(&client_base_url)
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Correlation-ID",
                    ])
                    .max_age(3600),
            )
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T correlation_id=%{x-correlation-id}o"#,
            ))
            .service(hello)
            .service(health)
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
