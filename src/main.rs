use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use mockable::DefaultClock;

use attendance::config::Config;
use attendance::db::init_db;
use attendance::docs::ApiDoc;
use attendance::routes::{self, RateLimits};
use attendance::service::{AttendanceService, CsvRenderer, ReportBuilder};
use attendance::store::{MySqlAttendanceStore, MySqlUserDirectory};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let store = Arc::new(MySqlAttendanceStore::new(pool.clone()));
    let users = Arc::new(MySqlUserDirectory::new(pool));
    let service = Data::new(AttendanceService::new(
        store.clone(),
        users,
        Arc::new(DefaultClock),
    ));
    let reports = Data::new(ReportBuilder::new(
        store,
        Arc::new(CsvRenderer),
        config.report_locale,
    ));
    let limits = RateLimits::from_config(&config)?;
    let api_prefix = config.api_prefix.clone();
    let allowed_origins = config.cors_allowed_origins.clone();

    info!(
        addr = %config.server_addr,
        locale = %config.report_locale,
        origins = ?config.cors_allowed_origins,
        "Listening"
    );

    HttpServer::new(move || {
        let api_prefix = api_prefix.clone();
        let limits = limits.clone();
        App::new()
            .wrap(routes::cors(&allowed_origins))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(reports.clone())
            .service(index)
            .configure(move |cfg| routes::configure(cfg, &api_prefix, &limits))
    })
    .bind(&config.server_addr)?
    .run()
    .await?;

    Ok(())
}
