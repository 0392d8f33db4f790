// ============================================================================
// HTTP API (actix-web)
// ============================================================================
//
//   /books          catalogue CRUD + JSON Patch
//   /orders         place and read purchase orders
//   /shipping       read and cancel shipping manifests
//   /metrics        Prometheus text format
//   /health
//   /dead-letters   queued transport failures
//
// ============================================================================

mod books;
mod error;
mod ops;
mod orders;
mod shipping;

use actix_web::{web, App, HttpServer};

use crate::app::Storefront;
use crate::config::HttpSettings;

pub use error::ApiError;

/// Register every route. Expects `web::Data<Storefront>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default().error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/books")
            .route("", web::get().to(books::list))
            .route("", web::post().to(books::create))
            .route("/{id}", web::get().to(books::get))
            .route("/{id}", web::put().to(books::put))
            .route("/{id}", web::delete().to(books::delete))
            .route("/{id}", web::patch().to(books::patch)),
    )
    .service(
        web::scope("/orders")
            .route("", web::get().to(orders::list))
            .route("", web::post().to(orders::create))
            .route("/{id}", web::get().to(orders::get)),
    )
    .service(
        web::scope("/shipping")
            .route("", web::get().to(shipping::list))
            .route("/{reference}", web::get().to(shipping::get))
            .route("/{reference}", web::delete().to(shipping::cancel)),
    )
    .route("/metrics", web::get().to(ops::metrics))
    .route("/health", web::get().to(ops::health))
    .route("/dead-letters", web::get().to(ops::dead_letters));
}

/// Serve until shutdown. Consumes the storefront so the bus is dropped
/// once the server stops.
pub async fn serve(app: Storefront, settings: &HttpSettings) -> std::io::Result<()> {
    tracing::info!("🌐 Starting HTTP server on http://{}:{}", settings.host, settings.port);

    let data = web::Data::new(app);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind((settings.host.as_str(), settings.port))?
        .run()
        .await
}
