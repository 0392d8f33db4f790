use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::error::ApiError;
use crate::actors::{DeadLetterReport, GetDeadLetters};
use crate::app::Storefront;

#[derive(Debug, Deserialize)]
pub struct DeadLetterQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

pub async fn metrics(app: web::Data<Storefront>) -> Result<HttpResponse, ApiError> {
    let body = app.metrics.render().map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().content_type("text/plain; version=0.0.4").body(body))
}

pub async fn health(app: web::Data<Storefront>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "storefront",
        "transport": app.transport,
    }))
}

/// Empty report on the in-process transport, which never dead-letters
pub async fn dead_letters(
    app: web::Data<Storefront>,
    query: web::Query<DeadLetterQuery>,
) -> Result<HttpResponse, ApiError> {
    let Some(actor) = &app.dead_letters else {
        return Ok(HttpResponse::Ok().json(DeadLetterReport::default()));
    };

    let report = actor
        .ask(GetDeadLetters { limit: query.limit })
        .send()
        .await
        .map_err(|e| ApiError::Internal(format!("dead-letter actor unavailable: {:?}", e)))?;

    Ok(HttpResponse::Ok().json(report))
}
