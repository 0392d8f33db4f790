use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::error::ApiError;
use crate::app::Storefront;

#[derive(Debug, Deserialize)]
pub struct CancelQuery {
    pub reason: Option<String>,
}

pub async fn list(app: web::Data<Storefront>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(app.shipping.list().await?))
}

pub async fn get(app: web::Data<Storefront>, reference: web::Path<String>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(app.shipping.get(&reference).await?))
}

pub async fn cancel(
    app: web::Data<Storefront>,
    reference: web::Path<String>,
    query: web::Query<CancelQuery>,
) -> Result<HttpResponse, ApiError> {
    app.shipping.cancel(&reference, query.into_inner().reason).await?;
    Ok(HttpResponse::Accepted().finish())
}
