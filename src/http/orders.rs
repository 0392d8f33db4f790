use actix_web::{web, HttpRequest, HttpResponse};

use super::error::ApiError;
use crate::app::Storefront;
use crate::domain::orders::PurchaseOrder;

pub async fn list(app: web::Data<Storefront>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(app.orders.list().await?))
}

pub async fn get(app: web::Data<Storefront>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(app.orders.get(&id).await?))
}

/// 202 Accepted: shipping may still be in flight on the queued transport
pub async fn create(
    app: web::Data<Storefront>,
    req: HttpRequest,
    body: web::Json<PurchaseOrder>,
) -> Result<HttpResponse, ApiError> {
    let accepted = app.orders.create(body.into_inner()).await?;
    Ok(HttpResponse::Accepted()
        .insert_header(("Location", format!("{}/{}", req.path(), accepted.order.id)))
        .insert_header(("X-Correlation-Id", accepted.correlation_id.to_string()))
        .json(accepted.order))
}
