use actix_web::{web, HttpRequest, HttpResponse};

use super::error::ApiError;
use crate::app::Storefront;
use crate::domain::books::{Book, PatchOperation};

pub async fn list(app: web::Data<Storefront>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(app.books.list().await?))
}

pub async fn get(app: web::Data<Storefront>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(app.books.get(&id).await?))
}

pub async fn create(
    app: web::Data<Storefront>,
    req: HttpRequest,
    body: web::Json<Book>,
) -> Result<HttpResponse, ApiError> {
    let book = app.books.create(body.into_inner()).await?;
    Ok(HttpResponse::Created()
        .insert_header(("Location", format!("{}/{}", req.path(), book.id)))
        .json(book))
}

pub async fn put(
    app: web::Data<Storefront>,
    id: web::Path<String>,
    body: web::Json<Book>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(app.books.put(&id, body.into_inner()).await?))
}

pub async fn delete(app: web::Data<Storefront>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(app.books.delete(&id).await?))
}

/// `null` deserializes to `None` and is rejected by the service
pub async fn patch(
    app: web::Data<Storefront>,
    id: web::Path<String>,
    body: web::Json<Option<Vec<PatchOperation>>>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(app.books.patch(&id, body.into_inner()).await?))
}
