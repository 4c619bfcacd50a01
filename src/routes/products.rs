use actix_web::{HttpResponse, Responder, delete, get, post, web};

use crate::forms::products::ProductForm;
use crate::repository::DieselRepository;
use crate::routes::auth::ApiAuth;
use crate::routes::error_response;
use crate::services::ServiceError;
use crate::services::products::{
    create_product as create_product_service, delete_product as delete_product_service,
    get_product as get_product_service, list_products as list_products_service,
    update_product as update_product_service,
};

const ENTITY: &str = "Product";

#[get("/product")]
pub async fn list_products(repo: web::Data<DieselRepository>) -> impl Responder {
    match list_products_service(repo.get_ref()) {
        Ok(products) => HttpResponse::Ok().json(products),
        Err(err) => error_response(err, ENTITY),
    }
}

#[get("/product/{id}")]
pub async fn get_product(id: web::Path<i32>, repo: web::Data<DieselRepository>) -> impl Responder {
    match get_product_service(id.into_inner(), repo.get_ref()) {
        Ok(product) => HttpResponse::Ok().json(product),
        Err(err) => error_response(err, ENTITY),
    }
}

#[post("/product")]
pub async fn create_product(
    _auth: ApiAuth,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<ProductForm>,
) -> impl Responder {
    let payload = match form.into_add_payload() {
        Ok(payload) => payload,
        Err(errors) => return error_response(ServiceError::Validation(errors), ENTITY),
    };

    match create_product_service(payload, repo.get_ref()) {
        Ok(product) => HttpResponse::Ok().json(product),
        Err(err) => error_response(err, ENTITY),
    }
}

#[post("/product/edit/{id}")]
pub async fn update_product(
    _auth: ApiAuth,
    id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<ProductForm>,
) -> impl Responder {
    let id = id.into_inner();
    // An unknown id is reported before the body is validated.
    if let Err(err) = get_product_service(id, repo.get_ref()) {
        return error_response(err, ENTITY);
    }

    let payload = match form.into_update_payload() {
        Ok(payload) => payload,
        Err(errors) => return error_response(ServiceError::Validation(errors), ENTITY),
    };

    match update_product_service(id, payload, repo.get_ref()) {
        Ok(product) => HttpResponse::Ok().json(product),
        Err(err) => error_response(err, ENTITY),
    }
}

#[delete("/product/{id}")]
pub async fn delete_product(
    _auth: ApiAuth,
    id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match delete_product_service(id.into_inner(), repo.get_ref()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response(err, ENTITY),
    }
}
