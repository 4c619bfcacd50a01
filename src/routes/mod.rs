//! HTTP handlers. Each one is a thin wrapper turning a request into a
//! service call and the service result into a JSON response.

use actix_multipart::form::MultipartFormConfig;
use actix_web::error::InternalError;
use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::services::ServiceError;

pub mod auth;
pub mod categories;
pub mod products;

/// Register every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(categories::list_categories)
        .service(categories::get_category)
        .service(categories::create_category)
        .service(categories::update_category)
        .service(categories::delete_category)
        .service(products::list_products)
        .service(products::get_product)
        .service(products::create_product)
        .service(products::update_product)
        .service(products::delete_product);
}

/// Render a service failure. `entity` names the resource in 404 bodies.
pub fn error_response(err: ServiceError, entity: &str) -> HttpResponse {
    match err {
        ServiceError::NotFound => {
            HttpResponse::NotFound().json(json!({ "message": format!("{entity} not found") }))
        }
        ServiceError::Unauthorized => {
            HttpResponse::Unauthorized().json(json!({ "message": "Unauthenticated." }))
        }
        ServiceError::Validation(errors) => HttpResponse::BadRequest().json(errors),
        ServiceError::Internal => HttpResponse::InternalServerError().finish(),
    }
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "message": message }))
}

/// JSON extractor settings: malformed bodies become `{"message": ..}` 400s.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = bad_request(err.to_string());
        InternalError::from_response(err, response).into()
    })
}

/// Multipart extractor settings sized for one image upload of at most
/// `max_image_bytes`.
pub fn multipart_config(max_image_bytes: u64) -> MultipartFormConfig {
    // Text fields are small; leave headroom above the image itself.
    let limit = usize::try_from(max_image_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .max(1024 * 1024);
    MultipartFormConfig::default()
        .total_limit(limit)
        .memory_limit(1024 * 1024)
        .error_handler(|err, _req| {
            let response = bad_request(err.to_string());
            InternalError::from_response(err, response).into()
        })
}
