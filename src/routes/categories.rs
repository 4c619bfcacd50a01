use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, Responder, delete, get, post, web};

use crate::forms::categories::{CategoryForm, CategoryMultipartForm};
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::auth::ApiAuth;
use crate::routes::error_response;
use crate::services::ServiceError;
use crate::services::categories::{
    create_category as create_category_service, delete_category as delete_category_service,
    get_category as get_category_service, list_categories as list_categories_service,
    update_category as update_category_service,
};
use crate::storage::LocalFileStorage;

const ENTITY: &str = "Category";

fn read_form(form: CategoryMultipartForm) -> Result<CategoryForm, HttpResponse> {
    CategoryForm::from_multipart(form).map_err(|e| {
        log::error!("Failed to read uploaded category image: {e}");
        HttpResponse::InternalServerError().finish()
    })
}

#[get("/category")]
pub async fn list_categories(repo: web::Data<DieselRepository>) -> impl Responder {
    match list_categories_service(repo.get_ref()) {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(err) => error_response(err, ENTITY),
    }
}

#[get("/category/{id}")]
pub async fn get_category(
    id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match get_category_service(id.into_inner(), repo.get_ref()) {
        Ok(category) => HttpResponse::Ok().json(category),
        Err(err) => error_response(err, ENTITY),
    }
}

#[post("/category")]
pub async fn create_category(
    _auth: ApiAuth,
    repo: web::Data<DieselRepository>,
    storage: web::Data<LocalFileStorage>,
    server_config: web::Data<ServerConfig>,
    MultipartForm(form): MultipartForm<CategoryMultipartForm>,
) -> impl Responder {
    let form = match read_form(form) {
        Ok(form) => form,
        Err(response) => return response,
    };
    let payload = match form.into_add_payload(server_config.max_image_bytes()) {
        Ok(payload) => payload,
        Err(errors) => return error_response(ServiceError::Validation(errors), ENTITY),
    };

    match create_category_service(payload, repo.get_ref(), storage.get_ref()) {
        Ok(category) => HttpResponse::Ok().json(category),
        Err(err) => error_response(err, ENTITY),
    }
}

#[post("/category/edit/{id}")]
pub async fn update_category(
    _auth: ApiAuth,
    id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    storage: web::Data<LocalFileStorage>,
    server_config: web::Data<ServerConfig>,
    MultipartForm(form): MultipartForm<CategoryMultipartForm>,
) -> impl Responder {
    let id = id.into_inner();
    // An unknown id is reported before the body is validated.
    if let Err(err) = get_category_service(id, repo.get_ref()) {
        return error_response(err, ENTITY);
    }

    let form = match read_form(form) {
        Ok(form) => form,
        Err(response) => return response,
    };
    let payload = match form.into_update_payload(server_config.max_image_bytes()) {
        Ok(payload) => payload,
        Err(errors) => return error_response(ServiceError::Validation(errors), ENTITY),
    };

    match update_category_service(id, payload, repo.get_ref(), storage.get_ref()) {
        Ok(category) => HttpResponse::Ok().json(category),
        Err(err) => error_response(err, ENTITY),
    }
}

#[delete("/category/{id}")]
pub async fn delete_category(
    _auth: ApiAuth,
    id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    storage: web::Data<LocalFileStorage>,
) -> impl Responder {
    match delete_category_service(id.into_inner(), repo.get_ref(), storage.get_ref()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response(err, ENTITY),
    }
}
