use chrono::Utc;

use crate::domain::product::{NewProduct, Product, ProductImageSync, ProductUpdate};
use crate::domain::types::{CategoryId, ProductId, ProductImageId};
use crate::dto::products::ProductDto;
use crate::forms::FieldErrors;
use crate::forms::products::{AddProductPayload, CATEGORY_INVALID, UpdateProductPayload};
use crate::repository::{
    CategoryReader, ProductReader, ProductWriter, RepositoryError, RepositoryResult,
};

use super::{ServiceError, ServiceResult};

fn parse_id(id: i32) -> ServiceResult<ProductId> {
    ProductId::new(id).map_err(|_| ServiceError::NotFound)
}

fn category_invalid() -> FieldErrors {
    FieldErrors::single("category_id", CATEGORY_INVALID)
}

fn is_foreign_key_violation(err: &RepositoryError) -> bool {
    matches!(
        err,
        RepositoryError::Database(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::ForeignKeyViolation,
            _
        ))
    )
}

/// Record an error on `category_id` unless the category exists.
fn check_category<R>(repo: &R, id: CategoryId, errors: &mut FieldErrors) -> ServiceResult<()>
where
    R: CategoryReader,
{
    match repo.get_category_by_id(id) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            errors.add("category_id", CATEGORY_INVALID);
            Ok(())
        }
        Err(e) => {
            log::error!("Failed to get category: {e}");
            Err(ServiceError::Internal)
        }
    }
}

fn load_product<R>(repo: &R, id: ProductId) -> ServiceResult<Product>
where
    R: ProductReader,
{
    match repo.get_product_by_id(id) {
        Ok(Some(product)) => Ok(product),
        Ok(None) => Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get product: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Map a failed product write, treating a vanished category as a
/// validation failure.
fn write_failed(action: &str, err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::NotFound => ServiceError::NotFound,
        e if is_foreign_key_violation(&e) => ServiceError::Validation(category_invalid()),
        e => {
            log::error!("Failed to {action} product: {e}");
            ServiceError::Internal
        }
    }
}

/// Every product ordered by id, each with its images attached.
pub fn list_products<R>(repo: &R) -> ServiceResult<Vec<ProductDto>>
where
    R: ProductReader,
{
    match repo.list_products() {
        Ok(products) => Ok(products.into_iter().map(ProductDto::from).collect()),
        Err(e) => {
            log::error!("Failed to list products: {e}");
            Err(ServiceError::Internal)
        }
    }
}

pub fn get_product<R>(id: i32, repo: &R) -> ServiceResult<ProductDto>
where
    R: ProductReader,
{
    let id = parse_id(id)?;
    load_product(repo, id).map(ProductDto::from)
}

/// Insert a product together with all submitted images.
pub fn create_product<R>(payload: AddProductPayload, repo: &R) -> ServiceResult<ProductDto>
where
    R: CategoryReader + ProductWriter,
{
    let mut errors = FieldErrors::new();
    check_category(repo, payload.category_id, &mut errors)?;
    errors.into_result()?;

    let now = Utc::now().naive_utc();
    let product = NewProduct {
        category_id: payload.category_id,
        name: payload.name,
        price: payload.price,
        description: payload.description,
        created_at: now,
        updated_at: now,
    };

    match repo.create_product(&product, &payload.images) {
        Ok(product) => {
            log::info!(
                "Created product {} with {} images",
                product.id,
                product.images.len()
            );
            Ok(product.into())
        }
        Err(e) => Err(write_failed("create", e)),
    }
}

/// Overwrite a product and, when `images` was sent, make its image rows
/// match the submitted list exactly.
///
/// Submitted image ids must belong to this product.
pub fn update_product<R>(
    id: i32,
    payload: UpdateProductPayload,
    repo: &R,
) -> ServiceResult<ProductDto>
where
    R: CategoryReader + ProductReader + ProductWriter,
{
    let id = parse_id(id)?;
    let product = load_product(repo, id)?;

    let mut errors = FieldErrors::new();
    check_category(repo, payload.category_id, &mut errors)?;

    if let Some(images) = &payload.images {
        for (index, image_id) in images
            .iter()
            .enumerate()
            .filter_map(|(index, input)| input.id.map(|image_id| (index, image_id)))
        {
            let owned = match owns_image(repo, &product, image_id) {
                Ok(owned) => owned,
                Err(e) => {
                    log::error!("Failed to get product image: {e}");
                    return Err(ServiceError::Internal);
                }
            };
            if !owned {
                errors.add(
                    format!("images.{index}.id"),
                    format!("The selected images.{index}.id is invalid."),
                );
            }
        }
    }
    errors.into_result()?;

    let update = ProductUpdate {
        category_id: payload.category_id,
        name: payload.name,
        price: payload.price,
        description: payload.description,
        updated_at: Utc::now().naive_utc(),
    };
    let sync = payload.images.map(ProductImageSync::from_inputs);

    match repo.update_product(id, &update, sync.as_ref()) {
        Ok(product) => Ok(product.into()),
        Err(e) => Err(write_failed("update", e)),
    }
}

/// Whether `image_id` names one of `product`'s images.
fn owns_image<R>(repo: &R, product: &Product, image_id: ProductImageId) -> RepositoryResult<bool>
where
    R: ProductReader,
{
    if product.images.iter().any(|image| image.id == image_id) {
        return Ok(true);
    }
    let image = repo.get_product_image_by_id(image_id)?;
    if let Some(image) = &image {
        log::warn!(
            "Image {image_id} belongs to product {}, not {}",
            image.product_id,
            product.id
        );
    }
    Ok(image.is_some_and(|image| image.product_id == product.id))
}

/// Delete a product; its images go with it.
pub fn delete_product<R>(id: i32, repo: &R) -> ServiceResult<()>
where
    R: ProductWriter,
{
    let id = parse_id(id)?;
    match repo.delete_product(id) {
        Ok(0) => Err(ServiceError::NotFound),
        Ok(_) => {
            log::info!("Deleted product {id}");
            Ok(())
        }
        Err(e) => {
            log::error!("Failed to delete product: {e}");
            Err(ServiceError::Internal)
        }
    }
}
