use chrono::Utc;
use uuid::Uuid;

use crate::domain::category::{CategoryUpdate, NewCategory};
use crate::domain::types::{CategoryId, CategoryName, ImageFileName};
use crate::dto::categories::CategoryDto;
use crate::forms::FieldErrors;
use crate::forms::categories::{AddCategoryPayload, CategoryImage, UpdateCategoryPayload};
use crate::repository::{CategoryReader, CategoryWriter, RepositoryError};
use crate::storage::FileStorage;
use crate::storage::thumbnail::make_thumbnail;

use super::{ServiceError, ServiceResult};

const NAME_TAKEN: &str = "The name has already been taken.";

/// Original and thumbnail written for one upload.
struct StoredImage {
    original: ImageFileName,
    thumbnail: ImageFileName,
}

fn parse_id(id: i32) -> ServiceResult<CategoryId> {
    CategoryId::new(id).map_err(|_| ServiceError::NotFound)
}

fn name_taken() -> ServiceError {
    ServiceError::Validation(FieldErrors::single("name", NAME_TAKEN))
}

/// Fail when another category already uses `name`.
fn ensure_name_free<R>(
    repo: &R,
    name: &CategoryName,
    own_id: Option<CategoryId>,
) -> ServiceResult<()>
where
    R: CategoryReader,
{
    match repo.get_category_by_name(name) {
        Ok(Some(existing)) if Some(existing.id) != own_id => Err(name_taken()),
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Failed to look up category by name: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Write the original and its thumbnail under a freshly generated name.
///
/// The thumbnail is rendered before anything touches the storage, so an
/// undecodable upload leaves no files behind.
fn store_image<S>(image: &CategoryImage, storage: &S) -> ServiceResult<StoredImage>
where
    S: FileStorage,
{
    let thumbnail_bytes = match make_thumbnail(&image.bytes, image.kind) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Rejected category image: {e}");
            return Err(ServiceError::Validation(FieldErrors::single(
                "image",
                "The image must be an image.",
            )));
        }
    };

    let token = Uuid::new_v4().simple();
    let original = ImageFileName::new(format!("{token}.{}", image.extension)).map_err(|e| {
        log::error!("Generated an invalid image file name: {e}");
        ServiceError::Internal
    })?;
    let thumbnail = original.thumbnail();

    if let Err(e) = storage.save(&original, &image.bytes) {
        log::error!("Failed to store image {original}: {e}");
        return Err(ServiceError::Internal);
    }
    if let Err(e) = storage.save(&thumbnail, &thumbnail_bytes) {
        log::error!("Failed to store thumbnail {thumbnail}: {e}");
        remove_image(&original, storage);
        return Err(ServiceError::Internal);
    }

    Ok(StoredImage {
        original,
        thumbnail,
    })
}

/// Remove an original and its thumbnail. Missing files are fine; other
/// failures are logged and otherwise ignored.
fn remove_image<S>(original: &ImageFileName, storage: &S)
where
    S: FileStorage,
{
    for name in [original.clone(), original.thumbnail()] {
        if let Err(e) = storage.delete(&name) {
            log::error!("Failed to remove image {name}: {e}");
        }
    }
}

fn discard(stored: &StoredImage, storage: &impl FileStorage) {
    log::debug!("Discarding {} and {}", stored.original, stored.thumbnail);
    remove_image(&stored.original, storage);
}

/// Every category ordered by id.
pub fn list_categories<R>(repo: &R) -> ServiceResult<Vec<CategoryDto>>
where
    R: CategoryReader,
{
    match repo.list_categories() {
        Ok(categories) => Ok(categories.into_iter().map(CategoryDto::from).collect()),
        Err(e) => {
            log::error!("Failed to list categories: {e}");
            Err(ServiceError::Internal)
        }
    }
}

pub fn get_category<R>(id: i32, repo: &R) -> ServiceResult<CategoryDto>
where
    R: CategoryReader,
{
    let id = parse_id(id)?;
    match repo.get_category_by_id(id) {
        Ok(Some(category)) => Ok(category.into()),
        Ok(None) => Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get category: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Store the uploaded image with its thumbnail and insert the category.
///
/// If the row cannot be written the freshly stored files are removed again.
pub fn create_category<R, S>(
    payload: AddCategoryPayload,
    repo: &R,
    storage: &S,
) -> ServiceResult<CategoryDto>
where
    R: CategoryReader + CategoryWriter,
    S: FileStorage,
{
    ensure_name_free(repo, &payload.name, None)?;

    let stored = store_image(&payload.image, storage)?;

    let now = Utc::now().naive_utc();
    let category = NewCategory {
        name: payload.name,
        description: payload.description,
        image: stored.original.clone(),
        created_at: now,
        updated_at: now,
    };

    match repo.create_category(&category) {
        Ok(category) => {
            log::info!("Created category {} ({})", category.id, category.name);
            Ok(category.into())
        }
        Err(e) => {
            discard(&stored, storage);
            if e.is_unique_violation() {
                return Err(name_taken());
            }
            log::error!("Failed to create category: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Overwrite name and description, replacing the image when one was sent.
///
/// The old files are deleted only once the row points at the new ones.
pub fn update_category<R, S>(
    id: i32,
    payload: UpdateCategoryPayload,
    repo: &R,
    storage: &S,
) -> ServiceResult<CategoryDto>
where
    R: CategoryReader + CategoryWriter,
    S: FileStorage,
{
    let id = parse_id(id)?;
    let existing = match repo.get_category_by_id(id) {
        Ok(Some(category)) => category,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get category: {e}");
            return Err(ServiceError::Internal);
        }
    };

    ensure_name_free(repo, &payload.name, Some(id))?;

    let stored = match &payload.image {
        Some(image) => Some(store_image(image, storage)?),
        None => None,
    };

    let update = CategoryUpdate {
        name: payload.name,
        description: payload.description,
        image: stored.as_ref().map(|s| s.original.clone()),
        updated_at: Utc::now().naive_utc(),
    };

    let category = match repo.update_category(id, &update) {
        Ok(category) => category,
        Err(e) => {
            if let Some(stored) = &stored {
                discard(stored, storage);
            }
            return match e {
                RepositoryError::NotFound => Err(ServiceError::NotFound),
                e if e.is_unique_violation() => Err(name_taken()),
                e => {
                    log::error!("Failed to update category: {e}");
                    Err(ServiceError::Internal)
                }
            };
        }
    };

    if stored.is_some() {
        remove_image(&existing.image, storage);
    }

    Ok(category.into())
}

/// Delete the row, then its image files.
pub fn delete_category<R, S>(id: i32, repo: &R, storage: &S) -> ServiceResult<()>
where
    R: CategoryReader + CategoryWriter,
    S: FileStorage,
{
    let id = parse_id(id)?;
    let existing = match repo.get_category_by_id(id) {
        Ok(Some(category)) => category,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get category: {e}");
            return Err(ServiceError::Internal);
        }
    };

    match repo.delete_category(id) {
        Ok(0) => Err(ServiceError::NotFound),
        Ok(_) => {
            remove_image(&existing.image, storage);
            log::info!("Deleted category {id}");
            Ok(())
        }
        Err(e) => {
            log::error!("Failed to delete category: {e}");
            Err(ServiceError::Internal)
        }
    }
}
