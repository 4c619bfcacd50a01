use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use validator::Validate;

use crate::domain::types::{CategoryDescription, CategoryName};
use crate::forms::{FieldErrors, non_blank};
use crate::storage::thumbnail::{ALLOWED_EXTENSIONS, ImageKind, detect};

const NAME_REQUIRED: &str = "Вкажіть назву категорії";
const DESCRIPTION_REQUIRED: &str = "Вкажіть опис категорії";
const IMAGE_REQUIRED: &str = "Вкажіть фото категорії";
const IMAGE_NOT_AN_IMAGE: &str = "The image must be an image.";

/// Raw multipart body of the category create/update endpoints.
#[derive(MultipartForm)]
pub struct CategoryMultipartForm {
    pub name: Option<Text<String>>,
    pub description: Option<Text<String>>,
    #[multipart(limit = "16MB")]
    pub image: Option<TempFile>,
}

/// File received in a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    /// Name the client gave the file.
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Read an uploaded temp file. Browsers send an empty, unnamed part when
    /// no file was picked; that counts as no upload.
    pub fn from_temp_file(file: TempFile) -> std::io::Result<Option<Self>> {
        let file_name = file.file_name.filter(|name| !name.trim().is_empty());
        if file.size == 0 && file_name.is_none() {
            return Ok(None);
        }
        let bytes = std::fs::read(file.file.path())?;
        Ok(Some(Self { file_name, bytes }))
    }
}

/// Category fields after multipart decoding.
#[derive(Debug, Default, Validate)]
pub struct CategoryForm {
    #[validate(
        required(message = "Вкажіть назву категорії"),
        length(max = 255, message = "The name must not be greater than 255 characters.")
    )]
    pub name: Option<String>,
    #[validate(required(message = "Вкажіть опис категорії"))]
    pub description: Option<String>,
    pub image: Option<UploadedImage>,
}

impl CategoryForm {
    /// Read the multipart body, pulling the uploaded file into memory.
    pub fn from_multipart(form: CategoryMultipartForm) -> std::io::Result<Self> {
        let image = match form.image {
            Some(file) => UploadedImage::from_temp_file(file)?,
            None => None,
        };
        Ok(Self {
            name: non_blank(form.name.map(Text::into_inner)),
            description: non_blank(form.description.map(Text::into_inner)),
            image,
        })
    }
}

/// Upload accepted as a category image.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryImage {
    /// Lower-cased client extension, used for the stored file names.
    pub extension: String,
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

/// Validated body of `POST /category`.
#[derive(Debug, Clone, PartialEq)]
pub struct AddCategoryPayload {
    pub name: CategoryName,
    pub description: CategoryDescription,
    pub image: CategoryImage,
}

/// Validated body of `POST /category/edit/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCategoryPayload {
    pub name: CategoryName,
    pub description: CategoryDescription,
    pub image: Option<CategoryImage>,
}

fn validate_image(
    upload: UploadedImage,
    max_bytes: u64,
    errors: &mut FieldErrors,
) -> Option<CategoryImage> {
    let extension = upload
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));

    let Some(extension) = extension else {
        errors.add(
            "image",
            format!(
                "The image must be a file of type: {}.",
                ALLOWED_EXTENSIONS.join(", ")
            ),
        );
        return None;
    };

    if upload.bytes.len() as u64 > max_bytes {
        errors.add(
            "image",
            format!(
                "The image must not be greater than {} kilobytes.",
                max_bytes / 1024
            ),
        );
        return None;
    }

    let Some(kind) = detect(&upload.bytes, &extension) else {
        errors.add("image", IMAGE_NOT_AN_IMAGE);
        return None;
    };

    // Stored names carry the extension of the detected format.
    let extension = match kind {
        ImageKind::Raster(format) if !format.extensions_str().contains(&extension.as_str()) => {
            match format.extensions_str().first() {
                Some(canonical) => canonical.to_string(),
                None => extension,
            }
        }
        _ => extension,
    };

    Some(CategoryImage {
        extension,
        kind,
        bytes: upload.bytes,
    })
}

/// Shared rules of create and update; the image is checked when present.
fn validate_fields(
    form: CategoryForm,
    max_bytes: u64,
) -> Result<(CategoryName, CategoryDescription, Option<CategoryImage>), FieldErrors> {
    let mut errors = match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => FieldErrors::from(e),
    };

    let name = form.name.and_then(|name| CategoryName::new(name).ok());
    if name.is_none() && !errors.contains("name") {
        errors.add("name", NAME_REQUIRED);
    }
    let description = form
        .description
        .and_then(|description| CategoryDescription::new(description).ok());
    if description.is_none() && !errors.contains("description") {
        errors.add("description", DESCRIPTION_REQUIRED);
    }

    let image = form
        .image
        .and_then(|upload| validate_image(upload, max_bytes, &mut errors));

    match (name, description) {
        (Some(name), Some(description)) if errors.is_empty() => Ok((name, description, image)),
        _ => Err(errors),
    }
}

impl CategoryForm {
    /// Validate a create request; the image is required.
    pub fn into_add_payload(self, max_bytes: u64) -> Result<AddCategoryPayload, FieldErrors> {
        let missing_image = self.image.is_none();
        match validate_fields(self, max_bytes) {
            Ok((name, description, Some(image))) => Ok(AddCategoryPayload {
                name,
                description,
                image,
            }),
            Ok(_) => Err(FieldErrors::single("image", IMAGE_REQUIRED)),
            Err(mut errors) => {
                if missing_image {
                    errors.add("image", IMAGE_REQUIRED);
                }
                Err(errors)
            }
        }
    }

    /// Validate an update request; the image may be omitted.
    pub fn into_update_payload(
        self,
        max_bytes: u64,
    ) -> Result<UpdateCategoryPayload, FieldErrors> {
        let (name, description, image) = validate_fields(self, max_bytes)?;
        Ok(UpdateCategoryPayload {
            name,
            description,
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const MAX: u64 = 2048 * 1024;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 2, image::Rgb([1, 2, 3]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn form(name: Option<&str>, description: Option<&str>, file: Option<&str>) -> CategoryForm {
        CategoryForm {
            name: name.map(str::to_string),
            description: description.map(str::to_string),
            image: file.map(|file_name| UploadedImage {
                file_name: Some(file_name.to_string()),
                bytes: png_bytes(),
            }),
        }
    }

    #[test]
    fn add_payload_accepts_complete_form() {
        let payload = form(Some(" Shoes "), Some("All shoes"), Some("photo.PNG"))
            .into_add_payload(MAX)
            .unwrap();

        assert_eq!(payload.name.as_str(), "Shoes");
        assert_eq!(payload.image.extension, "png");
        assert_eq!(
            payload.image.kind,
            ImageKind::Raster(image::ImageFormat::Png)
        );
    }

    #[test]
    fn add_payload_reports_every_missing_field() {
        let errors = form(None, None, None).into_add_payload(MAX).unwrap_err();

        assert_eq!(errors.get("name").unwrap(), [NAME_REQUIRED.to_string()]);
        assert_eq!(
            errors.get("description").unwrap(),
            [DESCRIPTION_REQUIRED.to_string()]
        );
        assert_eq!(errors.get("image").unwrap(), [IMAGE_REQUIRED.to_string()]);
    }

    #[test]
    fn rejects_disallowed_extension() {
        let errors = form(Some("a"), Some("b"), Some("doc.bmp"))
            .into_add_payload(MAX)
            .unwrap_err();

        assert!(errors.get("image").unwrap()[0].contains("jpg, jpeg, png, gif, svg"));
    }

    #[test]
    fn rejects_oversized_image() {
        let errors = form(Some("a"), Some("b"), Some("a.png"))
            .into_add_payload(8)
            .unwrap_err();

        assert!(errors.get("image").unwrap()[0].contains("greater than"));
    }

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        let mut form = form(Some("a"), Some("b"), Some("a.png"));
        if let Some(image) = form.image.as_mut() {
            image.bytes = b"not an image".to_vec();
        }

        let errors = form.into_add_payload(MAX).unwrap_err();
        assert_eq!(errors.get("image").unwrap(), [IMAGE_NOT_AN_IMAGE.to_string()]);
    }

    #[test]
    fn extension_follows_detected_format() {
        let payload = form(Some("a"), Some("b"), Some("a.jpg"))
            .into_add_payload(MAX)
            .unwrap();

        assert_eq!(payload.image.extension, "png");
        assert_eq!(
            payload.image.kind,
            ImageKind::Raster(image::ImageFormat::Png)
        );
    }

    #[test]
    fn update_payload_allows_missing_image() {
        let payload = form(Some("a"), Some("b"), None)
            .into_update_payload(MAX)
            .unwrap();
        assert!(payload.image.is_none());
    }

    #[test]
    fn update_payload_still_requires_name() {
        let errors = form(None, Some("b"), None)
            .into_update_payload(MAX)
            .unwrap_err();
        assert!(errors.contains("name"));
        assert!(!errors.contains("image"));
    }
}
