use serde::Deserialize;
use validator::Validate;

use crate::domain::product::{NewProductImage, ProductImageInput};
use crate::domain::types::{
    CategoryId, ImagePriority, ProductDescription, ProductImageId, ProductImageName, ProductName,
    ProductPrice,
};
use crate::forms::{FieldErrors, non_blank};

pub(crate) const CATEGORY_INVALID: &str = "The selected category id is invalid.";

/// One entry of the `images` array.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductImageForm {
    pub id: Option<i32>,
    #[validate(required(message = "The :attribute field is required."))]
    pub name: Option<String>,
    #[validate(
        required(message = "The :attribute field is required."),
        range(min = 0, message = "The :attribute field must be at least 0.")
    )]
    pub priority: Option<i32>,
}

/// JSON body of the product create/update endpoints.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductForm {
    #[validate(required(message = "The category id field is required."))]
    pub category_id: Option<i32>,
    #[validate(
        required(message = "The :attribute field is required."),
        length(max = 255, message = "The :attribute field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "The :attribute field is required."),
        range(min = 0.0, message = "The :attribute field must be at least 0.")
    )]
    pub price: Option<f64>,
    #[validate(required(message = "The :attribute field is required."))]
    pub description: Option<String>,
    pub images: Option<Vec<ProductImageForm>>,
}

/// Validated body of `POST /product`.
#[derive(Debug, Clone, PartialEq)]
pub struct AddProductPayload {
    pub category_id: CategoryId,
    pub name: ProductName,
    pub price: ProductPrice,
    pub description: ProductDescription,
    pub images: Vec<NewProductImage>,
}

/// Validated body of `POST /product/edit/{id}`.
///
/// `images` is `None` when the request left the collection out.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateProductPayload {
    pub category_id: CategoryId,
    pub name: ProductName,
    pub price: ProductPrice,
    pub description: ProductDescription,
    pub images: Option<Vec<ProductImageInput>>,
}

struct ProductFields {
    category_id: CategoryId,
    name: ProductName,
    price: ProductPrice,
    description: ProductDescription,
    images: Option<Vec<ProductImageInput>>,
}

fn required(field: &str) -> String {
    format!("The {field} field is required.")
}

fn validate_image(
    index: usize,
    mut form: ProductImageForm,
    errors: &mut FieldErrors,
) -> Option<ProductImageInput> {
    let prefix = format!("images.{index}");
    form.name = non_blank(form.name);
    if let Err(e) = form.validate() {
        errors.extend_from(&prefix, &e);
    }

    let id = match form.id {
        Some(raw) => match ProductImageId::new(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add(
                    format!("{prefix}.id"),
                    format!("The selected {prefix}.id is invalid."),
                );
                return None;
            }
        },
        None => None,
    };
    let name = ProductImageName::new(form.name?).ok()?;
    let priority = ImagePriority::new(form.priority?).ok()?;
    Some(ProductImageInput { id, name, priority })
}

impl ProductForm {
    fn validate_fields(mut self) -> Result<ProductFields, FieldErrors> {
        self.name = non_blank(self.name);
        self.description = non_blank(self.description);

        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        let category_id = match self.category_id.map(CategoryId::new) {
            Some(Ok(id)) => Some(id),
            Some(Err(_)) => {
                errors.add("category_id", CATEGORY_INVALID);
                None
            }
            None => None,
        };
        let name = self.name.and_then(|name| ProductName::new(name).ok());
        let price = self.price.and_then(|price| ProductPrice::new(price).ok());
        if self.price.is_some() && price.is_none() && !errors.contains("price") {
            errors.add("price", "The price field must be a number.");
        }
        let description = self
            .description
            .and_then(|description| ProductDescription::new(description).ok());

        let images = self.images.map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .filter_map(|(index, entry)| validate_image(index, entry, &mut errors))
                .collect::<Vec<_>>()
        });

        match (category_id, name, price, description) {
            (Some(category_id), Some(name), Some(price), Some(description))
                if errors.is_empty() =>
            {
                Ok(ProductFields {
                    category_id,
                    name,
                    price,
                    description,
                    images,
                })
            }
            (category_id, name, price, description) => {
                for (field, missing) in [
                    ("category_id", category_id.is_none()),
                    ("name", name.is_none()),
                    ("price", price.is_none()),
                    ("description", description.is_none()),
                ] {
                    if missing && !errors.contains(field) {
                        errors.add(field, required(field));
                    }
                }
                Err(errors)
            }
        }
    }

    /// Validate a create request. Image ids are ignored; every entry is new.
    pub fn into_add_payload(self) -> Result<AddProductPayload, FieldErrors> {
        let fields = self.validate_fields()?;
        let images = fields
            .images
            .unwrap_or_default()
            .into_iter()
            .map(|input| NewProductImage {
                name: input.name,
                priority: input.priority,
            })
            .collect();
        Ok(AddProductPayload {
            category_id: fields.category_id,
            name: fields.name,
            price: fields.price,
            description: fields.description,
            images,
        })
    }

    /// Validate an update request, keeping image ids for reconciliation.
    pub fn into_update_payload(self) -> Result<UpdateProductPayload, FieldErrors> {
        let fields = self.validate_fields()?;
        Ok(UpdateProductPayload {
            category_id: fields.category_id,
            name: fields.name,
            price: fields.price,
            description: fields.description,
            images: fields.images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ProductForm {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn add_payload_from_example_body() {
        let payload = parse(json!({
            "category_id": 1,
            "name": "Widget",
            "price": 9.99,
            "description": "x",
            "images": [{ "name": "a.png", "priority": 1 }]
        }))
        .into_add_payload()
        .unwrap();

        assert_eq!(payload.category_id, 1);
        assert_eq!(payload.name, "Widget");
        assert_eq!(payload.price.get(), 9.99);
        assert_eq!(payload.images.len(), 1);
        assert_eq!(payload.images[0].priority.get(), 1);
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let errors = parse(json!({})).into_add_payload().unwrap_err();

        assert!(errors.contains("category_id"));
        assert_eq!(
            errors.get("name").unwrap(),
            ["The name field is required.".to_string()]
        );
        assert!(errors.contains("price"));
        assert!(errors.contains("description"));
        assert!(!errors.contains("images"));
    }

    #[test]
    fn blank_name_counts_as_missing() {
        let errors = parse(json!({
            "category_id": 1, "name": "  ", "price": 1.0, "description": "x"
        }))
        .into_add_payload()
        .unwrap_err();

        assert_eq!(
            errors.get("name").unwrap(),
            ["The name field is required.".to_string()]
        );
    }

    #[test]
    fn image_errors_are_keyed_by_index() {
        let errors = parse(json!({
            "category_id": 1,
            "name": "Widget",
            "price": 1.0,
            "description": "x",
            "images": [
                { "name": "a.png", "priority": 1 },
                { "priority": -2 }
            ]
        }))
        .into_update_payload()
        .unwrap_err();

        assert_eq!(
            errors.get("images.1.name").unwrap(),
            ["The images.1.name field is required.".to_string()]
        );
        assert_eq!(
            errors.get("images.1.priority").unwrap(),
            ["The images.1.priority field must be at least 0.".to_string()]
        );
        assert!(!errors.contains("images.0.name"));
    }

    #[test]
    fn non_positive_ids_are_rejected() {
        let errors = parse(json!({
            "category_id": 0,
            "name": "Widget",
            "price": 1.0,
            "description": "x",
            "images": [{ "id": -1, "name": "a.png", "priority": 1 }]
        }))
        .into_update_payload()
        .unwrap_err();

        assert_eq!(
            errors.get("category_id").unwrap(),
            [CATEGORY_INVALID.to_string()]
        );
        assert!(errors.contains("images.0.id"));
    }

    #[test]
    fn update_payload_distinguishes_absent_and_empty_images() {
        let absent = parse(json!({
            "category_id": 1, "name": "W", "price": 1.0, "description": "x"
        }))
        .into_update_payload()
        .unwrap();
        assert!(absent.images.is_none());

        let empty = parse(json!({
            "category_id": 1, "name": "W", "price": 1.0, "description": "x", "images": []
        }))
        .into_update_payload()
        .unwrap();
        assert_eq!(empty.images, Some(Vec::new()));
    }

    #[test]
    fn update_payload_keeps_image_ids() {
        let payload = parse(json!({
            "category_id": 1,
            "name": "W",
            "price": 1.0,
            "description": "x",
            "images": [
                { "id": 7, "name": "a.png", "priority": 2 },
                { "name": "b.png", "priority": 0 }
            ]
        }))
        .into_update_payload()
        .unwrap();

        let images = payload.images.unwrap();
        assert_eq!(images[0].id.map(ProductImageId::get), Some(7));
        assert!(images[1].id.is_none());
    }
}
