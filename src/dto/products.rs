use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::product::{Product, ProductImage};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductImageDto {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub priority: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<ProductImage> for ProductImageDto {
    fn from(value: ProductImage) -> Self {
        Self {
            id: value.id.get(),
            product_id: value.product_id.get(),
            name: value.name.into_inner(),
            priority: value.priority.get(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// JSON representation of a product with its images in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDto {
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub product_images: Vec<ProductImageDto>,
}

impl From<Product> for ProductDto {
    fn from(value: Product) -> Self {
        Self {
            id: value.id.get(),
            category_id: value.category_id.get(),
            name: value.name.into_inner(),
            price: value.price.get(),
            description: value.description.into_inner(),
            created_at: value.created_at,
            updated_at: value.updated_at,
            product_images: value
                .images
                .into_iter()
                .map(ProductImageDto::from)
                .collect(),
        }
    }
}
