use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::ProductImage as DomainProductImage;
use crate::domain::types::{ImagePriority, ProductImageName, TypeConstraintError};
use crate::models::product::Product;

/// Diesel model representing the `product_images` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::product_images)]
#[diesel(belongs_to(Product))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductImage {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub priority: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`ProductImage`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::product_images)]
pub struct NewProductImage<'a> {
    pub product_id: i32,
    pub name: &'a str,
    pub priority: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<ProductImage> for DomainProductImage {
    type Error = TypeConstraintError;

    fn try_from(image: ProductImage) -> Result<Self, Self::Error> {
        Ok(Self {
            id: image.id.try_into()?,
            product_id: image.product_id.try_into()?,
            name: ProductImageName::new(image.name)?,
            priority: ImagePriority::new(image.priority)?,
            created_at: image.created_at,
            updated_at: image.updated_at,
        })
    }
}
