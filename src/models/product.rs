use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::{
    NewProduct as DomainNewProduct, Product as DomainProduct, ProductImage as DomainProductImage,
    ProductUpdate as DomainProductUpdate, sort_images,
};
use crate::domain::types::{
    ProductDescription, ProductName, ProductPrice, TypeConstraintError,
};

/// Diesel model representing a row in the `products` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Product {
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`Product`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct<'a> {
    pub category_id: i32,
    pub name: &'a str,
    pub price: f64,
    pub description: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Scalar columns rewritten by a product update.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::products)]
pub struct ProductChangeset<'a> {
    pub category_id: i32,
    pub name: &'a str,
    pub price: f64,
    pub description: &'a str,
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Compose the domain product from its row and already-loaded image rows.
    pub fn into_domain(
        self,
        images: Vec<super::product_image::ProductImage>,
    ) -> Result<DomainProduct, TypeConstraintError> {
        let mut images = images
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<DomainProductImage>, _>>()?;
        sort_images(&mut images);

        Ok(DomainProduct {
            id: self.id.try_into()?,
            category_id: self.category_id.try_into()?,
            name: ProductName::new(self.name)?,
            price: ProductPrice::new(self.price)?,
            description: ProductDescription::new(self.description)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            images,
        })
    }
}

impl<'a> From<&'a DomainNewProduct> for NewProduct<'a> {
    fn from(product: &'a DomainNewProduct) -> Self {
        Self {
            category_id: product.category_id.get(),
            name: product.name.as_str(),
            price: product.price.get(),
            description: product.description.as_str(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl<'a> From<&'a DomainProductUpdate> for ProductChangeset<'a> {
    fn from(update: &'a DomainProductUpdate) -> Self {
        Self {
            category_id: update.category_id.get(),
            name: update.name.as_str(),
            price: update.price.get(),
            description: update.description.as_str(),
            updated_at: update.updated_at,
        }
    }
}
