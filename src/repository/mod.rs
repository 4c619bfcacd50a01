use crate::db::{DbConnection, DbPool};
use crate::domain::category::{Category, CategoryUpdate, NewCategory};
use crate::domain::product::{
    NewProduct, NewProductImage, Product, ProductImage, ProductImageSync, ProductUpdate,
};
use crate::domain::types::{CategoryId, CategoryName, ProductId, ProductImageId};

pub use errors::{RepositoryError, RepositoryResult};

pub mod category;
pub mod errors;
pub mod product;
#[cfg(test)]
pub mod test;

/// Repository implementation backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone, allowing the repository to
/// be passed around freely between handlers.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations for category entities.
pub trait CategoryReader {
    /// List every category in storage order.
    fn list_categories(&self) -> RepositoryResult<Vec<Category>>;
    /// Retrieve a category by its identifier.
    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>>;
    /// Retrieve a category by its unique name.
    fn get_category_by_name(&self, name: &CategoryName) -> RepositoryResult<Option<Category>>;
}

/// Write operations for category entities.
pub trait CategoryWriter {
    /// Persist a new category and return the stored row.
    fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category>;
    /// Overwrite name, description and optionally the image file name.
    fn update_category(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> RepositoryResult<Category>;
    /// Delete a category by id, returning the number of removed rows.
    fn delete_category(&self, id: CategoryId) -> RepositoryResult<usize>;
}

/// Read-only operations for products and their images.
pub trait ProductReader {
    /// List every product with its images attached.
    fn list_products(&self) -> RepositoryResult<Vec<Product>>;
    /// Retrieve a product with its images.
    fn get_product_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>>;
    /// Retrieve a single image row regardless of its owner.
    fn get_product_image_by_id(
        &self,
        id: ProductImageId,
    ) -> RepositoryResult<Option<ProductImage>>;
}

/// Write operations for products. Image rows only change through these.
pub trait ProductWriter {
    /// Insert a product and its images in one transaction.
    fn create_product(
        &self,
        product: &NewProduct,
        images: &[NewProductImage],
    ) -> RepositoryResult<Product>;
    /// Update a product and, when `images` is given, reconcile its image rows
    /// in the same transaction.
    fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
        images: Option<&ProductImageSync>,
    ) -> RepositoryResult<Product>;
    /// Delete a product and its images, returning the number of removed products.
    fn delete_product(&self, id: ProductId) -> RepositoryResult<usize>;
}
