use std::sync::Mutex;

use chrono::NaiveDateTime;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::domain::category::{Category, CategoryUpdate, NewCategory};
use crate::domain::product::{
    NewProduct, NewProductImage, Product, ProductImage, ProductImageSync, ProductUpdate,
    sort_images,
};
use crate::domain::types::{CategoryId, CategoryName, ProductId, ProductImageId};
use crate::repository::{
    CategoryReader, CategoryWriter, ProductReader, ProductWriter, RepositoryError,
    RepositoryResult,
};

struct State {
    categories: Vec<Category>,
    products: Vec<Product>,
    next_category_id: i32,
    next_product_id: i32,
    next_image_id: i32,
}

/// Simple in-memory repository used for unit tests.
///
/// Mirrors the database constraints the services rely on: unique category
/// names and cascading deletes from categories to products to images.
pub struct TestRepository {
    state: Mutex<State>,
    fail_writes: bool,
}

impl Default for TestRepository {
    fn default() -> Self {
        Self::new(vec![], vec![])
    }
}

impl TestRepository {
    pub fn new(categories: Vec<Category>, products: Vec<Product>) -> Self {
        let next_category_id = categories.iter().map(|c| c.id.get()).max().unwrap_or(0) + 1;
        let next_product_id = products.iter().map(|p| p.id.get()).max().unwrap_or(0) + 1;
        let next_image_id = products
            .iter()
            .flat_map(|p| p.images.iter().map(|i| i.id.get()))
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            state: Mutex::new(State {
                categories,
                products,
                next_category_id,
                next_product_id,
                next_image_id,
            }),
            fail_writes: false,
        }
    }

    /// Make every write fail with a database error; reads keep working.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn categories(&self) -> Vec<Category> {
        self.state.lock().unwrap().categories.clone()
    }

    pub fn products(&self) -> Vec<Product> {
        self.state.lock().unwrap().products.clone()
    }

    fn check_writable(&self) -> RepositoryResult<()> {
        if self.fail_writes {
            Err(RepositoryError::Database(DieselError::BrokenTransactionManager))
        } else {
            Ok(())
        }
    }
}

fn unique_violation() -> RepositoryError {
    RepositoryError::Database(DieselError::DatabaseError(
        DatabaseErrorKind::UniqueViolation,
        Box::new("UNIQUE constraint failed: categories.name".to_string()),
    ))
}

fn foreign_key_violation() -> RepositoryError {
    RepositoryError::Database(DieselError::DatabaseError(
        DatabaseErrorKind::ForeignKeyViolation,
        Box::new("FOREIGN KEY constraint failed".to_string()),
    ))
}

fn new_image(
    state: &mut State,
    product_id: ProductId,
    image: &NewProductImage,
    now: NaiveDateTime,
) -> ProductImage {
    let id = ProductImageId::new(state.next_image_id).unwrap();
    state.next_image_id += 1;
    ProductImage {
        id,
        product_id,
        name: image.name.clone(),
        priority: image.priority,
        created_at: now,
        updated_at: now,
    }
}

impl CategoryReader for TestRepository {
    fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        let mut items = self.categories();
        items.sort_by_key(|c| c.id);
        Ok(items)
    }

    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>> {
        Ok(self.categories().into_iter().find(|c| c.id == id))
    }

    fn get_category_by_name(&self, name: &CategoryName) -> RepositoryResult<Option<Category>> {
        Ok(self.categories().into_iter().find(|c| &c.name == name))
    }
}

impl CategoryWriter for TestRepository {
    fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        if state.categories.iter().any(|c| c.name == category.name) {
            return Err(unique_violation());
        }
        let stored = Category {
            id: CategoryId::new(state.next_category_id).unwrap(),
            name: category.name.clone(),
            description: category.description.clone(),
            image: category.image.clone(),
            created_at: category.created_at,
            updated_at: category.updated_at,
        };
        state.next_category_id += 1;
        state.categories.push(stored.clone());
        Ok(stored)
    }

    fn update_category(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> RepositoryResult<Category> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        if state
            .categories
            .iter()
            .any(|c| c.id != id && c.name == update.name)
        {
            return Err(unique_violation());
        }
        let category = state
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        category.name = update.name.clone();
        category.description = update.description.clone();
        if let Some(image) = &update.image {
            category.image = image.clone();
        }
        category.updated_at = update.updated_at;
        Ok(category.clone())
    }

    fn delete_category(&self, id: CategoryId) -> RepositoryResult<usize> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        state.products.retain(|p| p.category_id != id);
        Ok(before - state.categories.len())
    }
}

impl ProductReader for TestRepository {
    fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        let mut items = self.products();
        items.sort_by_key(|p| p.id);
        Ok(items)
    }

    fn get_product_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        Ok(self.products().into_iter().find(|p| p.id == id))
    }

    fn get_product_image_by_id(
        &self,
        id: ProductImageId,
    ) -> RepositoryResult<Option<ProductImage>> {
        Ok(self
            .products()
            .into_iter()
            .flat_map(|p| p.images)
            .find(|i| i.id == id))
    }
}

impl ProductWriter for TestRepository {
    fn create_product(
        &self,
        product: &NewProduct,
        images: &[NewProductImage],
    ) -> RepositoryResult<Product> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        if !state.categories.iter().any(|c| c.id == product.category_id) {
            return Err(foreign_key_violation());
        }
        let id = ProductId::new(state.next_product_id).unwrap();
        state.next_product_id += 1;
        let mut stored_images = images
            .iter()
            .map(|image| new_image(&mut state, id, image, product.created_at))
            .collect::<Vec<_>>();
        sort_images(&mut stored_images);
        let stored = Product {
            id,
            category_id: product.category_id,
            name: product.name.clone(),
            price: product.price,
            description: product.description.clone(),
            created_at: product.created_at,
            updated_at: product.updated_at,
            images: stored_images,
        };
        state.products.push(stored.clone());
        Ok(stored)
    }

    fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
        images: Option<&ProductImageSync>,
    ) -> RepositoryResult<Product> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        if !state.categories.iter().any(|c| c.id == update.category_id) {
            return Err(foreign_key_violation());
        }
        let index = state
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;

        let mut current = state.products[index].images.clone();
        if let Some(sync) = images {
            for change in &sync.updates {
                if let Some(image) = current.iter_mut().find(|i| i.id == change.id) {
                    image.name = change.name.clone();
                    image.priority = change.priority;
                    image.updated_at = update.updated_at;
                }
            }
            let stale = sync.stale_ids(current.iter().map(|i| &i.id));
            current.retain(|i| !stale.contains(&i.id));
            for insert in &sync.inserts {
                let image = new_image(&mut state, id, insert, update.updated_at);
                current.push(image);
            }
            sort_images(&mut current);
        }

        let product = &mut state.products[index];
        product.category_id = update.category_id;
        product.name = update.name.clone();
        product.price = update.price;
        product.description = update.description.clone();
        product.updated_at = update.updated_at;
        product.images = current;
        Ok(product.clone())
    }

    fn delete_product(&self, id: ProductId) -> RepositoryResult<usize> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        Ok(before - state.products.len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::types::{CategoryDescription, ImageFileName};

    #[test]
    fn default_repository_assigns_ids_from_one() {
        let repo = TestRepository::default();
        let now = Utc::now().naive_utc();

        let category = repo
            .create_category(&NewCategory {
                name: CategoryName::new("Shoes").unwrap(),
                description: CategoryDescription::new("desc").unwrap(),
                image: ImageFileName::new("a.png").unwrap(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        assert_eq!(category.id.get(), 1);
    }
}
