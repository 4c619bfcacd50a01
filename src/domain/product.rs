use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    CategoryId, ImagePriority, ProductDescription, ProductId, ProductImageId, ProductImageName,
    ProductName, ProductPrice,
};

/// A catalog product together with its ordered image collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: ProductName,
    pub price: ProductPrice,
    pub description: ProductDescription,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    /// Images sorted by priority, ties broken by id.
    pub images: Vec<ProductImage>,
}

/// Information required to create a new [`Product`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: ProductName,
    pub price: ProductPrice,
    pub description: ProductDescription,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Scalar fields overwritten by a product update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub category_id: CategoryId,
    pub name: ProductName,
    pub price: ProductPrice,
    pub description: ProductDescription,
    pub updated_at: NaiveDateTime,
}

/// Image row owned by a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product_id: ProductId,
    pub name: ProductImageName,
    pub priority: ImagePriority,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Image entry to be inserted; the owning product id is attached on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProductImage {
    pub name: ProductImageName,
    pub priority: ImagePriority,
}

/// New values for an existing image row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductImageChange {
    pub id: ProductImageId,
    pub name: ProductImageName,
    pub priority: ImagePriority,
}

/// One image entry of an update request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductImageInput {
    pub id: Option<ProductImageId>,
    pub name: ProductImageName,
    pub priority: ImagePriority,
}

/// Reconciliation plan turning a product's stored images into exactly the
/// submitted collection.
///
/// Entries carrying an id become in-place updates and are kept; entries
/// without one are inserted. Every stored image whose id is not kept is
/// deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductImageSync {
    pub updates: Vec<ProductImageChange>,
    pub inserts: Vec<NewProductImage>,
}

impl ProductImageSync {
    /// Partition submitted entries into updates and inserts, preserving order.
    pub fn from_inputs<I>(inputs: I) -> Self
    where
        I: IntoIterator<Item = ProductImageInput>,
    {
        let mut sync = Self::default();
        for input in inputs {
            match input.id {
                Some(id) => sync.updates.push(ProductImageChange {
                    id,
                    name: input.name,
                    priority: input.priority,
                }),
                None => sync.inserts.push(NewProductImage {
                    name: input.name,
                    priority: input.priority,
                }),
            }
        }
        sync
    }

    /// Ids of stored images that survive the sync.
    pub fn keep_ids(&self) -> BTreeSet<ProductImageId> {
        self.updates.iter().map(|change| change.id).collect()
    }

    /// Stored ids that the sync removes.
    pub fn stale_ids<'a, I>(&self, existing: I) -> Vec<ProductImageId>
    where
        I: IntoIterator<Item = &'a ProductImageId>,
    {
        let keep = self.keep_ids();
        existing
            .into_iter()
            .filter(|id| !keep.contains(id))
            .copied()
            .collect()
    }
}

/// Sort images into display order.
pub fn sort_images(images: &mut [ProductImage]) {
    images.sort_by_key(|image| (image.priority, image.id));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: Option<i32>, name: &str, priority: i32) -> ProductImageInput {
        ProductImageInput {
            id: id.map(|id| ProductImageId::new(id).unwrap()),
            name: ProductImageName::new(name).unwrap(),
            priority: ImagePriority::new(priority).unwrap(),
        }
    }

    fn id(value: i32) -> ProductImageId {
        ProductImageId::new(value).unwrap()
    }

    #[test]
    fn partitions_entries_by_presence_of_id() {
        let sync = ProductImageSync::from_inputs(vec![
            input(Some(7), "a.png", 2),
            input(None, "b.png", 1),
            input(Some(9), "c.png", 0),
        ]);

        assert_eq!(sync.updates.len(), 2);
        assert_eq!(sync.updates[0].id, 7);
        assert_eq!(sync.updates[1].id, 9);
        assert_eq!(sync.inserts.len(), 1);
        assert_eq!(sync.inserts[0].name, "b.png");
    }

    #[test]
    fn stale_ids_are_existing_minus_kept() {
        let sync = ProductImageSync::from_inputs(vec![input(Some(7), "a.png", 2)]);
        let existing = [id(5), id(7), id(8)];

        assert_eq!(sync.stale_ids(existing.iter()), vec![id(5), id(8)]);
    }

    #[test]
    fn empty_submission_removes_everything() {
        let sync = ProductImageSync::from_inputs(Vec::new());
        let existing = [id(1), id(2)];

        assert!(sync.keep_ids().is_empty());
        assert_eq!(sync.stale_ids(existing.iter()), vec![id(1), id(2)]);
    }

    #[test]
    fn repeated_ids_are_kept_once() {
        let sync = ProductImageSync::from_inputs(vec![
            input(Some(3), "a.png", 1),
            input(Some(3), "b.png", 2),
        ]);

        assert_eq!(sync.keep_ids().len(), 1);
        assert_eq!(sync.updates.len(), 2);
    }
}
