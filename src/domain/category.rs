use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CategoryDescription, CategoryId, CategoryName, ImageFileName};

/// Catalog category with its uploaded image.
///
/// `image` names the stored original; the thumbnail lives next to it under
/// [`ImageFileName::thumbnail`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    pub description: CategoryDescription,
    pub image: ImageFileName,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Data required to insert a new [`Category`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub name: CategoryName,
    pub description: CategoryDescription,
    pub image: ImageFileName,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields written when an existing [`Category`] is updated.
///
/// `image` is `None` when the stored file name stays as it is.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryUpdate {
    pub name: CategoryName,
    pub description: CategoryDescription,
    pub image: Option<ImageFileName>,
    pub updated_at: NaiveDateTime,
}
