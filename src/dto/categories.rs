use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::category::Category;

/// JSON representation of a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDto {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Stored original file name; the thumbnail is `150x150_` + this name.
    pub image: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Category> for CategoryDto {
    fn from(value: Category) -> Self {
        Self {
            id: value.id.get(),
            name: value.name.into_inner(),
            description: value.description.into_inner(),
            image: value.image.into_inner(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
