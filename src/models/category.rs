use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::category::{
    Category as DomainCategory, CategoryUpdate as DomainCategoryUpdate,
    NewCategory as DomainNewCategory,
};
use crate::domain::types::{
    CategoryDescription, CategoryName, ImageFileName, TypeConstraintError,
};

/// Diesel model representing the `categories` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`Category`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::categories)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub image: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Patch applied on update; a `None` image leaves the column untouched.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::categories)]
pub struct CategoryChangeset<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub image: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Category> for DomainCategory {
    type Error = TypeConstraintError;

    fn try_from(category: Category) -> Result<Self, Self::Error> {
        Ok(Self {
            id: category.id.try_into()?,
            name: CategoryName::new(category.name)?,
            description: CategoryDescription::new(category.description)?,
            image: ImageFileName::new(category.image)?,
            created_at: category.created_at,
            updated_at: category.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewCategory> for NewCategory<'a> {
    fn from(category: &'a DomainNewCategory) -> Self {
        Self {
            name: category.name.as_str(),
            description: category.description.as_str(),
            image: category.image.as_str(),
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

impl<'a> From<&'a DomainCategoryUpdate> for CategoryChangeset<'a> {
    fn from(update: &'a DomainCategoryUpdate) -> Self {
        Self {
            name: update.name.as_str(),
            description: update.description.as_str(),
            image: update.image.as_ref().map(ImageFileName::as_str),
            updated_at: update.updated_at,
        }
    }
}
