use diesel::prelude::*;

use crate::domain::category::{Category, CategoryUpdate, NewCategory};
use crate::domain::types::{CategoryId, CategoryName};
use crate::models::category::{
    Category as DbCategory, CategoryChangeset, NewCategory as DbNewCategory,
};
use crate::repository::{
    CategoryReader, CategoryWriter, DieselRepository, RepositoryError, RepositoryResult,
};

impl CategoryReader for DieselRepository {
    fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        use crate::schema::categories;

        let mut conn = self.conn()?;

        let items = categories::table
            .order(categories::id.asc())
            .select(DbCategory::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Category>, _>>()?;

        Ok(items)
    }

    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>> {
        use crate::schema::categories;

        let mut conn = self.conn()?;

        let category = categories::table
            .filter(categories::id.eq(id.get()))
            .select(DbCategory::as_select())
            .first(&mut conn)
            .optional()?;

        let category = category.map(TryInto::try_into).transpose()?;
        Ok(category)
    }

    fn get_category_by_name(&self, name: &CategoryName) -> RepositoryResult<Option<Category>> {
        use crate::schema::categories;

        let mut conn = self.conn()?;

        let category = categories::table
            .filter(categories::name.eq(name.as_str()))
            .select(DbCategory::as_select())
            .first(&mut conn)
            .optional()?;

        let category = category.map(TryInto::try_into).transpose()?;
        Ok(category)
    }
}

impl CategoryWriter for DieselRepository {
    fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category> {
        use crate::schema::categories;

        let mut conn = self.conn()?;
        let db_category: DbNewCategory = category.into();

        let stored: DbCategory = diesel::insert_into(categories::table)
            .values(&db_category)
            .returning(DbCategory::as_returning())
            .get_result(&mut conn)?;

        let category: Category = stored.try_into()?;
        Ok(category)
    }

    fn update_category(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> RepositoryResult<Category> {
        use crate::schema::categories;

        let mut conn = self.conn()?;
        let changeset: CategoryChangeset = update.into();

        let stored: DbCategory =
            diesel::update(categories::table.filter(categories::id.eq(id.get())))
                .set(&changeset)
                .returning(DbCategory::as_returning())
                .get_result(&mut conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

        let category: Category = stored.try_into()?;
        Ok(category)
    }

    fn delete_category(&self, id: CategoryId) -> RepositoryResult<usize> {
        use crate::schema::categories;

        let mut conn = self.conn()?;

        let affected = diesel::delete(categories::table.filter(categories::id.eq(id.get())))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
