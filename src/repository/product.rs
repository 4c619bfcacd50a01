use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::product::{
    NewProduct, NewProductImage, Product, ProductImage, ProductImageSync, ProductUpdate,
};
use crate::domain::types::{ProductId, ProductImageId};
use crate::models::product::{
    NewProduct as DbNewProduct, Product as DbProduct, ProductChangeset,
};
use crate::models::product_image::{
    NewProductImage as DbNewProductImage, ProductImage as DbProductImage,
};
use crate::repository::{
    DieselRepository, ProductReader, ProductWriter, RepositoryError, RepositoryResult,
};

/// Attach image rows to each product with a single query per batch.
fn attach_images(
    conn: &mut SqliteConnection,
    rows: Vec<DbProduct>,
) -> RepositoryResult<Vec<Product>> {
    let images = DbProductImage::belonging_to(&rows)
        .select(DbProductImage::as_select())
        .load::<DbProductImage>(conn)?
        .grouped_by(&rows);

    let products = rows
        .into_iter()
        .zip(images)
        .map(|(row, images)| row.into_domain(images))
        .collect::<Result<Vec<Product>, _>>()?;

    Ok(products)
}

fn load_product(conn: &mut SqliteConnection, id: i32) -> RepositoryResult<Option<Product>> {
    use crate::schema::products;

    let row: Option<DbProduct> = products::table
        .find(id)
        .select(DbProduct::as_select())
        .first(conn)
        .optional()?;

    match row {
        Some(row) => Ok(attach_images(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

fn insert_images(
    conn: &mut SqliteConnection,
    product_id: i32,
    images: &[NewProductImage],
    now: NaiveDateTime,
) -> RepositoryResult<usize> {
    use crate::schema::product_images;

    if images.is_empty() {
        return Ok(0);
    }

    let rows = images
        .iter()
        .map(|image| DbNewProductImage {
            product_id,
            name: image.name.as_str(),
            priority: image.priority.get(),
            created_at: now,
            updated_at: now,
        })
        .collect::<Vec<_>>();

    let affected = diesel::insert_into(product_images::table)
        .values(&rows)
        .execute(conn)?;

    Ok(affected)
}

fn apply_image_sync(
    conn: &mut SqliteConnection,
    product_id: i32,
    sync: &ProductImageSync,
    now: NaiveDateTime,
) -> RepositoryResult<()> {
    use crate::schema::product_images;

    for change in &sync.updates {
        diesel::update(
            product_images::table
                .filter(product_images::id.eq(change.id.get()))
                .filter(product_images::product_id.eq(product_id)),
        )
        .set((
            product_images::name.eq(change.name.as_str()),
            product_images::priority.eq(change.priority.get()),
            product_images::updated_at.eq(now),
        ))
        .execute(conn)?;
    }

    let keep = sync
        .keep_ids()
        .into_iter()
        .map(ProductImageId::get)
        .collect::<Vec<i32>>();

    let removed = diesel::delete(
        product_images::table
            .filter(product_images::product_id.eq(product_id))
            .filter(product_images::id.ne_all(keep)),
    )
    .execute(conn)?;

    let inserted = insert_images(conn, product_id, &sync.inserts, now)?;

    log::debug!(
        "Synced images of product {product_id}: {} updated, {removed} removed, {inserted} inserted",
        sync.updates.len()
    );

    Ok(())
}

impl ProductReader for DieselRepository {
    fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let rows: Vec<DbProduct> = products::table
            .order(products::id.asc())
            .select(DbProduct::as_select())
            .load(&mut conn)?;

        attach_images(&mut conn, rows)
    }

    fn get_product_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        let mut conn = self.conn()?;
        load_product(&mut conn, id.get())
    }

    fn get_product_image_by_id(
        &self,
        id: ProductImageId,
    ) -> RepositoryResult<Option<ProductImage>> {
        use crate::schema::product_images;

        let mut conn = self.conn()?;

        let image: Option<DbProductImage> = product_images::table
            .find(id.get())
            .select(DbProductImage::as_select())
            .first(&mut conn)
            .optional()?;

        let image = image.map(TryInto::try_into).transpose()?;
        Ok(image)
    }
}

impl ProductWriter for DieselRepository {
    fn create_product(
        &self,
        product: &NewProduct,
        images: &[NewProductImage],
    ) -> RepositoryResult<Product> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let db_product: DbNewProduct = product.into();
            let stored: DbProduct = diesel::insert_into(products::table)
                .values(&db_product)
                .returning(DbProduct::as_returning())
                .get_result(conn)?;

            insert_images(conn, stored.id, images, product.created_at)?;

            load_product(conn, stored.id)?.ok_or(RepositoryError::NotFound)
        })
    }

    fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
        images: Option<&ProductImageSync>,
    ) -> RepositoryResult<Product> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let changeset: ProductChangeset = update.into();
            let affected = diesel::update(products::table.find(id.get()))
                .set(&changeset)
                .execute(conn)?;
            if affected == 0 {
                return Err(RepositoryError::NotFound);
            }

            if let Some(sync) = images {
                apply_image_sync(conn, id.get(), sync, update.updated_at)?;
            }

            load_product(conn, id.get())?.ok_or(RepositoryError::NotFound)
        })
    }

    fn delete_product(&self, id: ProductId) -> RepositoryResult<usize> {
        use crate::schema::{product_images, products};

        let mut conn = self.conn()?;

        let affected = conn.transaction::<_, RepositoryError, _>(|conn| {
            diesel::delete(product_images::table.filter(product_images::product_id.eq(id.get())))
                .execute(conn)?;
            let affected = diesel::delete(products::table.find(id.get())).execute(conn)?;
            Ok(affected)
        })?;

        Ok(affected)
    }
}
