// ABOUTME: Category storage layer using SQLite
// ABOUTME: CRUD with transactional rename cascade into solution references

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use compass_core::{
    validate_category_create, validate_category_update, Category, CategoryCreateInput,
    CategoryUpdateInput,
};

use crate::{check_valid, order_clause, parse_sort, StorageError, StorageResult};

/// Fields accepted by the category list sort parameter
pub const CATEGORY_SORT_FIELDS: &[&str] = &["name", "usage_count", "created_at", "updated_at"];

pub struct CategoryStorage {
    pool: SqlitePool,
}

impl CategoryStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new category
    pub async fn create(
        &self,
        input: CategoryCreateInput,
        actor: &str,
    ) -> StorageResult<Category> {
        check_valid(validate_category_create(&input))?;

        let name = input.name.trim().to_string();
        let existing: Option<String> =
            sqlx::query_scalar("SELECT name FROM categories WHERE name = ?")
                .bind(&name)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;
        if existing.is_some() {
            return Err(StorageError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }

        debug!("Creating category: {}", name);
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO categories (name, description, radar_quadrant, usage_count,
                                    created_at, created_by, updated_at, updated_by)
            VALUES (?, ?, ?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(&name)
        .bind(&input.description)
        .bind(input.radar_quadrant)
        .bind(now)
        .bind(actor)
        .bind(now)
        .bind(actor)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_by_name(&name)
            .await?
            .ok_or(StorageError::NotFound("Category"))
    }

    /// Get a category by name
    pub async fn get_by_name(&self, name: &str) -> StorageResult<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(row_to_category(&row)?)),
            None => Ok(None),
        }
    }

    /// List categories with sorting and pagination
    pub async fn list(
        &self,
        skip: i64,
        limit: i64,
        sort: &str,
    ) -> StorageResult<(Vec<Category>, i64)> {
        let (field, descending) = parse_sort(sort, CATEGORY_SORT_FIELDS)?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let sql = format!(
            "SELECT * FROM categories {} LIMIT ? OFFSET ?",
            order_clause(field, descending)
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let categories = rows
            .iter()
            .map(row_to_category)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok((categories, total))
    }

    /// Partially update a category by name.
    ///
    /// A rename rewrites the category reference on every solution that
    /// points at the old name, in the same transaction as the category row
    /// update. Renaming onto an existing category is rejected.
    pub async fn update_by_name(
        &self,
        name: &str,
        input: CategoryUpdateInput,
        actor: &str,
    ) -> StorageResult<Category> {
        check_valid(validate_category_update(&input))?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let row = sqlx::query("SELECT * FROM categories WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound("Category"))?;
        let mut category = row_to_category(&row)?;

        let rename = match input.name {
            Some(ref new_name) => {
                let new_name = new_name.trim().to_string();
                if new_name != category.name {
                    let taken: Option<String> =
                        sqlx::query_scalar("SELECT name FROM categories WHERE name = ?")
                            .bind(&new_name)
                            .fetch_optional(&mut *tx)
                            .await
                            .map_err(StorageError::Sqlx)?;
                    if taken.is_some() {
                        return Err(StorageError::Conflict(format!(
                            "Category '{}' already exists",
                            new_name
                        )));
                    }
                    Some(new_name)
                } else {
                    None
                }
            }
            None => None,
        };

        if let Some(ref new_name) = rename {
            category.name = new_name.clone();
        }
        if let Some(description) = input.description {
            category.description = description;
        }
        if let Some(radar_quadrant) = input.radar_quadrant {
            category.radar_quadrant = radar_quadrant;
        }
        category.updated_at = now;
        category.updated_by = Some(actor.to_string());

        sqlx::query(
            r#"
            UPDATE categories SET name = ?, description = ?, radar_quadrant = ?,
                                  updated_at = ?, updated_by = ?
            WHERE name = ?
            "#,
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.radar_quadrant)
        .bind(now)
        .bind(actor)
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if let Some(ref new_name) = rename {
            let result = sqlx::query(
                "UPDATE solutions SET category = ?, updated_at = ?, updated_by = ? WHERE category = ?",
            )
            .bind(new_name)
            .bind(now)
            .bind(actor)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

            info!(
                "Renamed category '{}' to '{}', updated {} solutions",
                name,
                new_name,
                result.rows_affected()
            );
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(category)
    }

    /// Delete a category by name. Returns false when no category matched.
    ///
    /// Solutions referencing the category keep their (now dangling) name
    /// reference; there is no guard and no cascade.
    pub async fn delete_by_name(&self, name: &str) -> StorageResult<bool> {
        debug!("Deleting category: {}", name);

        let result = sqlx::query("DELETE FROM categories WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}

/// Convert a database row to a Category
fn row_to_category(row: &SqliteRow) -> StorageResult<Category> {
    Ok(Category {
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        radar_quadrant: row.try_get("radar_quadrant")?,
        usage_count: row.try_get("usage_count")?,
        created_at: row.try_get("created_at")?,
        created_by: row.try_get("created_by")?,
        updated_at: row.try_get("updated_at")?,
        updated_by: row.try_get("updated_by")?,
    })
}
