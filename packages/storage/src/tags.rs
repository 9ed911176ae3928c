// ABOUTME: Tag storage layer using SQLite
// ABOUTME: CRUD with transactional rename cascade into solution tag arrays

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use compass_core::{validate_tag_create, validate_tag_update, Tag, TagCreateInput, TagUpdateInput};

use crate::{check_valid, order_clause, parse_sort, StorageError, StorageResult};

/// Fields accepted by the tag list sort parameter
pub const TAG_SORT_FIELDS: &[&str] = &["name", "usage_count", "created_at", "updated_at"];

pub struct TagStorage {
    pool: SqlitePool,
}

impl TagStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new tag
    pub async fn create(&self, input: TagCreateInput, actor: &str) -> StorageResult<Tag> {
        check_valid(validate_tag_create(&input))?;

        let name = input.name.trim().to_string();
        let existing: Option<String> = sqlx::query_scalar("SELECT name FROM tags WHERE name = ?")
            .bind(&name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;
        if existing.is_some() {
            return Err(StorageError::Conflict(format!(
                "Tag '{}' already exists",
                name
            )));
        }

        debug!("Creating tag: {}", name);
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO tags (name, description, usage_count,
                              created_at, created_by, updated_at, updated_by)
            VALUES (?, ?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(&name)
        .bind(&input.description)
        .bind(now)
        .bind(actor)
        .bind(now)
        .bind(actor)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_by_name(&name)
            .await?
            .ok_or(StorageError::NotFound("Tag"))
    }

    /// Get a tag by name
    pub async fn get_by_name(&self, name: &str) -> StorageResult<Option<Tag>> {
        let row = sqlx::query("SELECT * FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(row_to_tag(&row)?)),
            None => Ok(None),
        }
    }

    /// List tags with sorting and pagination
    pub async fn list(&self, skip: i64, limit: i64, sort: &str) -> StorageResult<(Vec<Tag>, i64)> {
        let (field, descending) = parse_sort(sort, TAG_SORT_FIELDS)?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let sql = format!(
            "SELECT * FROM tags {} LIMIT ? OFFSET ?",
            order_clause(field, descending)
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let tags = rows
            .iter()
            .map(row_to_tag)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok((tags, total))
    }

    /// Partially update a tag by name.
    ///
    /// A rename rewrites the tag inside every solution's tag array that
    /// contains the old name, in the same transaction as the tag row
    /// update. Either everything commits or nothing does. Renaming onto an
    /// existing tag is rejected.
    pub async fn update_by_name(
        &self,
        name: &str,
        input: TagUpdateInput,
        actor: &str,
    ) -> StorageResult<Tag> {
        check_valid(validate_tag_update(&input))?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let row = sqlx::query("SELECT * FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound("Tag"))?;
        let mut tag = row_to_tag(&row)?;

        let rename = match input.name {
            Some(ref new_name) => {
                let new_name = new_name.trim().to_string();
                if new_name != tag.name {
                    let taken: Option<String> =
                        sqlx::query_scalar("SELECT name FROM tags WHERE name = ?")
                            .bind(&new_name)
                            .fetch_optional(&mut *tx)
                            .await
                            .map_err(StorageError::Sqlx)?;
                    if taken.is_some() {
                        return Err(StorageError::Conflict(format!(
                            "Tag '{}' already exists",
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
            tag.name = new_name.clone();
        }
        if let Some(description) = input.description {
            tag.description = description;
        }
        tag.updated_at = now;
        tag.updated_by = Some(actor.to_string());

        sqlx::query(
            "UPDATE tags SET name = ?, description = ?, updated_at = ?, updated_by = ? WHERE name = ?",
        )
        .bind(&tag.name)
        .bind(&tag.description)
        .bind(now)
        .bind(actor)
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if let Some(ref new_name) = rename {
            // Find every solution whose tags array contains the old name,
            // then rewrite the array element by element to preserve order.
            let rows = sqlx::query(
                r#"
                SELECT slug, tags FROM solutions
                WHERE EXISTS (SELECT 1 FROM json_each(solutions.tags) WHERE value = ?)
                "#,
            )
            .bind(name)
            .fetch_all(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

            let updated = rows.len();
            for row in rows {
                let slug: String = row.try_get("slug")?;
                let tags_json: String = row.try_get("tags")?;
                let tags: Vec<String> = serde_json::from_str(&tags_json)?;
                let rewritten: Vec<String> = tags
                    .into_iter()
                    .map(|t| if t == name { new_name.clone() } else { t })
                    .collect();

                sqlx::query(
                    "UPDATE solutions SET tags = ?, updated_at = ?, updated_by = ? WHERE slug = ?",
                )
                .bind(serde_json::to_string(&rewritten)?)
                .bind(now)
                .bind(actor)
                .bind(&slug)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
            }

            info!(
                "Renamed tag '{}' to '{}', updated {} solutions",
                name, new_name, updated
            );
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(tag)
    }

    /// Delete a tag by name. Returns false when no tag matched.
    /// Tags still referenced by solutions cannot be deleted.
    pub async fn delete_by_name(&self, name: &str) -> StorageResult<bool> {
        let usage: Option<i64> = sqlx::query_scalar("SELECT usage_count FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let usage = match usage {
            Some(usage) => usage,
            None => return Ok(false),
        };

        if usage > 0 {
            return Err(StorageError::Conflict(format!(
                "Tag '{}' is used by {} solutions and cannot be deleted",
                name, usage
            )));
        }

        debug!("Deleting tag: {}", name);

        let result = sqlx::query("DELETE FROM tags WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}

/// Convert a database row to a Tag
fn row_to_tag(row: &SqliteRow) -> StorageResult<Tag> {
    Ok(Tag {
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        usage_count: row.try_get("usage_count")?,
        created_at: row.try_get("created_at")?,
        created_by: row.try_get("created_by")?,
        updated_at: row.try_get("updated_at")?,
        updated_by: row.try_get("updated_by")?,
    })
}
