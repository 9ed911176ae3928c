// ABOUTME: Rating storage layer using SQLite
// ABOUTME: Per-user-per-solution upsert plus aggregate summaries

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use tracing::debug;

use compass_core::{validate_rating, Rating, RatingInput, RatingSummary};

use crate::{check_valid, order_clause, parse_sort, StorageError, StorageResult};

/// Fields accepted by the rating list sort parameter
pub const RATING_SORT_FIELDS: &[&str] = &["created_at", "updated_at", "score"];

pub struct RatingStorage {
    pool: SqlitePool,
}

impl RatingStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create or replace a user's rating of a solution.
    ///
    /// A user holds at most one rating per solution; rating again replaces
    /// the score and comment while keeping the original created_at.
    pub async fn upsert(
        &self,
        solution_slug: &str,
        username: &str,
        input: RatingInput,
    ) -> StorageResult<Rating> {
        check_valid(validate_rating(&input))?;

        let exists: Option<String> =
            sqlx::query_scalar("SELECT slug FROM solutions WHERE slug = ?")
                .bind(solution_slug)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;
        if exists.is_none() {
            return Err(StorageError::NotFound("Solution"));
        }

        debug!("Rating solution {} by {}", solution_slug, username);
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO ratings (solution_slug, username, score, comment, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(solution_slug, username) DO UPDATE SET
                score = excluded.score,
                comment = excluded.comment,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(solution_slug)
        .bind(username)
        .bind(input.score)
        .bind(&input.comment)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get(solution_slug, username)
            .await?
            .ok_or(StorageError::NotFound("Rating"))
    }

    /// Get one user's rating of a solution
    pub async fn get(
        &self,
        solution_slug: &str,
        username: &str,
    ) -> StorageResult<Option<Rating>> {
        let row = sqlx::query("SELECT * FROM ratings WHERE solution_slug = ? AND username = ?")
            .bind(solution_slug)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(row_to_rating(&row)?)),
            None => Ok(None),
        }
    }

    /// List ratings across all solutions with sorting and pagination
    pub async fn list(
        &self,
        skip: i64,
        limit: i64,
        sort: &str,
    ) -> StorageResult<(Vec<Rating>, i64)> {
        let (field, descending) = parse_sort(sort, RATING_SORT_FIELDS)?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ratings")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let sql = format!(
            "SELECT * FROM ratings {} LIMIT ? OFFSET ?",
            order_clause(field, descending)
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let ratings = rows
            .iter()
            .map(row_to_rating)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok((ratings, total))
    }

    /// List every rating of one solution, newest first
    pub async fn list_for_solution(&self, solution_slug: &str) -> StorageResult<Vec<Rating>> {
        let rows =
            sqlx::query("SELECT * FROM ratings WHERE solution_slug = ? ORDER BY created_at DESC")
                .bind(solution_slug)
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_rating).collect()
    }

    /// Aggregate statistics for one solution's ratings.
    /// A solution with no ratings gets a zeroed summary.
    pub async fn summary(&self, solution_slug: &str) -> StorageResult<RatingSummary> {
        let rows = sqlx::query(
            "SELECT score, COUNT(*) AS score_count FROM ratings WHERE solution_slug = ? GROUP BY score",
        )
        .bind(solution_slug)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if rows.is_empty() {
            return Ok(RatingSummary::empty());
        }

        let mut distribution: BTreeMap<String, i64> =
            (1..=5).map(|s| (s.to_string(), 0)).collect();
        let mut count = 0i64;
        let mut sum = 0i64;

        for row in &rows {
            let score: i64 = row.try_get("score")?;
            let score_count: i64 = row.try_get("score_count")?;
            distribution.insert(score.to_string(), score_count);
            count += score_count;
            sum += score * score_count;
        }

        let average = (sum as f64 / count as f64 * 100.0).round() / 100.0;

        Ok(RatingSummary {
            average,
            count,
            distribution,
        })
    }

    /// Delete one user's rating of a solution. Returns false when no
    /// rating matched.
    pub async fn delete(&self, solution_slug: &str, username: &str) -> StorageResult<bool> {
        debug!("Deleting rating of {} by {}", solution_slug, username);

        let result = sqlx::query("DELETE FROM ratings WHERE solution_slug = ? AND username = ?")
            .bind(solution_slug)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}

/// Convert a database row to a Rating
fn row_to_rating(row: &SqliteRow) -> StorageResult<Rating> {
    Ok(Rating {
        solution_slug: row.try_get("solution_slug")?,
        username: row.try_get("username")?,
        score: row.try_get("score")?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
