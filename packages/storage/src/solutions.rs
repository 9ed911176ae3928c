// ABOUTME: Solution storage layer using SQLite
// ABOUTME: CRUD with slug generation, soft category/tag references, usage counters

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::debug;

use compass_core::{
    generate_slug, validate_solution_create, validate_solution_update, RadarData, RadarEntry,
    RadarStatus, RecommendStatus, Solution, SolutionCreateInput, SolutionUpdateInput, Stage,
};

use crate::{check_valid, order_clause, parse_sort, StorageError, StorageResult};

/// Fields accepted by the solution list sort parameter
pub const SOLUTION_SORT_FIELDS: &[&str] = &[
    "name",
    "category",
    "department",
    "team",
    "created_at",
    "updated_at",
];

/// Exact-match filters for solution listing, combined as a conjunction
#[derive(Debug, Clone, Default)]
pub struct SolutionFilter {
    pub category: Option<String>,
    pub department: Option<String>,
    pub team: Option<String>,
    pub recommend_status: Option<RecommendStatus>,
    pub radar_status: Option<RadarStatus>,
    pub stage: Option<Stage>,
}

impl SolutionFilter {
    fn clauses(&self) -> (Vec<&'static str>, Vec<String>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if let Some(ref category) = self.category {
            clauses.push("category = ?");
            binds.push(category.clone());
        }
        if let Some(ref department) = self.department {
            clauses.push("department = ?");
            binds.push(department.clone());
        }
        if let Some(ref team) = self.team {
            clauses.push("team = ?");
            binds.push(team.clone());
        }
        if let Some(recommend_status) = self.recommend_status {
            clauses.push("recommend_status = ?");
            binds.push(recommend_status.as_str().to_string());
        }
        if let Some(radar_status) = self.radar_status {
            clauses.push("radar_status = ?");
            binds.push(radar_status.as_str().to_string());
        }
        if let Some(stage) = self.stage {
            clauses.push("stage = ?");
            binds.push(stage.as_str().to_string());
        }

        (clauses, binds)
    }
}

pub struct SolutionStorage {
    pool: SqlitePool,
}

impl SolutionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new solution.
    ///
    /// Generates a unique slug from the name, get-or-creates the referenced
    /// category and tags (bumping their usage counters), and defaults the
    /// maintainer identity from the acting user's record.
    pub async fn create(
        &self,
        input: SolutionCreateInput,
        actor: &str,
    ) -> StorageResult<Solution> {
        check_valid(validate_solution_create(&input))?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let slug = ensure_unique_slug(&mut tx, &generate_slug(&input.name), None).await?;
        debug!("Creating solution: {} (name: {})", slug, input.name);

        let category = match normalized(input.category.as_deref()) {
            Some(name) => {
                get_or_create_category(&mut tx, &name, actor, now).await?;
                bump_category_usage(&mut tx, &name, 1).await?;
                Some(name)
            }
            None => None,
        };

        let mut tags = Vec::new();
        for tag_name in dedup_tags(&input.tags) {
            get_or_create_tag(&mut tx, &tag_name, actor, now).await?;
            bump_tag_usage(&mut tx, &tag_name, 1).await?;
            tags.push(tag_name);
        }

        // Maintainer identity defaults to the acting user
        let actor_profile = fetch_user_profile(&mut tx, actor).await?;
        let maintainer_id = input.maintainer_id.or_else(|| Some(actor.to_string()));
        let maintainer_name = input
            .maintainer_name
            .or_else(|| actor_profile.as_ref().map(|(name, _)| name.clone()));
        let maintainer_email = input
            .maintainer_email
            .or_else(|| actor_profile.as_ref().map(|(_, email)| email.clone()));

        sqlx::query(
            r#"
            INSERT INTO solutions (
                slug, name, description, category, radar_status, stage,
                recommend_status, department, team, team_email,
                maintainer_id, maintainer_name, maintainer_email,
                official_website, documentation_url, demo_url, version,
                tags, pros, cons, created_at, created_by, updated_at, updated_by
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&slug)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&category)
        .bind(input.radar_status.as_str())
        .bind(input.stage.map(|s| s.as_str()))
        .bind(input.recommend_status.map(|s| s.as_str()))
        .bind(&input.department)
        .bind(&input.team)
        .bind(&input.team_email)
        .bind(&maintainer_id)
        .bind(&maintainer_name)
        .bind(&maintainer_email)
        .bind(&input.official_website)
        .bind(&input.documentation_url)
        .bind(&input.demo_url)
        .bind(&input.version)
        .bind(serde_json::to_string(&tags)?)
        .bind(serde_json::to_string(&input.pros)?)
        .bind(serde_json::to_string(&input.cons)?)
        .bind(now)
        .bind(actor)
        .bind(now)
        .bind(actor)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get_by_slug(&slug)
            .await?
            .ok_or(StorageError::NotFound("Solution"))
    }

    /// Get a solution by slug
    pub async fn get_by_slug(&self, slug: &str) -> StorageResult<Option<Solution>> {
        let row = sqlx::query("SELECT * FROM solutions WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(row_to_solution(&row)?)),
            None => Ok(None),
        }
    }

    /// List solutions with exact-match filters, sorting, and pagination.
    ///
    /// The total is computed as a separate query over the same filter, so it
    /// is not guaranteed consistent with the page under concurrent writes.
    pub async fn list(
        &self,
        filter: &SolutionFilter,
        skip: i64,
        limit: i64,
        sort: &str,
    ) -> StorageResult<(Vec<Solution>, i64)> {
        let (field, descending) = parse_sort(sort, SOLUTION_SORT_FIELDS)?;
        let (clauses, binds) = filter.clauses();

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM solutions {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let list_sql = format!(
            "SELECT * FROM solutions {} {} LIMIT ? OFFSET ?",
            where_clause,
            order_clause(field, descending)
        );
        let mut list_query = sqlx::query(&list_sql);
        for value in &binds {
            list_query = list_query.bind(value);
        }
        let rows = list_query
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let solutions = rows
            .iter()
            .map(row_to_solution)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok((solutions, total))
    }

    /// Partially update a solution by slug.
    ///
    /// Absent input fields keep their stored value; explicit nulls clear
    /// nullable fields. A name change regenerates the slug (keeping it
    /// unique) and carries the ratings keyed by the old slug along.
    pub async fn update_by_slug(
        &self,
        slug: &str,
        input: SolutionUpdateInput,
        actor: &str,
    ) -> StorageResult<Solution> {
        check_valid(validate_solution_update(&input))?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let existing = fetch_by_slug(&mut tx, slug)
            .await?
            .ok_or(StorageError::NotFound("Solution"))?;
        let mut updated = existing.clone();

        debug!("Updating solution: {}", slug);

        if let Some(name) = input.name {
            if name != updated.name {
                updated.slug =
                    ensure_unique_slug(&mut tx, &generate_slug(&name), Some(slug)).await?;
            }
            updated.name = name;
        }
        if let Some(description) = input.description {
            updated.description = description;
        }
        if let Some(category) = input.category {
            let desired = category.as_deref().and_then(|c| normalized(Some(c)));
            if desired != updated.category {
                if let Some(ref old) = updated.category {
                    bump_category_usage(&mut tx, old, -1).await?;
                }
                if let Some(ref new) = desired {
                    get_or_create_category(&mut tx, new, actor, now).await?;
                    bump_category_usage(&mut tx, new, 1).await?;
                }
                updated.category = desired;
            }
        }
        if let Some(radar_status) = input.radar_status {
            updated.radar_status = radar_status;
        }
        if let Some(stage) = input.stage {
            updated.stage = stage;
        }
        if let Some(recommend_status) = input.recommend_status {
            updated.recommend_status = recommend_status;
        }
        if let Some(department) = input.department {
            updated.department = department;
        }
        if let Some(team) = input.team {
            updated.team = team;
        }
        if let Some(team_email) = input.team_email {
            updated.team_email = team_email;
        }
        if let Some(maintainer_id) = input.maintainer_id {
            updated.maintainer_id = maintainer_id;
        }
        if let Some(maintainer_name) = input.maintainer_name {
            updated.maintainer_name = maintainer_name;
        }
        if let Some(maintainer_email) = input.maintainer_email {
            updated.maintainer_email = maintainer_email;
        }
        if let Some(official_website) = input.official_website {
            updated.official_website = official_website;
        }
        if let Some(documentation_url) = input.documentation_url {
            updated.documentation_url = documentation_url;
        }
        if let Some(demo_url) = input.demo_url {
            updated.demo_url = demo_url;
        }
        if let Some(version) = input.version {
            updated.version = version;
        }
        if let Some(tags) = input.tags {
            let new_tags = dedup_tags(&tags);
            let old_set: HashSet<&str> = updated.tags.iter().map(String::as_str).collect();
            let new_set: HashSet<&str> = new_tags.iter().map(String::as_str).collect();

            for removed in old_set.difference(&new_set) {
                bump_tag_usage(&mut tx, removed, -1).await?;
            }
            for added in new_set.difference(&old_set) {
                get_or_create_tag(&mut tx, added, actor, now).await?;
                bump_tag_usage(&mut tx, added, 1).await?;
            }
            updated.tags = new_tags;
        }
        if let Some(pros) = input.pros {
            updated.pros = pros;
        }
        if let Some(cons) = input.cons {
            updated.cons = cons;
        }

        updated.updated_at = now;
        updated.updated_by = Some(actor.to_string());

        sqlx::query(
            r#"
            UPDATE solutions SET
                slug = ?, name = ?, description = ?, category = ?,
                radar_status = ?, stage = ?, recommend_status = ?,
                department = ?, team = ?, team_email = ?,
                maintainer_id = ?, maintainer_name = ?, maintainer_email = ?,
                official_website = ?, documentation_url = ?, demo_url = ?,
                version = ?, tags = ?, pros = ?, cons = ?,
                updated_at = ?, updated_by = ?
            WHERE slug = ?
            "#,
        )
        .bind(&updated.slug)
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(&updated.category)
        .bind(updated.radar_status.as_str())
        .bind(updated.stage.map(|s| s.as_str()))
        .bind(updated.recommend_status.map(|s| s.as_str()))
        .bind(&updated.department)
        .bind(&updated.team)
        .bind(&updated.team_email)
        .bind(&updated.maintainer_id)
        .bind(&updated.maintainer_name)
        .bind(&updated.maintainer_email)
        .bind(&updated.official_website)
        .bind(&updated.documentation_url)
        .bind(&updated.demo_url)
        .bind(&updated.version)
        .bind(serde_json::to_string(&updated.tags)?)
        .bind(serde_json::to_string(&updated.pros)?)
        .bind(serde_json::to_string(&updated.cons)?)
        .bind(now)
        .bind(actor)
        .bind(slug)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if updated.slug != slug {
            sqlx::query("UPDATE ratings SET solution_slug = ? WHERE solution_slug = ?")
                .bind(&updated.slug)
                .bind(slug)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get_by_slug(&updated.slug)
            .await?
            .ok_or(StorageError::NotFound("Solution"))
    }

    /// Delete a solution by slug, along with its ratings.
    /// Returns false when no solution matched.
    pub async fn delete_by_slug(&self, slug: &str) -> StorageResult<bool> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let existing = match fetch_by_slug(&mut tx, slug).await? {
            Some(solution) => solution,
            None => return Ok(false),
        };

        debug!("Deleting solution: {}", slug);

        if let Some(ref category) = existing.category {
            bump_category_usage(&mut tx, category, -1).await?;
        }
        for tag in &existing.tags {
            bump_tag_usage(&mut tx, tag, -1).await?;
        }

        sqlx::query("DELETE FROM ratings WHERE solution_slug = ?")
            .bind(slug)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM solutions WHERE slug = ?")
            .bind(slug)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(true)
    }

    /// List the distinct department names across all solutions
    pub async fn departments(&self) -> StorageResult<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT department FROM solutions WHERE department != '' ORDER BY department",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(rows)
    }

    /// Build the tech radar dataset from solutions joined to their
    /// categories. Solutions without a category, or whose category is not
    /// placed on a quadrant, are skipped.
    pub async fn tech_radar(&self) -> StorageResult<RadarData> {
        let rows = sqlx::query(
            r#"
            SELECT s.name, s.radar_status, c.radar_quadrant
            FROM solutions s
            JOIN categories c ON s.category = c.name
            WHERE c.radar_quadrant >= 0
            ORDER BY s.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let status: String = row.try_get("radar_status")?;
            let radar_status = RadarStatus::from_str(&status)
                .map_err(StorageError::Database)?;
            entries.push(RadarEntry {
                quadrant: row.try_get("radar_quadrant")?,
                ring: radar_status.ring(),
                label: row.try_get("name")?,
                active: true,
                moved: 0,
            });
        }

        Ok(RadarData::current(entries))
    }

    /// Recompute category and tag usage counters from the solutions table.
    ///
    /// The incremental counters are best-effort; this reconciliation pass
    /// restores them to the true referencing-solution counts.
    pub async fn recount_usage(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE categories SET usage_count =
                (SELECT COUNT(*) FROM solutions WHERE solutions.category = categories.name)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        sqlx::query(
            r#"
            UPDATE tags SET usage_count =
                (SELECT COUNT(*) FROM solutions WHERE EXISTS
                    (SELECT 1 FROM json_each(solutions.tags)
                     WHERE json_each.value = tags.name))
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(())
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Deduplicate tag names preserving payload order
fn dedup_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

async fn fetch_by_slug(
    conn: &mut SqliteConnection,
    slug: &str,
) -> StorageResult<Option<Solution>> {
    let row = sqlx::query("SELECT * FROM solutions WHERE slug = ?")
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    match row {
        Some(row) => Ok(Some(row_to_solution(&row)?)),
        None => Ok(None),
    }
}

/// Ensure a slug is unique, appending a numeric suffix when taken
async fn ensure_unique_slug(
    conn: &mut SqliteConnection,
    base: &str,
    exclude_slug: Option<&str>,
) -> StorageResult<String> {
    let base = if base.is_empty() { "solution" } else { base };
    let mut candidate = base.to_string();
    let mut counter = 1;

    loop {
        let taken: Option<String> =
            sqlx::query_scalar("SELECT slug FROM solutions WHERE slug = ? AND slug != ?")
                .bind(&candidate)
                .bind(exclude_slug.unwrap_or(""))
                .fetch_optional(&mut *conn)
                .await
                .map_err(StorageError::Sqlx)?;

        if taken.is_none() {
            return Ok(candidate);
        }
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }
}

async fn get_or_create_category(
    conn: &mut SqliteConnection,
    name: &str,
    actor: &str,
    now: DateTime<Utc>,
) -> StorageResult<()> {
    let existing: Option<String> = sqlx::query_scalar("SELECT name FROM categories WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    if existing.is_none() {
        debug!("Auto-creating category: {}", name);
        sqlx::query(
            r#"
            INSERT INTO categories (name, description, radar_quadrant, usage_count,
                                    created_at, created_by, updated_at, updated_by)
            VALUES (?, ?, -1, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(format!("Category for {}", name))
        .bind(now)
        .bind(actor)
        .bind(now)
        .bind(actor)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;
    }

    Ok(())
}

async fn get_or_create_tag(
    conn: &mut SqliteConnection,
    name: &str,
    actor: &str,
    now: DateTime<Utc>,
) -> StorageResult<()> {
    let existing: Option<String> = sqlx::query_scalar("SELECT name FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    if existing.is_none() {
        debug!("Auto-creating tag: {}", name);
        sqlx::query(
            r#"
            INSERT INTO tags (name, description, usage_count,
                              created_at, created_by, updated_at, updated_by)
            VALUES (?, ?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(format!("Tag for {}", name))
        .bind(now)
        .bind(actor)
        .bind(now)
        .bind(actor)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;
    }

    Ok(())
}

async fn bump_category_usage(
    conn: &mut SqliteConnection,
    name: &str,
    delta: i64,
) -> StorageResult<()> {
    sqlx::query("UPDATE categories SET usage_count = MAX(usage_count + ?, 0) WHERE name = ?")
        .bind(delta)
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;
    Ok(())
}

async fn bump_tag_usage(conn: &mut SqliteConnection, name: &str, delta: i64) -> StorageResult<()> {
    sqlx::query("UPDATE tags SET usage_count = MAX(usage_count + ?, 0) WHERE name = ?")
        .bind(delta)
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;
    Ok(())
}

async fn fetch_user_profile(
    conn: &mut SqliteConnection,
    username: &str,
) -> StorageResult<Option<(String, String)>> {
    let row = sqlx::query("SELECT full_name, email FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    match row {
        Some(row) => Ok(Some((row.try_get("full_name")?, row.try_get("email")?))),
        None => Ok(None),
    }
}

/// Convert a database row to a Solution
pub(crate) fn row_to_solution(row: &SqliteRow) -> StorageResult<Solution> {
    let tags_json: String = row.try_get("tags")?;
    let pros_json: String = row.try_get("pros")?;
    let cons_json: String = row.try_get("cons")?;

    let radar_status_str: String = row.try_get("radar_status")?;
    let radar_status =
        RadarStatus::from_str(&radar_status_str).map_err(StorageError::Database)?;

    let stage = row
        .try_get::<Option<String>, _>("stage")?
        .map(|s| Stage::from_str(&s).map_err(StorageError::Database))
        .transpose()?;

    let recommend_status = row
        .try_get::<Option<String>, _>("recommend_status")?
        .map(|s| RecommendStatus::from_str(&s).map_err(StorageError::Database))
        .transpose()?;

    Ok(Solution {
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        radar_status,
        stage,
        recommend_status,
        department: row.try_get("department")?,
        team: row.try_get("team")?,
        team_email: row.try_get("team_email")?,
        maintainer_id: row.try_get("maintainer_id")?,
        maintainer_name: row.try_get("maintainer_name")?,
        maintainer_email: row.try_get("maintainer_email")?,
        official_website: row.try_get("official_website")?,
        documentation_url: row.try_get("documentation_url")?,
        demo_url: row.try_get("demo_url")?,
        version: row.try_get("version")?,
        tags: serde_json::from_str(&tags_json)?,
        pros: serde_json::from_str(&pros_json)?,
        cons: serde_json::from_str(&cons_json)?,
        created_at: row.try_get("created_at")?,
        created_by: row.try_get("created_by")?,
        updated_at: row.try_get("updated_at")?,
        updated_by: row.try_get("updated_by")?,
    })
}
