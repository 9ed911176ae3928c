// ABOUTME: User storage layer using SQLite
// ABOUTME: Account CRUD, argon2 password hashing, default admin bootstrap

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

use compass_core::{
    validate_user_create, validate_user_update, User, UserCreateInput, UserRecord,
    UserUpdateInput, ValidationError,
};

use crate::{check_valid, order_clause, parse_sort, StorageError, StorageResult};

/// Fields accepted by the user list sort parameter
pub const USER_SORT_FIELDS: &[&str] = &["username", "email", "created_at", "updated_at"];

pub struct UserStorage {
    pool: SqlitePool,
}

impl UserStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user account
    pub async fn create(&self, input: UserCreateInput, actor: &str) -> StorageResult<User> {
        check_valid(validate_user_create(&input))?;

        let username = input.username.trim().to_string();
        let existing: Option<String> =
            sqlx::query_scalar("SELECT username FROM users WHERE username = ?")
                .bind(&username)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;
        if existing.is_some() {
            return Err(StorageError::Conflict(format!(
                "User '{}' already exists",
                username
            )));
        }

        debug!("Creating user: {}", username);
        let hashed_password = hash_password(&input.password)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (username, email, full_name, hashed_password,
                               is_active, is_superuser,
                               created_at, created_by, updated_at, updated_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&username)
        .bind(&input.email)
        .bind(&input.full_name)
        .bind(&hashed_password)
        .bind(input.is_active)
        .bind(input.is_superuser)
        .bind(now)
        .bind(actor)
        .bind(now)
        .bind(actor)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let record = self
            .get_by_username(&username)
            .await?
            .ok_or(StorageError::NotFound("User"))?;
        Ok(record.into())
    }

    /// Get a user record (including the password hash) by username
    pub async fn get_by_username(&self, username: &str) -> StorageResult<Option<UserRecord>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(row_to_user_record(&row)?)),
            None => Ok(None),
        }
    }

    /// List users with sorting and pagination
    pub async fn list(&self, skip: i64, limit: i64, sort: &str) -> StorageResult<(Vec<User>, i64)> {
        let (field, descending) = parse_sort(sort, USER_SORT_FIELDS)?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let sql = format!(
            "SELECT * FROM users {} LIMIT ? OFFSET ?",
            order_clause(field, descending)
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let users = rows
            .iter()
            .map(|row| row_to_user_record(row).map(User::from))
            .collect::<StorageResult<Vec<_>>>()?;

        Ok((users, total))
    }

    /// Partially update a user by username. Usernames are immutable.
    pub async fn update_by_username(
        &self,
        username: &str,
        input: UserUpdateInput,
        actor: &str,
    ) -> StorageResult<User> {
        check_valid(validate_user_update(&input))?;

        let mut record = self
            .get_by_username(username)
            .await?
            .ok_or(StorageError::NotFound("User"))?;

        if let Some(email) = input.email {
            record.email = email;
        }
        if let Some(full_name) = input.full_name {
            record.full_name = full_name;
        }
        if let Some(is_active) = input.is_active {
            record.is_active = is_active;
        }
        if let Some(is_superuser) = input.is_superuser {
            record.is_superuser = is_superuser;
        }

        let now = Utc::now();
        record.updated_at = now;
        record.updated_by = Some(actor.to_string());

        sqlx::query(
            r#"
            UPDATE users SET email = ?, full_name = ?, is_active = ?, is_superuser = ?,
                             updated_at = ?, updated_by = ?
            WHERE username = ?
            "#,
        )
        .bind(&record.email)
        .bind(&record.full_name)
        .bind(record.is_active)
        .bind(record.is_superuser)
        .bind(now)
        .bind(actor)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(record.into())
    }

    /// Delete a user by username. Returns false when no user matched.
    pub async fn delete_by_username(&self, username: &str) -> StorageResult<bool> {
        debug!("Deleting user: {}", username);

        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    /// Change a user's password after verifying the current one
    pub async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> StorageResult<()> {
        if new_password.is_empty() {
            return Err(StorageError::Validation(ValidationError::new(
                "new_password",
                "Password is required",
            )));
        }

        let record = self
            .get_by_username(username)
            .await?
            .ok_or(StorageError::NotFound("User"))?;

        if !verify_password(current_password, &record.hashed_password)? {
            return Err(StorageError::Conflict(
                "Current password is incorrect".to_string(),
            ));
        }

        let hashed_password = hash_password(new_password)?;
        let now = Utc::now();

        sqlx::query(
            "UPDATE users SET hashed_password = ?, updated_at = ?, updated_by = ? WHERE username = ?",
        )
        .bind(&hashed_password)
        .bind(now)
        .bind(username)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        info!("Password changed for user: {}", username);
        Ok(())
    }

    /// Verify a username/password pair against the stored hash.
    /// Inactive accounts never authenticate.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> StorageResult<Option<User>> {
        let record = match self.get_by_username(username).await? {
            Some(record) => record,
            None => return Ok(None),
        };

        if !record.is_active {
            return Ok(None);
        }

        if verify_password(password, &record.hashed_password)? {
            Ok(Some(record.into()))
        } else {
            Ok(None)
        }
    }

    /// Create the default admin account if no users exist yet
    pub async fn ensure_default_admin(
        &self,
        username: &str,
        password: &str,
    ) -> StorageResult<()> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if count > 0 {
            return Ok(());
        }

        warn!("No users found, creating default admin '{}'", username);

        self.create(
            UserCreateInput {
                username: username.to_string(),
                email: format!("{}@localhost", username),
                full_name: "Administrator".to_string(),
                password: password.to_string(),
                is_active: true,
                is_superuser: true,
            },
            "system",
        )
        .await?;

        Ok(())
    }
}

/// Hash a password with argon2id and a fresh random salt
pub fn hash_password(password: &str) -> StorageResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StorageError::Database(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password: &str, hashed: &str) -> StorageResult<bool> {
    let parsed = PasswordHash::new(hashed)
        .map_err(|e| StorageError::Database(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Convert a database row to a UserRecord
fn row_to_user_record(row: &SqliteRow) -> StorageResult<UserRecord> {
    Ok(UserRecord {
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        hashed_password: row.try_get("hashed_password")?,
        is_active: row.try_get("is_active")?,
        is_superuser: row.try_get("is_superuser")?,
        created_at: row.try_get("created_at")?,
        created_by: row.try_get("created_by")?,
        updated_at: row.try_get("updated_at")?,
        updated_by: row.try_get("updated_by")?,
    })
}
