use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::repo_types::{NewUser, User};
use crate::error::{AppError, AppResult};

/// Credential store. `*_taken` checks skip the record with id `except`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<User>>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;
    async fn find_by_user_name(&self, user_name: &str) -> AppResult<Option<User>>;
    async fn user_name_taken(&self, user_name: &str, except: Option<i64>) -> AppResult<bool>;
    async fn email_taken(&self, email: &str, except: Option<i64>) -> AppResult<bool>;
    async fn insert(&self, user: NewUser) -> AppResult<User>;
    /// Overwrites every column of the row with `user.id`.
    async fn update(&self, user: &User) -> AppResult<User>;
    async fn record_login(&self, id: i64, at: OffsetDateTime) -> AppResult<()>;
    /// Returns false when there was nothing to delete.
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_name, password_hash, email, last_login_time
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_name, password_hash, email, last_login_time
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_user_name(&self, user_name: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_name, password_hash, email, last_login_time
            FROM users
            WHERE user_name = $1
            "#,
        )
        .bind(user_name)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn user_name_taken(&self, user_name: &str, except: Option<i64>) -> AppResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE user_name = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(user_name)
        .bind(except)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }

    async fn email_taken(&self, email: &str, except: Option<i64>) -> AppResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE email = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_name, password_hash, email, last_login_time)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_name, password_hash, email, last_login_time
            "#,
        )
        .bind(user.user_name)
        .bind(user.password_hash)
        .bind(user.email)
        .bind(user.last_login_time)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET user_name = $2, password_hash = $3, email = $4, last_login_time = $5
             WHERE id = $1
            RETURNING id, user_name, password_hash, email, last_login_time
            "#,
        )
        .bind(user.id)
        .bind(&user.user_name)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(user.last_login_time)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found.", user.id)))
    }

    async fn record_login(&self, id: i64, at: OffsetDateTime) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_time = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
