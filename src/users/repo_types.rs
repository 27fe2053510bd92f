use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub password_hash: String, // Argon2 PHC string, never leaves the server
    pub email: String,
    pub last_login_time: Option<OffsetDateTime>,
}

/// Insert payload. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub password_hash: String,
    pub email: String,
    pub last_login_time: Option<OffsetDateTime>,
}
