use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::User;

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub user_name: String,
    pub password: String,
    pub email: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_login_time: Option<OffsetDateTime>,
}

/// Request body for `PUT /users/{id}`. A blank or missing password keeps the
/// current one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_name: String,
    #[serde(default)]
    pub password: Option<String>,
    pub email: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_login_time: Option<OffsetDateTime>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_time: Option<OffsetDateTime>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            user_name: u.user_name,
            email: u.email,
            last_login_time: u.last_login_time,
        }
    }
}
