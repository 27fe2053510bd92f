use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::dto::{CreateUserRequest, UpdateUserRequest};
use super::repo_types::{NewUser, User};
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const DUPLICATE_USER: &str = "Username or email already exists.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_user_name(user_name: &str) -> AppResult<()> {
    let len = user_name.chars().count();
    if !(5..=50).contains(&len) {
        return Err(AppError::InvalidPayload(
            "Username must be between 5 and 50 characters long.".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> AppResult<()> {
    if !is_valid_email(email) {
        return Err(AppError::InvalidPayload("Invalid email".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(6..=100).contains(&len) || !has_letter || !has_digit {
        return Err(AppError::InvalidPayload(
            "Password must contain letters and numbers and be at least 6 characters long.".into(),
        ));
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn list_users(st: &AppState) -> AppResult<Vec<User>> {
    st.users.list().await
}

pub async fn get_user(st: &AppState, id: i64) -> AppResult<Option<User>> {
    st.users.find_by_id(id).await
}

pub async fn create_user(st: &AppState, req: CreateUserRequest) -> AppResult<User> {
    let user_name = req.user_name.trim().to_string();
    let email = normalize_email(&req.email);
    validate_user_name(&user_name)?;
    validate_email(&email)?;
    validate_password(&req.password)?;

    if st.users.user_name_taken(&user_name, None).await?
        || st.users.email_taken(&email, None).await?
    {
        warn!(user_name = %user_name, "username or email already registered");
        return Err(AppError::DuplicateField(DUPLICATE_USER.into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = st
        .users
        .insert(NewUser {
            user_name,
            password_hash,
            email,
            last_login_time: req.last_login_time,
        })
        .await?;

    info!(user_id = user.id, user_name = %user.user_name, "user created");
    Ok(user)
}

/// Replaces username and email, re-hashing the password only when a new
/// non-blank one is supplied.
pub async fn update_user(st: &AppState, id: i64, req: UpdateUserRequest) -> AppResult<User> {
    let mut existing = st
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with ID {id} not found.")))?;

    let user_name = req.user_name.trim().to_string();
    let email = normalize_email(&req.email);
    validate_user_name(&user_name)?;
    validate_email(&email)?;

    let name_clash =
        user_name != existing.user_name && st.users.user_name_taken(&user_name, Some(id)).await?;
    let email_clash = email != existing.email && st.users.email_taken(&email, Some(id)).await?;
    if name_clash || email_clash {
        warn!(user_id = id, "update collides with another user");
        return Err(AppError::DuplicateField(DUPLICATE_USER.into()));
    }

    if let Some(password) = req.password.as_deref().filter(|p| !p.trim().is_empty()) {
        validate_password(password)?;
        existing.password_hash = hash_password(password)?;
    }
    existing.user_name = user_name;
    existing.email = email;
    if req.last_login_time.is_some() {
        existing.last_login_time = req.last_login_time;
    }

    let user = st.users.update(&existing).await?;
    info!(user_id = user.id, "user updated");
    Ok(user)
}

pub async fn delete_user(st: &AppState, id: i64) -> AppResult<()> {
    if !st.users.delete(id).await? {
        return Err(AppError::NotFound(format!("User with ID {id} not found.")));
    }
    info!(user_id = id, "user deleted");
    Ok(())
}
