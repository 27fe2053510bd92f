use time::OffsetDateTime;
use tracing::{info, warn};

use super::password::{verify_password, verify_unknown_user, PasswordVerification};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::users::repo_types::User;

/// Checks a username/password pair. Unknown users and wrong passwords both
/// fail with `InvalidCredentials`. On success the last login time is stamped.
pub async fn authenticate(st: &AppState, user_name: &str, password: &str) -> AppResult<User> {
    let Some(mut user) = st.users.find_by_user_name(user_name).await? else {
        verify_unknown_user(password);
        warn!(user_name = %user_name, "login unknown user");
        return Err(AppError::InvalidCredentials);
    };

    if verify_password(password, &user.password_hash)? != PasswordVerification::Success {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let now = OffsetDateTime::now_utc();
    st.users.record_login(user.id, now).await?;
    user.last_login_time = Some(now);

    info!(user_id = user.id, user_name = %user.user_name, "user logged in");
    Ok(user)
}
