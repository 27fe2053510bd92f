use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    /// Stand-in hash verified when the username is unknown.
    static ref DUMMY_HASH: String = hash_password("unknown-user-0").unwrap_or_default();
}

/// Outcome of checking a login attempt against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordVerification {
    Success,
    Failed,
}

/// Argon2id with a fresh random salt. The result is a PHC string that carries
/// its own salt and parameters.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Digest comparison inside argon2 is constant time.
pub fn verify_password(attempt: &str, stored_hash: &str) -> anyhow::Result<PasswordVerification> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(
        match Argon2::default().verify_password(attempt.as_bytes(), &parsed) {
            Ok(()) => PasswordVerification::Success,
            Err(_) => PasswordVerification::Failed,
        },
    )
}

/// Runs a full argon2 verification for a login whose user does not exist.
/// Always fails.
pub fn verify_unknown_user(attempt: &str) -> PasswordVerification {
    if let Err(e) = verify_password(attempt, &DUMMY_HASH) {
        error!(error = %e, "dummy hash verification error");
    }
    PasswordVerification::Failed
}
