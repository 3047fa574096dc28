use crate::error::{AppError, Result};

/// Upper bound on a submitted username.
const MAX_USERNAME_LEN: usize = 255;
/// Upper bound on a submitted password.
const MAX_PASSWORD_LEN: usize = 128;

/// Bounds the size of a login form before any credential check.
///
/// Oversized input is rejected exactly like a wrong password, so the
/// form never learns more than "login rejected". Empty fields are left to
/// the credential verifier, which rejects them the same way.
///
/// # Arguments
///
/// * `username` - The submitted username.
/// * `password` - The submitted password.
///
/// # Returns
///
/// A `Result<()>`, `CredentialInvalid` when either field is oversized.
pub fn validate_login(username: &str, password: &str) -> Result<()> {
    if username.len() > MAX_USERNAME_LEN || password.len() > MAX_PASSWORD_LEN {
        tracing::debug!("Login form exceeds field limits");
        return Err(AppError::CredentialInvalid);
    }

    Ok(())
}
