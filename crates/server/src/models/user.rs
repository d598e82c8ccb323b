use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::ValidationError;

pub type UserId = i32;
const USER_DISPLAY_NAME_LENGTH_LIMIT: usize = 30;
const USER_ALIAS_LENGTH_LIMIT: usize = 30;
const USER_PASSWORD_MIN_LENGTH: usize = 8;
const USER_PASSWORD_MAX_LENGTH: usize = 80;

#[derive(Clone, Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user_id: UserId,
    pub alias: String,
    pub role: UserRole,
    pub is_admin: bool,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Display, Serialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Regular,
}

#[derive(Clone, Debug)]
pub struct CreateUserRequest {
    pub alias: String,
    pub display_name: String,
    pub role: UserRole,
    /// PHC formatted argon2 hash.
    pub password_hash: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GetUserCredentialsByAliasResponse {
    pub user_id: UserId,
    pub password_hash: String,
}

/// Self-service sign up. New accounts are always regular users.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub alias: String,
    pub display_name: String,
    pub password: String,
}

pub fn validate_user_alias(alias: &str) -> Result<(), ValidationError> {
    for ch in alias.chars() {
        if !(ch.is_alphanumeric() || ch == '_') {
            return Err(ValidationError::InvalidInput {
                value: alias.to_string(),
                reason: "alias can only contain letters, numbers and underscores".to_string(),
            });
        }
    }
    if alias.is_empty() {
        return Err(ValidationError::InvalidInput {
            value: alias.to_string(),
            reason: "user alias cannot be empty".to_string(),
        });
    }
    if alias.len() > USER_ALIAS_LENGTH_LIMIT {
        return Err(ValidationError::InvalidInput {
            value: alias.to_string(),
            reason: format!(
                "user alias cannot be longer than {} chars",
                USER_ALIAS_LENGTH_LIMIT
            ),
        });
    }
    Ok(())
}

pub fn validate_user_display_name(display_name: &str) -> Result<(), ValidationError> {
    if display_name.trim().len() != display_name.len() {
        return Err(ValidationError::InvalidInput {
            value: display_name.to_string(),
            reason: "user display name cannot be surrounded with whitespace characters".to_string(),
        });
    }
    if display_name.is_empty() {
        return Err(ValidationError::InvalidInput {
            value: display_name.to_string(),
            reason: "user display name cannot be empty".to_string(),
        });
    }
    if display_name.len() > USER_DISPLAY_NAME_LENGTH_LIMIT {
        return Err(ValidationError::InvalidInput {
            value: display_name.to_string(),
            reason: format!(
                "user display name cannot be longer than {} chars",
                USER_DISPLAY_NAME_LENGTH_LIMIT
            ),
        });
    }
    Ok(())
}

pub fn validate_user_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < USER_PASSWORD_MIN_LENGTH || password.len() > USER_PASSWORD_MAX_LENGTH {
        return Err(ValidationError::InvalidInput {
            value: "<password>".to_string(),
            reason: format!(
                "password should be at least {} and at most {} characters long",
                USER_PASSWORD_MIN_LENGTH, USER_PASSWORD_MAX_LENGTH
            ),
        });
    }
    Ok(())
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_alias(&self.alias)?;
        validate_user_display_name(&self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_rejects_symbols_and_length() {
        validate_user_alias("origin_admin").unwrap();
        assert!(validate_user_alias("").is_err());
        assert!(validate_user_alias("bad alias").is_err());
        assert!(validate_user_alias(&"a".repeat(USER_ALIAS_LENGTH_LIMIT + 1)).is_err());
    }

    #[test]
    fn display_name_rejects_padding() {
        validate_user_display_name("Origin User").unwrap();
        assert!(validate_user_display_name(" Origin").is_err());
        assert!(validate_user_display_name("").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_user_password("short").is_err());
        validate_user_password("changepassword").unwrap();
        assert!(validate_user_password(&"p".repeat(USER_PASSWORD_MAX_LENGTH + 1)).is_err());
    }
}
