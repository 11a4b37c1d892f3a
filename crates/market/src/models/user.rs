//! User domain types.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;

use commerce_core::{Email, Metadata, UserId};

use super::{ValidationError, required_text};

/// A user account (domain type).
///
/// The password hash is never loaded into this type; see
/// [`UserRepository::get_password_hash`](crate::db::UserRepository::get_password_hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    pub full_name: String,
    pub email: Email,
    /// When the password was last set.
    pub password_changed_at: DateTime<Utc>,
    /// Metadata only the server reads.
    #[serde(skip)]
    pub private_metadata: Metadata,
    /// Metadata safe to expose to the user.
    pub public_metadata: Metadata,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    username: String,
    full_name: String,
    email: Email,
    password_hash: SecretString,
}

impl NewUser {
    /// Validate a new account.
    ///
    /// Usernames may not contain whitespace or `:`, the separator of
    /// unique store codes.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any field is blank, too long, or the
    /// username contains forbidden characters.
    pub fn new(
        username: &str,
        full_name: &str,
        email: Email,
        password_hash: SecretString,
    ) -> Result<Self, ValidationError> {
        let username = required_text("username", username)?;
        if username.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(ValidationError::InvalidCharacters { field: "username" });
        }
        Ok(Self {
            username,
            full_name: required_text("full name", full_name)?,
            email,
            password_hash,
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub const fn password_hash(&self) -> &SecretString {
        &self.password_hash
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("jane@example.com").unwrap()
    }

    fn hash() -> SecretString {
        SecretString::from("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA")
    }

    #[test]
    fn test_new_user() {
        let user = NewUser::new(" jane ", "Jane Doe", email(), hash()).unwrap();
        assert_eq!(user.username(), "jane");
        assert_eq!(user.full_name(), "Jane Doe");
    }

    #[test]
    fn test_new_user_rejects_separator() {
        assert_eq!(
            NewUser::new("ja:ne", "Jane", email(), hash()).unwrap_err(),
            ValidationError::InvalidCharacters { field: "username" }
        );
        assert!(NewUser::new("ja ne", "Jane", email(), hash()).is_err());
        assert!(NewUser::new("jane", " ", email(), hash()).is_err());
    }

    #[test]
    fn test_debug_hides_password_hash() {
        let user = NewUser::new("jane", "Jane", email(), hash()).unwrap();
        assert!(!format!("{user:?}").contains("argon2id"));
    }
}
