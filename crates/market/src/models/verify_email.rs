//! Email verification codes.

use chrono::{DateTime, Utc};

use commerce_core::{Email, VerifyEmailId};

/// A one-time email verification code (domain type).
///
/// Implements `Debug` manually to redact the secret code.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyEmail {
    pub id: VerifyEmailId,
    pub username: String,
    pub email: Email,
    pub secret_code: String,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

impl VerifyEmail {
    /// Whether the code can still be redeemed at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && now <= self.expired_at
    }
}

impl std::fmt::Debug for VerifyEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyEmail")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("secret_code", &"[REDACTED]")
            .field("is_used", &self.is_used)
            .field("created_at", &self.created_at)
            .field("expired_at", &self.expired_at)
            .finish()
    }
}

/// Input for issuing a verification code.
#[derive(Debug, Clone)]
pub struct NewVerifyEmail {
    pub username: String,
    pub email: Email,
}
