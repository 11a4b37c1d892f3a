//! Email verification code repository.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use commerce_core::{Email, VerifyEmailId};

use super::RepositoryError;
use crate::models::{NewVerifyEmail, VerifyEmail};

/// Length of generated secret codes.
pub const SECRET_CODE_LENGTH: usize = 32;

const VERIFY_EMAIL_COLUMNS: &str =
    "id, username, email, secret_code, is_used, created_at, expired_at";

/// Why a verification code could not be redeemed.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// No code with this ID and secret exists.
    #[error("verification code not found")]
    NotFound,

    #[error("verification code already used")]
    AlreadyUsed,

    #[error("verification code expired")]
    Expired,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for VerifyError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct VerifyEmailRow {
    id: VerifyEmailId,
    username: String,
    email: String,
    secret_code: String,
    is_used: bool,
    created_at: DateTime<Utc>,
    expired_at: DateTime<Utc>,
}

impl TryFrom<VerifyEmailRow> for VerifyEmail {
    type Error = RepositoryError;

    fn try_from(row: VerifyEmailRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username: row.username,
            email,
            secret_code: row.secret_code,
            is_used: row.is_used,
            created_at: row.created_at,
            expired_at: row.expired_at,
        })
    }
}

/// Generate a random alphanumeric secret code.
fn generate_secret_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_CODE_LENGTH)
        .map(char::from)
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for email verification codes.
pub struct VerifyEmailRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VerifyEmailRepository<'a> {
    /// Create a new verification code repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Issue a fresh code for a user, valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Constraint` if the user does not exist.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create(
        &self,
        request: &NewVerifyEmail,
        ttl: Duration,
    ) -> Result<VerifyEmail, RepositoryError> {
        let sql = format!(
            "INSERT INTO verify_emails (username, email, secret_code, expired_at)
             VALUES ($1, $2, $3, now() + make_interval(secs => $4))
             RETURNING {VERIFY_EMAIL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, VerifyEmailRow>(&sql)
            .bind(&request.username)
            .bind(request.email.as_str())
            .bind(generate_secret_code())
            .bind(ttl.as_secs_f64())
            .fetch_one(self.pool)
            .await?;

        tracing::info!(verify_email_id = %row.id, "Verification code issued");
        row.try_into()
    }

    /// Get a verification code by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: VerifyEmailId,
    ) -> Result<Option<VerifyEmail>, RepositoryError> {
        let sql = format!("SELECT {VERIFY_EMAIL_COLUMNS} FROM verify_emails WHERE id = $1");
        let row = sqlx::query_as::<_, VerifyEmailRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Redeem a code. Succeeds at most once per code, and only before it
    /// expires.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::NotFound` if the ID and secret do not match,
    /// `VerifyError::AlreadyUsed` or `VerifyError::Expired` if the code can
    /// no longer be redeemed.
    #[instrument(skip(self, secret_code), fields(verify_email_id = %id))]
    pub async fn consume(
        &self,
        id: VerifyEmailId,
        secret_code: &str,
    ) -> Result<VerifyEmail, VerifyError> {
        let sql = format!(
            "UPDATE verify_emails SET is_used = TRUE
             WHERE id = $1 AND secret_code = $2 AND NOT is_used AND expired_at >= now()
             RETURNING {VERIFY_EMAIL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, VerifyEmailRow>(&sql)
            .bind(id)
            .bind(secret_code)
            .fetch_optional(self.pool)
            .await?;

        if let Some(row) = row {
            tracing::info!("Verification code redeemed");
            return Ok(row.try_into()?);
        }

        // Nothing updated: work out why
        match self.get_by_id(id).await? {
            Some(existing) if existing.secret_code == secret_code => {
                if existing.is_used {
                    Err(VerifyError::AlreadyUsed)
                } else {
                    Err(VerifyError::Expired)
                }
            }
            _ => Err(VerifyError::NotFound),
        }
    }
}
