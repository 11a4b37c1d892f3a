//! User repository.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use commerce_core::{Document, Email, Metadata, UserId};

use super::RepositoryError;
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, username, full_name, email, password_changed_at, \
     private_metadata, public_metadata, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    full_name: String,
    email: String,
    password_changed_at: DateTime<Utc>,
    private_metadata: Json<Metadata>,
    public_metadata: Json<Metadata>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let private_metadata = row.private_metadata.0;
        let public_metadata = row.public_metadata.0;
        for metadata in [&private_metadata, &public_metadata] {
            metadata.validate().map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid metadata in database: {e}"))
            })?;
        }

        Ok(Self {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            email,
            password_changed_at: row.password_changed_at,
            private_metadata,
            public_metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a user with empty metadata.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    #[instrument(skip(self, user), fields(username = %user.username()))]
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (username, password, full_name, email)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.username())
            .bind(user.password_hash().expose_secret())
            .bind(user.full_name())
            .bind(user.email().as_str())
            .fetch_one(self.pool)
            .await?;

        tracing::info!(user_id = %row.id, "User created");
        row.try_into()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, SecretString)>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS}, password FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserWithPasswordRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        row.map(|row| {
            let user = User::try_from(row.user)?;
            Ok((user, SecretString::from(row.password)))
        })
        .transpose()
    }

    /// Replace the password hash and stamp `password_changed_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self, password_hash), fields(user_id = %id))]
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &SecretString,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE users SET password = $2, password_changed_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(password_hash.expose_secret())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Replace public and/or private metadata. `None` leaves a side untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Constraint` if a metadata document is invalid.
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self, public, private), fields(user_id = %id))]
    pub async fn update_metadata(
        &self,
        id: UserId,
        public: Option<&Metadata>,
        private: Option<&Metadata>,
    ) -> Result<User, RepositoryError> {
        for metadata in public.iter().chain(private.iter()) {
            metadata
                .validate()
                .map_err(|e| RepositoryError::Constraint(e.to_string()))?;
        }

        let sql = format!(
            "UPDATE users
             SET public_metadata = COALESCE($2, public_metadata),
                 private_metadata = COALESCE($3, private_metadata)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(public.map(Json))
            .bind(private.map(Json))
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
