//! Mutations that span the database and the upload provider.

pub mod products;

use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationError;
use crate::uploads::UploadError;

pub use products::{UpdateProduct, update_product};

/// Errors returned by actions.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Input was rejected; the message is meant for the end user.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to delete images: {0}")]
    Upload(#[from] UploadError),
}

impl From<sqlx::Error> for ActionError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

impl ActionError {
    /// Message safe to show to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Repository(RepositoryError::Conflict(detail)) => {
                format!("Could not save: {detail}.")
            }
            Self::Repository(RepositoryError::NotFound) => "Product not found.".to_string(),
            Self::Repository(_) | Self::Upload(_) => {
                "Something went wrong. Please try again later.".to_string()
            }
        }
    }
}
