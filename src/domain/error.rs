use thiserror::Error;

use crate::domain::posts::PostId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("post `{id}` not found")]
    PostNotFound { id: PostId },
    #[error("`{field}` is invalid: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("passwords do not match")]
    PasswordMismatch,
}

impl DomainError {
    pub fn not_found(id: PostId) -> Self {
        Self::PostNotFound { id }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::validation(field, "must not be empty")
    }
}
