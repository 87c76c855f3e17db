use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::session::SessionError, config::LoadError, domain::error::DomainError,
    infra::error::InfraError,
};

/// Flattened view of an error and its sources, used when reporting to the user.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Blocking message shown to the user for this failure.
    pub fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::PostNotFound { .. }) => "That message no longer exists",
            AppError::Domain(DomainError::PasswordMismatch)
            | AppError::Session(SessionError::Validation(DomainError::PasswordMismatch)) => {
                "Passwords do not match"
            }
            AppError::Domain(_) | AppError::Session(SessionError::Validation(_)) => {
                "Please fill in all fields"
            }
            AppError::Session(SessionError::InvalidCredentials) => {
                "Invalid credentials. Please try again."
            }
            AppError::Config(_) => "Board misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Remote(_)) => "Shared storage could not be set up",
            AppError::Unexpected(_) => "Unexpected error occurred",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}
