use thiserror::Error;

use crate::application::repos::RemoteError;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("remote store setup failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
