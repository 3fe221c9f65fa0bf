use provider_core::error::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("configuration error: {0}")]
    Config(anyhow::Error),
}

impl AdapterError {
    /// Stable key for the user-facing message catalog.
    pub fn kind(&self) -> &str {
        match self {
            AdapterError::Provider(e) => e.kind(),
            AdapterError::Mail(_) => "mail_delivery_failed",
            AdapterError::Config(_) => "configuration_error",
        }
    }
}
