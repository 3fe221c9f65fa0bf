use std::env;

use crate::services::error::AdapterError;
use provider_core::types::ChallengeKind;

/// Adapter configuration. Everything is injected explicitly — the pool
/// id and client handle are constructor arguments, never process-wide
/// state.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub user_pool_id: String,
    pub client_id: String,
    pub endpoint: String,
    pub routes: RouteConfig,
}

/// Navigation targets used by the session layer.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Application root, the post-login destination.
    pub root_path: String,
    /// Mount point of the auth surface; login and challenge-recovery
    /// endpoints live beneath it.
    pub mount_path: String,
}

impl RouteConfig {
    pub fn login_path(&self) -> String {
        format!("{}/login", self.mount_path)
    }

    pub fn challenge_path(&self, kind: ChallengeKind) -> String {
        format!("{}/{}", self.mount_path, kind.recovery_route())
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        RouteConfig {
            root_path: "/".to_string(),
            mount_path: "/auth".to_string(),
        }
    }
}

impl AdapterConfig {
    pub fn new(
        user_pool_id: impl Into<String>,
        client_id: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        AdapterConfig {
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
            endpoint: endpoint.into(),
            routes: RouteConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self, AdapterError> {
        let config = AdapterConfig {
            user_pool_id: get_env("IDP_USER_POOL_ID", None)?,
            client_id: get_env("IDP_CLIENT_ID", None)?,
            endpoint: get_env("IDP_ENDPOINT", None)?,
            routes: RouteConfig {
                root_path: get_env("IDP_ROOT_PATH", Some("/"))?,
                mount_path: get_env("IDP_MOUNT_PATH", Some("/auth"))?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AdapterError> {
        if self.user_pool_id.is_empty() {
            return Err(AdapterError::Config(anyhow::anyhow!(
                "user pool id must not be empty"
            )));
        }
        if self.client_id.is_empty() {
            return Err(AdapterError::Config(anyhow::anyhow!(
                "client id must not be empty"
            )));
        }
        if !self.routes.mount_path.starts_with('/') {
            return Err(AdapterError::Config(anyhow::anyhow!(
                "mount path must start with '/'"
            )));
        }
        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>) -> Result<String, AdapterError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => match default {
            Some(def) => Ok(def.to_string()),
            None => Err(AdapterError::Config(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}
