use futures::FutureExt;
use std::sync::Arc;

use provider_core::client::IdentityProvider;
use provider_core::http::HttpProvider;
use provider_core::pagination::fetch_all;
use provider_core::types::LookupOutcome;

use crate::config::AdapterConfig;
use crate::models::{Group, User};

use super::error::AdapterError;
use super::mailer::InviteMailer;

/// Handle over one user pool of the identity provider.
///
/// Owns the injected provider client, the invite-mail seam, and the
/// pool scope; entities constructed through it carry a clone so their
/// operations stay bound to the same pool.
#[derive(Clone)]
pub struct Directory {
    provider: Arc<dyn IdentityProvider>,
    mailer: Arc<dyn InviteMailer>,
    user_pool_id: String,
}

impl Directory {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn InviteMailer>,
        user_pool_id: impl Into<String>,
    ) -> Self {
        Directory {
            provider,
            mailer,
            user_pool_id: user_pool_id.into(),
        }
    }

    /// Convenience constructor wiring the HTTP provider from config.
    pub fn from_config(config: &AdapterConfig, mailer: Arc<dyn InviteMailer>) -> Self {
        Directory::new(
            Arc::new(HttpProvider::new(&config.endpoint)),
            mailer,
            config.user_pool_id.clone(),
        )
    }

    pub fn pool_id(&self) -> &str {
        &self.user_pool_id
    }

    pub(crate) fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    pub(crate) fn mailer(&self) -> &Arc<dyn InviteMailer> {
        &self.mailer
    }

    /// A transient group; nothing is sent until `save`.
    pub fn new_group(&self, name: &str) -> Group {
        Group::transient(self.clone(), name)
    }

    pub async fn find_group(&self, name: &str) -> Result<Group, AdapterError> {
        let record = self.provider.get_group(&self.user_pool_id, name).await?;
        Ok(Group::from_record(self.clone(), record))
    }

    pub async fn groups(
        &self,
        limit: Option<usize>,
        page: Option<usize>,
    ) -> Result<Vec<Group>, AdapterError> {
        let provider = self.provider.clone();
        let pool = self.user_pool_id.clone();
        let records = fetch_all(limit, page, move |token, size| {
            let provider = provider.clone();
            let pool = pool.clone();
            async move { provider.list_groups(&pool, token.as_deref(), size).await }.boxed()
        })
        .await?;
        Ok(records
            .into_iter()
            .map(|record| Group::from_record(self.clone(), record))
            .collect())
    }

    /// A transient user keyed by email; nothing is sent until `save`.
    pub fn new_user(&self, email: &str) -> User {
        User::transient(self.clone(), email)
    }

    pub async fn find_user(&self, username: &str) -> Result<User, AdapterError> {
        let record = self
            .provider
            .admin_get_user(&self.user_pool_id, username)
            .await?;
        Ok(User::from_record(self.clone(), record))
    }

    /// Lookup whose not-found case is an explicit outcome, not an error.
    pub async fn lookup_user(&self, username: &str) -> Result<LookupOutcome<User>, AdapterError> {
        let outcome = self
            .provider
            .lookup_user(&self.user_pool_id, username)
            .await?;
        Ok(match outcome {
            LookupOutcome::Found(record) => {
                LookupOutcome::Found(User::from_record(self.clone(), record))
            }
            LookupOutcome::NotFound => LookupOutcome::NotFound,
        })
    }

    pub async fn users(
        &self,
        limit: Option<usize>,
        page: Option<usize>,
    ) -> Result<Vec<User>, AdapterError> {
        let provider = self.provider.clone();
        let pool = self.user_pool_id.clone();
        let records = fetch_all(limit, page, move |token, size| {
            let provider = provider.clone();
            let pool = pool.clone();
            async move { provider.list_users(&pool, token.as_deref(), size).await }.boxed()
        })
        .await?;
        Ok(records
            .into_iter()
            .map(|record| User::from_record(self.clone(), record))
            .collect())
    }
}
