//! Capability trait for the remote identity provider.
//!
//! The provider backend is an external managed service; this trait is
//! the seam the rest of the workspace programs against. Each method
//! performs exactly one remote attempt — retries, timeouts, and
//! connection policy belong to the underlying transport.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::ProviderError;
use crate::types::{
    AuthOutcome, ChallengeKind, GroupRecord, GroupUpdate, LookupOutcome, NewGroup, NewUser, Page,
    UserRecord,
};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    // Group resources.
    async fn create_group(&self, group: NewGroup) -> Result<GroupRecord, ProviderError>;
    async fn update_group(&self, group: GroupUpdate) -> Result<GroupRecord, ProviderError>;
    async fn delete_group(&self, pool: &str, group_name: &str) -> Result<(), ProviderError>;
    async fn get_group(&self, pool: &str, group_name: &str) -> Result<GroupRecord, ProviderError>;
    async fn list_groups(
        &self,
        pool: &str,
        page_token: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Page<GroupRecord>, ProviderError>;

    // Membership.
    async fn admin_add_user_to_group(
        &self,
        pool: &str,
        username: &str,
        group_name: &str,
    ) -> Result<(), ProviderError>;
    async fn admin_remove_user_from_group(
        &self,
        pool: &str,
        username: &str,
        group_name: &str,
    ) -> Result<(), ProviderError>;
    async fn list_users_in_group(
        &self,
        pool: &str,
        group_name: &str,
        page_token: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Page<UserRecord>, ProviderError>;

    // User resources. `admin_get_user` fails with `UserNotFound` for a
    // missing record; `lookup_user` folds that case into an explicit
    // `LookupOutcome` for callers whose not-found branch is control flow.
    async fn admin_get_user(&self, pool: &str, username: &str)
        -> Result<UserRecord, ProviderError>;
    async fn lookup_user(
        &self,
        pool: &str,
        username: &str,
    ) -> Result<LookupOutcome<UserRecord>, ProviderError>;
    async fn admin_create_user(&self, user: NewUser) -> Result<UserRecord, ProviderError>;
    async fn admin_update_user_attributes(
        &self,
        pool: &str,
        username: &str,
        attributes: HashMap<String, String>,
    ) -> Result<(), ProviderError>;
    async fn admin_delete_user(&self, pool: &str, username: &str) -> Result<(), ProviderError>;
    async fn admin_reset_user_password(
        &self,
        pool: &str,
        username: &str,
    ) -> Result<(), ProviderError>;
    async fn list_users(
        &self,
        pool: &str,
        page_token: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Page<UserRecord>, ProviderError>;

    // Authentication.
    async fn initiate_auth(
        &self,
        client_id: &str,
        params: &HashMap<String, String>,
    ) -> Result<AuthOutcome, ProviderError>;
    async fn respond_to_auth_challenge(
        &self,
        client_id: &str,
        challenge: ChallengeKind,
        session_token: &str,
        responses: &HashMap<String, String>,
    ) -> Result<AuthOutcome, ProviderError>;
    async fn get_user(&self, access_token: &str) -> Result<UserRecord, ProviderError>;
    async fn global_sign_out(&self, access_token: &str) -> Result<(), ProviderError>;
}
