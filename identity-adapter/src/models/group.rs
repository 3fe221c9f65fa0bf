//! Group entity and its membership operations.

use chrono::{DateTime, Utc};
use futures::FutureExt;

use provider_core::pagination::fetch_all;
use provider_core::types::{GroupRecord, GroupUpdate, LookupOutcome, NewGroup, UserStatus};

use crate::services::{AdapterError, Directory};

use super::tracked::{Tracked, TrackedAttrs};
use super::user::User;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupAttrs {
    pub group_name: String,
    pub description: Option<String>,
    pub role_arn: Option<String>,
    pub precedence: Option<i64>,
    pub creation_date: Option<DateTime<Utc>>,
    pub last_modified_date: Option<DateTime<Utc>>,
    pub user_pool_id: String,
}

impl TrackedAttrs for GroupAttrs {
    fn changed_fields(&self, from: &Self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.group_name != from.group_name {
            fields.push("group_name");
        }
        if self.description != from.description {
            fields.push("description");
        }
        if self.role_arn != from.role_arn {
            fields.push("role_arn");
        }
        if self.precedence != from.precedence {
            fields.push("precedence");
        }
        fields
    }
}

impl From<GroupRecord> for GroupAttrs {
    fn from(record: GroupRecord) -> Self {
        GroupAttrs {
            group_name: record.group_name,
            description: record.description,
            role_arn: record.role_arn,
            precedence: record.precedence,
            creation_date: record.creation_date,
            last_modified_date: record.last_modified_date,
            user_pool_id: record.user_pool_id,
        }
    }
}

/// A member reference accepted by the membership operations: either a
/// raw identifier still needing resolution or an already resolved
/// canonical username.
pub enum UserHandle {
    Identifier(String),
    Resolved(String),
}

impl From<&User> for UserHandle {
    fn from(user: &User) -> Self {
        UserHandle::Resolved(user.username().to_string())
    }
}

impl From<&str> for UserHandle {
    fn from(identifier: &str) -> Self {
        UserHandle::Identifier(identifier.to_string())
    }
}

impl From<String> for UserHandle {
    fn from(identifier: String) -> Self {
        UserHandle::Identifier(identifier)
    }
}

#[derive(Clone)]
pub struct Group {
    directory: Directory,
    state: Tracked<GroupAttrs>,
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Group {
    pub(crate) fn transient(directory: Directory, name: &str) -> Self {
        let attrs = GroupAttrs {
            group_name: name.to_string(),
            user_pool_id: directory.pool_id().to_string(),
            ..Default::default()
        };
        Group {
            directory,
            state: Tracked::transient(attrs),
        }
    }

    pub(crate) fn from_record(directory: Directory, record: GroupRecord) -> Self {
        Group {
            directory,
            state: Tracked::persisted(record.into()),
        }
    }

    /// The immutable key; there is no setter once the group exists.
    pub fn name(&self) -> &str {
        &self.state.get().group_name
    }

    pub fn description(&self) -> Option<&str> {
        self.state.get().description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.state.get_mut().description = Some(description.into());
    }

    pub fn role_arn(&self) -> Option<&str> {
        self.state.get().role_arn.as_deref()
    }

    pub fn set_role_arn(&mut self, role_arn: impl Into<String>) {
        self.state.get_mut().role_arn = Some(role_arn.into());
    }

    pub fn precedence(&self) -> Option<i64> {
        self.state.get().precedence
    }

    pub fn set_precedence(&mut self, precedence: Option<i64>) {
        self.state.get_mut().precedence = precedence;
    }

    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.state.get().creation_date
    }

    pub fn last_modified_date(&self) -> Option<DateTime<Utc>> {
        self.state.get().last_modified_date
    }

    pub fn is_new(&self) -> bool {
        self.state.is_new()
    }

    pub fn changed(&self) -> bool {
        self.state.changed()
    }

    /// Discard pending edits, restoring the last persisted values.
    pub fn rollback(&mut self) {
        self.state.rollback();
    }

    /// Create (new record) or update (dirty record) against the
    /// provider; a clean persisted record is a no-op success with zero
    /// remote calls. Remote rejection degrades to `Ok(false)`; only the
    /// post-write refetch is fatal.
    pub async fn save(&mut self) -> Result<bool, AdapterError> {
        if self.state.is_new() {
            let attrs = self.state.get();
            let request = NewGroup {
                user_pool_id: attrs.user_pool_id.clone(),
                group_name: attrs.group_name.clone(),
                description: attrs.description.clone(),
                role_arn: attrs.role_arn.clone(),
                precedence: attrs.precedence,
            };
            if let Err(e) = self.directory.provider().create_group(request).await {
                tracing::warn!(group = %self.name(), error = %e, "group create rejected");
                return Ok(false);
            }
        } else if self.state.changed() {
            let attrs = self.state.get();
            let request = GroupUpdate {
                user_pool_id: attrs.user_pool_id.clone(),
                group_name: attrs.group_name.clone(),
                description: attrs.description.clone(),
                role_arn: attrs.role_arn.clone(),
                precedence: attrs.precedence,
            };
            if let Err(e) = self.directory.provider().update_group(request).await {
                tracing::warn!(group = %self.name(), error = %e, "group update rejected");
                return Ok(false);
            }
        } else {
            return Ok(true);
        }
        // The write went through; losing the refetch means the entity's
        // truth can no longer be trusted, so the error surfaces.
        self.reload().await?;
        Ok(true)
    }

    /// Refetch canonical state, replacing snapshot and working copy and
    /// clearing dirty tracking. Failure is not degraded.
    pub async fn reload(&mut self) -> Result<(), AdapterError> {
        let record = self
            .directory
            .provider()
            .get_group(self.directory.pool_id(), &self.state.get().group_name)
            .await?;
        self.state.replace(record.into());
        Ok(())
    }

    /// Detach every member, then drop the remote record.
    pub async fn delete(&mut self) -> bool {
        let members = match self.users(None, None).await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(group = %self.name(), error = %e, "member listing failed, delete aborted");
                return false;
            }
        };
        for user in &members {
            self.remove_user(user).await;
        }
        match self
            .directory
            .provider()
            .delete_group(self.directory.pool_id(), self.name())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(group = %self.name(), error = %e, "group delete rejected");
                false
            }
        }
    }

    async fn resolve_username(&self, handle: UserHandle) -> Result<String, AdapterError> {
        match handle {
            UserHandle::Resolved(username) => Ok(username),
            UserHandle::Identifier(identifier) => {
                let record = self
                    .directory
                    .provider()
                    .admin_get_user(self.directory.pool_id(), &identifier)
                    .await?;
                Ok(record.username)
            }
        }
    }

    pub async fn add_user(&self, user: impl Into<UserHandle>) -> bool {
        let username = match self.resolve_username(user.into()).await {
            Ok(username) => username,
            Err(e) => {
                tracing::warn!(group = %self.name(), error = %e, "member resolution failed");
                return false;
            }
        };
        match self
            .directory
            .provider()
            .admin_add_user_to_group(self.directory.pool_id(), &username, self.name())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(group = %self.name(), user = %username, error = %e, "add member rejected");
                false
            }
        }
    }

    pub async fn remove_user(&self, user: impl Into<UserHandle>) -> bool {
        let username = match self.resolve_username(user.into()).await {
            Ok(username) => username,
            Err(e) => {
                tracing::warn!(group = %self.name(), error = %e, "member resolution failed");
                return false;
            }
        };
        match self
            .directory
            .provider()
            .admin_remove_user_from_group(self.directory.pool_id(), &username, self.name())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(group = %self.name(), user = %username, error = %e, "remove member rejected");
                false
            }
        }
    }

    /// Invite an existing account into the group, or provision one when
    /// the address is unknown. Only the provider's explicit not-found
    /// outcome triggers provisioning — any other lookup failure aborts
    /// the whole operation rather than risking a duplicate account.
    pub async fn invite_user(&self, email: &str) -> Result<bool, AdapterError> {
        match self.directory.lookup_user(email).await? {
            LookupOutcome::Found(user) => {
                self.directory
                    .mailer()
                    .send_group_invite(&user.to_record(), self.name())
                    .await?;
                Ok(self.add_user(&user).await)
            }
            LookupOutcome::NotFound => self.create_and_add_user(email).await,
        }
    }

    /// Re-send the invitation. With `reset` set and the account still on
    /// its temporary password, a password reset replaces the re-invite.
    pub async fn resend_invite(&self, email: &str, reset: bool) -> Result<bool, AdapterError> {
        match self.directory.lookup_user(email).await? {
            LookupOutcome::Found(user) => {
                if reset && *user.status() == UserStatus::ForceChangePassword {
                    Ok(user.reset_password().await)
                } else {
                    self.directory
                        .mailer()
                        .send_group_invite(&user.to_record(), self.name())
                        .await?;
                    Ok(self.add_user(&user).await)
                }
            }
            LookupOutcome::NotFound => self.create_and_add_user(email).await,
        }
    }

    /// Provision an account for `email` and add it to the group. The
    /// provider delivers the invitation itself on create; an invalid or
    /// duplicate address degrades to a boolean failure.
    pub async fn create_and_add_user(&self, email: &str) -> Result<bool, AdapterError> {
        let mut user = self.directory.new_user(email);
        match user.save().await {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(e) => return Err(e),
        }
        Ok(self.add_user(&user).await)
    }

    /// Current members, resolved live from the provider.
    pub async fn users(
        &self,
        limit: Option<usize>,
        page: Option<usize>,
    ) -> Result<Vec<User>, AdapterError> {
        let provider = self.directory.provider().clone();
        let pool = self.directory.pool_id().to_string();
        let group_name = self.name().to_string();
        let records = fetch_all(limit, page, move |token, size| {
            let provider = provider.clone();
            let pool = pool.clone();
            let group_name = group_name.clone();
            async move {
                provider
                    .list_users_in_group(&pool, &group_name, token.as_deref(), size)
                    .await
            }
            .boxed()
        })
        .await?;
        Ok(records
            .into_iter()
            .map(|record| User::from_record(self.directory.clone(), record))
            .collect())
    }
}
