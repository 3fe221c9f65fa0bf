//! User entity synchronized against the provider's canonical record.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use provider_core::types::{NewUser, UserRecord, UserStatus};

use crate::services::{AdapterError, Directory};

use super::tracked::{Tracked, TrackedAttrs};

#[derive(Debug, Clone, PartialEq)]
pub struct UserAttrs {
    pub username: String,
    pub email: Option<String>,
    pub user_status: UserStatus,
    pub enabled: bool,
    pub attributes: HashMap<String, String>,
    pub user_create_date: Option<DateTime<Utc>>,
    pub user_last_modified_date: Option<DateTime<Utc>>,
}

impl Default for UserAttrs {
    fn default() -> Self {
        UserAttrs {
            username: String::new(),
            email: None,
            user_status: UserStatus::Unconfirmed,
            enabled: true,
            attributes: HashMap::new(),
            user_create_date: None,
            user_last_modified_date: None,
        }
    }
}

impl TrackedAttrs for UserAttrs {
    fn changed_fields(&self, from: &Self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.username != from.username {
            fields.push("username");
        }
        if self.email != from.email {
            fields.push("email");
        }
        if self.enabled != from.enabled {
            fields.push("enabled");
        }
        if self.attributes != from.attributes {
            fields.push("attributes");
        }
        fields
    }
}

impl From<UserRecord> for UserAttrs {
    fn from(record: UserRecord) -> Self {
        UserAttrs {
            username: record.username,
            email: record.email,
            user_status: record.user_status,
            enabled: record.enabled,
            attributes: record.attributes,
            user_create_date: record.user_create_date,
            user_last_modified_date: record.user_last_modified_date,
        }
    }
}

#[derive(Clone)]
pub struct User {
    directory: Directory,
    state: Tracked<UserAttrs>,
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.username() == other.username()
    }
}

impl User {
    pub(crate) fn transient(directory: Directory, email: &str) -> Self {
        let attrs = UserAttrs {
            // The provider assigns the canonical username on create; the
            // email doubles as the requested one until then.
            username: email.to_string(),
            email: Some(email.to_string()),
            ..Default::default()
        };
        User {
            directory,
            state: Tracked::transient(attrs),
        }
    }

    pub(crate) fn from_record(directory: Directory, record: UserRecord) -> Self {
        User {
            directory,
            state: Tracked::persisted(record.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.state.get().username
    }

    pub fn email(&self) -> Option<&str> {
        self.state.get().email.as_deref()
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.state.get_mut().email = Some(email.into());
    }

    pub fn status(&self) -> &UserStatus {
        &self.state.get().user_status
    }

    pub fn enabled(&self) -> bool {
        self.state.get().enabled
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.state.get().attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.state
            .get_mut()
            .attributes
            .insert(name.into(), value.into());
    }

    pub fn is_new(&self) -> bool {
        self.state.is_new()
    }

    pub fn changed(&self) -> bool {
        self.state.changed()
    }

    pub fn rollback(&mut self) {
        self.state.rollback();
    }

    pub fn to_record(&self) -> UserRecord {
        let attrs = self.state.get();
        UserRecord {
            username: attrs.username.clone(),
            email: attrs.email.clone(),
            user_status: attrs.user_status.clone(),
            enabled: attrs.enabled,
            attributes: attrs.attributes.clone(),
            user_create_date: attrs.user_create_date,
            user_last_modified_date: attrs.user_last_modified_date,
        }
    }

    /// Create or update against the provider. Remote rejection degrades
    /// to `Ok(false)`; only the post-write refetch is fatal.
    pub async fn save(&mut self) -> Result<bool, AdapterError> {
        if self.state.is_new() {
            let attrs = self.state.get();
            let mut user_attributes = attrs.attributes.clone();
            if let Some(email) = &attrs.email {
                user_attributes.insert("email".to_string(), email.clone());
            }
            let request = NewUser {
                user_pool_id: self.directory.pool_id().to_string(),
                username: attrs.username.clone(),
                attributes: user_attributes,
            };
            match self.directory.provider().admin_create_user(request).await {
                Ok(created) => {
                    self.state.get_mut().username = created.username;
                }
                Err(e) => {
                    tracing::warn!(user = %self.username(), error = %e, "user create rejected");
                    return Ok(false);
                }
            }
        } else if self.state.changed() {
            let updates = self.pending_attribute_updates();
            if let Err(e) = self
                .directory
                .provider()
                .admin_update_user_attributes(
                    self.directory.pool_id(),
                    &self.state.get().username,
                    updates,
                )
                .await
            {
                tracing::warn!(user = %self.username(), error = %e, "user update rejected");
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

    /// Attribute updates for the changed fields only.
    fn pending_attribute_updates(&self) -> HashMap<String, String> {
        let current = self.state.get();
        let snapshot = self.state.snapshot();
        let mut updates = HashMap::new();
        if current.email != snapshot.email {
            if let Some(email) = &current.email {
                updates.insert("email".to_string(), email.clone());
            }
        }
        for (name, value) in &current.attributes {
            if snapshot.attributes.get(name) != Some(value) {
                updates.insert(name.clone(), value.clone());
            }
        }
        updates
    }

    /// Refetch canonical state, replacing snapshot and working copy.
    /// Failure is not degraded: a record that disappears between save
    /// and reload is a hard error.
    pub async fn reload(&mut self) -> Result<(), AdapterError> {
        let record = self
            .directory
            .provider()
            .admin_get_user(self.directory.pool_id(), &self.state.get().username)
            .await?;
        self.state.replace(record.into());
        Ok(())
    }

    pub async fn delete(&self) -> bool {
        match self
            .directory
            .provider()
            .admin_delete_user(self.directory.pool_id(), self.username())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user = %self.username(), error = %e, "user delete rejected");
                false
            }
        }
    }

    /// Trigger the provider's password-reset flow for this account.
    pub async fn reset_password(&self) -> bool {
        match self
            .directory
            .provider()
            .admin_reset_user_password(self.directory.pool_id(), self.username())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user = %self.username(), error = %e, "password reset rejected");
                false
            }
        }
    }
}
