//! Test fixtures for the identity-adapter integration tests.
//!
//! Provides an in-memory identity provider with call counting and
//! scriptable failures, plus recording doubles for the navigator and
//! invite-mailer seams.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use identity_adapter::config::AdapterConfig;
use identity_adapter::services::{AdapterError, Directory, InviteMailer};
use identity_adapter::session::{AuthSession, FlashLevel, Navigator};
use provider_core::client::IdentityProvider;
use provider_core::error::ProviderError;
use provider_core::types::{
    AuthOutcome, ChallengeKind, GroupRecord, GroupUpdate, LookupOutcome, NewGroup, NewUser, Page,
    TokenSet, UserRecord, UserStatus,
};

pub const TEST_POOL: &str = "pool-test";
pub const TEST_CLIENT: &str = "client-test";

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Service(&'static str),
    UserNotFound,
    InvalidParameter,
}

impl Failure {
    fn to_error(self) -> ProviderError {
        match self {
            Failure::Service(kind) => ProviderError::service(kind),
            Failure::UserNotFound => ProviderError::UserNotFound,
            Failure::InvalidParameter => {
                ProviderError::InvalidParameter("rejected by fake".to_string())
            }
        }
    }
}

#[derive(Default)]
struct PoolData {
    groups: BTreeMap<String, GroupRecord>,
    users: BTreeMap<String, UserRecord>,
    passwords: HashMap<String, String>,
    memberships: BTreeMap<String, BTreeSet<String>>,
}

/// In-memory stand-in for the hosted identity provider.
#[derive(Default)]
pub struct FakeProvider {
    data: Mutex<PoolData>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, Failure>>,
    chained_challenge: Mutex<Option<ChallengeKind>>,
    page_cap: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        let provider = FakeProvider::default();
        provider.page_cap.store(50, Ordering::SeqCst);
        Arc::new(provider)
    }

    /// Cap listing batches to exercise token pagination.
    pub fn set_page_cap(&self, cap: usize) {
        self.page_cap.store(cap.max(1), Ordering::SeqCst);
    }

    /// Arrange for the next call of `op` to fail.
    pub fn fail_next(&self, op: &'static str, failure: Failure) {
        self.failures.lock().unwrap().insert(op, failure);
    }

    /// Arrange for the next challenge response to yield a follow-up
    /// challenge instead of tokens.
    pub fn chain_challenge_once(&self, kind: ChallengeKind) {
        *self.chained_challenge.lock().unwrap() = Some(kind);
    }

    pub fn calls_of(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|&&c| c == op).count()
    }

    pub fn seed_group(&self, name: &str, description: Option<&str>) {
        let mut data = self.data.lock().unwrap();
        data.groups.insert(
            name.to_string(),
            GroupRecord {
                group_name: name.to_string(),
                description: description.map(str::to_string),
                role_arn: None,
                precedence: None,
                creation_date: Some(Utc::now()),
                last_modified_date: Some(Utc::now()),
                user_pool_id: TEST_POOL.to_string(),
            },
        );
    }

    pub fn seed_account(&self, username: &str, email: &str, password: &str, status: UserStatus) {
        let mut data = self.data.lock().unwrap();
        let mut attributes = HashMap::new();
        attributes.insert("email".to_string(), email.to_string());
        data.users.insert(
            username.to_string(),
            UserRecord {
                username: username.to_string(),
                email: Some(email.to_string()),
                user_status: status,
                enabled: true,
                attributes,
                user_create_date: Some(Utc::now()),
                user_last_modified_date: Some(Utc::now()),
            },
        );
        data.passwords
            .insert(username.to_string(), password.to_string());
    }

    pub fn seed_membership(&self, group: &str, username: &str) {
        let mut data = self.data.lock().unwrap();
        data.memberships
            .entry(group.to_string())
            .or_default()
            .insert(username.to_string());
    }

    pub fn members_of(&self, group: &str) -> Vec<String> {
        let data = self.data.lock().unwrap();
        data.memberships
            .get(group)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.data.lock().unwrap().groups.contains_key(name)
    }

    pub fn group_description(&self, name: &str) -> Option<String> {
        let data = self.data.lock().unwrap();
        data.groups.get(name).and_then(|g| g.description.clone())
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.data.lock().unwrap().users.contains_key(username)
    }

    fn enter(&self, op: &'static str) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(op);
        if let Some(failure) = self.failures.lock().unwrap().remove(op) {
            return Err(failure.to_error());
        }
        Ok(())
    }

    fn paginate<T: Clone>(
        &self,
        items: Vec<T>,
        token: Option<&str>,
        size: Option<usize>,
    ) -> Page<T> {
        let cap = self.page_cap.load(Ordering::SeqCst);
        let start: usize = token
            .and_then(|t| t.parse().ok())
            .unwrap_or(0)
            .min(items.len());
        let take = size.unwrap_or(cap).min(cap).max(1);
        let end = (start + take).min(items.len());
        let next_token = if end < items.len() {
            Some(end.to_string())
        } else {
            None
        };
        Page {
            items: items[start..end].to_vec(),
            next_token,
        }
    }

    fn find_by_username_or_email(
        data: &PoolData,
        identifier: &str,
    ) -> Option<UserRecord> {
        if let Some(user) = data.users.get(identifier) {
            return Some(user.clone());
        }
        data.users
            .values()
            .find(|u| u.email.as_deref() == Some(identifier))
            .cloned()
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn create_group(&self, group: NewGroup) -> Result<GroupRecord, ProviderError> {
        self.enter("CreateGroup")?;
        let mut data = self.data.lock().unwrap();
        if data.groups.contains_key(&group.group_name) {
            return Err(ProviderError::service("group_exists_exception"));
        }
        let record = GroupRecord {
            group_name: group.group_name.clone(),
            description: group.description,
            role_arn: group.role_arn,
            precedence: group.precedence,
            creation_date: Some(Utc::now()),
            last_modified_date: Some(Utc::now()),
            user_pool_id: group.user_pool_id,
        };
        data.groups.insert(group.group_name, record.clone());
        Ok(record)
    }

    async fn update_group(&self, group: GroupUpdate) -> Result<GroupRecord, ProviderError> {
        self.enter("UpdateGroup")?;
        let mut data = self.data.lock().unwrap();
        let record = data
            .groups
            .get_mut(&group.group_name)
            .ok_or_else(|| ProviderError::service("resource_not_found_exception"))?;
        record.description = group.description;
        record.role_arn = group.role_arn;
        record.precedence = group.precedence;
        record.last_modified_date = Some(Utc::now());
        Ok(record.clone())
    }

    async fn delete_group(&self, _pool: &str, group_name: &str) -> Result<(), ProviderError> {
        self.enter("DeleteGroup")?;
        let mut data = self.data.lock().unwrap();
        if data.groups.remove(group_name).is_none() {
            return Err(ProviderError::service("resource_not_found_exception"));
        }
        data.memberships.remove(group_name);
        Ok(())
    }

    async fn get_group(&self, _pool: &str, group_name: &str) -> Result<GroupRecord, ProviderError> {
        self.enter("GetGroup")?;
        let data = self.data.lock().unwrap();
        data.groups
            .get(group_name)
            .cloned()
            .ok_or_else(|| ProviderError::service("resource_not_found_exception"))
    }

    async fn list_groups(
        &self,
        _pool: &str,
        page_token: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Page<GroupRecord>, ProviderError> {
        self.enter("ListGroups")?;
        let items: Vec<GroupRecord> = self.data.lock().unwrap().groups.values().cloned().collect();
        Ok(self.paginate(items, page_token, page_size))
    }

    async fn admin_add_user_to_group(
        &self,
        _pool: &str,
        username: &str,
        group_name: &str,
    ) -> Result<(), ProviderError> {
        self.enter("AdminAddUserToGroup")?;
        let mut data = self.data.lock().unwrap();
        if !data.users.contains_key(username) {
            return Err(ProviderError::UserNotFound);
        }
        data.memberships
            .entry(group_name.to_string())
            .or_default()
            .insert(username.to_string());
        Ok(())
    }

    async fn admin_remove_user_from_group(
        &self,
        _pool: &str,
        username: &str,
        group_name: &str,
    ) -> Result<(), ProviderError> {
        self.enter("AdminRemoveUserFromGroup")?;
        let mut data = self.data.lock().unwrap();
        if let Some(members) = data.memberships.get_mut(group_name) {
            members.remove(username);
        }
        Ok(())
    }

    async fn list_users_in_group(
        &self,
        _pool: &str,
        group_name: &str,
        page_token: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Page<UserRecord>, ProviderError> {
        self.enter("ListUsersInGroup")?;
        let data = self.data.lock().unwrap();
        let items: Vec<UserRecord> = data
            .memberships
            .get(group_name)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|m| data.users.get(m).cloned())
                    .collect()
            })
            .unwrap_or_default();
        drop(data);
        Ok(self.paginate(items, page_token, page_size))
    }

    async fn admin_get_user(
        &self,
        _pool: &str,
        username: &str,
    ) -> Result<UserRecord, ProviderError> {
        self.enter("AdminGetUser")?;
        let data = self.data.lock().unwrap();
        Self::find_by_username_or_email(&data, username).ok_or(ProviderError::UserNotFound)
    }

    async fn lookup_user(
        &self,
        pool: &str,
        username: &str,
    ) -> Result<LookupOutcome<UserRecord>, ProviderError> {
        match self.admin_get_user(pool, username).await {
            Ok(user) => Ok(LookupOutcome::Found(user)),
            Err(ProviderError::UserNotFound) => Ok(LookupOutcome::NotFound),
            Err(e) => Err(e),
        }
    }

    async fn admin_create_user(&self, user: NewUser) -> Result<UserRecord, ProviderError> {
        self.enter("AdminCreateUser")?;
        let mut data = self.data.lock().unwrap();
        let email = user.attributes.get("email").cloned().unwrap_or_default();
        if !email.contains('@') {
            return Err(ProviderError::InvalidParameter(
                "invalid email address format".to_string(),
            ));
        }
        if data.users.contains_key(&user.username) {
            return Err(ProviderError::service("username_exists_exception"));
        }
        let record = UserRecord {
            username: user.username.clone(),
            email: Some(email),
            user_status: UserStatus::ForceChangePassword,
            enabled: true,
            attributes: user.attributes,
            user_create_date: Some(Utc::now()),
            user_last_modified_date: Some(Utc::now()),
        };
        data.users.insert(user.username.clone(), record.clone());
        data.passwords
            .insert(user.username, "temporary".to_string());
        Ok(record)
    }

    async fn admin_update_user_attributes(
        &self,
        _pool: &str,
        username: &str,
        attributes: HashMap<String, String>,
    ) -> Result<(), ProviderError> {
        self.enter("AdminUpdateUserAttributes")?;
        let mut data = self.data.lock().unwrap();
        let user = data
            .users
            .get_mut(username)
            .ok_or(ProviderError::UserNotFound)?;
        for (name, value) in attributes {
            if name == "email" {
                user.email = Some(value.clone());
            }
            user.attributes.insert(name, value);
        }
        user.user_last_modified_date = Some(Utc::now());
        Ok(())
    }

    async fn admin_delete_user(&self, _pool: &str, username: &str) -> Result<(), ProviderError> {
        self.enter("AdminDeleteUser")?;
        let mut data = self.data.lock().unwrap();
        if data.users.remove(username).is_none() {
            return Err(ProviderError::UserNotFound);
        }
        for members in data.memberships.values_mut() {
            members.remove(username);
        }
        Ok(())
    }

    async fn admin_reset_user_password(
        &self,
        _pool: &str,
        username: &str,
    ) -> Result<(), ProviderError> {
        self.enter("AdminResetUserPassword")?;
        let data = self.data.lock().unwrap();
        if !data.users.contains_key(username) {
            return Err(ProviderError::UserNotFound);
        }
        Ok(())
    }

    async fn list_users(
        &self,
        _pool: &str,
        page_token: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Page<UserRecord>, ProviderError> {
        self.enter("ListUsers")?;
        let items: Vec<UserRecord> = self.data.lock().unwrap().users.values().cloned().collect();
        Ok(self.paginate(items, page_token, page_size))
    }

    async fn initiate_auth(
        &self,
        _client_id: &str,
        params: &HashMap<String, String>,
    ) -> Result<AuthOutcome, ProviderError> {
        self.enter("InitiateAuth")?;
        let username = params
            .get("USERNAME")
            .ok_or_else(|| ProviderError::InvalidParameter("USERNAME is required".to_string()))?;
        let password = params
            .get("PASSWORD")
            .ok_or_else(|| ProviderError::InvalidParameter("PASSWORD is required".to_string()))?;
        let data = self.data.lock().unwrap();
        let user = data
            .users
            .get(username)
            .ok_or_else(|| ProviderError::service("not_authorized_exception"))?;
        if data.passwords.get(username) != Some(password) {
            return Err(ProviderError::service("not_authorized_exception"));
        }
        if user.user_status == UserStatus::ForceChangePassword {
            return Ok(AuthOutcome::Challenge {
                kind: ChallengeKind::NewPasswordRequired,
                session_token: format!("sess-{}", username),
            });
        }
        Ok(AuthOutcome::Authenticated(TokenSet::access_only(format!(
            "access-{}",
            username
        ))))
    }

    async fn respond_to_auth_challenge(
        &self,
        _client_id: &str,
        _challenge: ChallengeKind,
        session_token: &str,
        responses: &HashMap<String, String>,
    ) -> Result<AuthOutcome, ProviderError> {
        self.enter("RespondToAuthChallenge")?;
        let username = responses
            .get("USERNAME")
            .ok_or_else(|| ProviderError::service("not_authorized_exception"))?;
        if session_token != format!("sess-{}", username) {
            return Err(ProviderError::service("not_authorized_exception"));
        }
        if let Some(kind) = self.chained_challenge.lock().unwrap().take() {
            return Ok(AuthOutcome::Challenge {
                kind,
                session_token: session_token.to_string(),
            });
        }
        let new_password = responses
            .get("NEW_PASSWORD")
            .ok_or_else(|| ProviderError::InvalidParameter("NEW_PASSWORD is required".to_string()))?;
        let mut data = self.data.lock().unwrap();
        let user = data
            .users
            .get_mut(username)
            .ok_or(ProviderError::UserNotFound)?;
        user.user_status = UserStatus::Confirmed;
        let username = username.clone();
        data.passwords.insert(username.clone(), new_password.clone());
        Ok(AuthOutcome::Authenticated(TokenSet::access_only(format!(
            "access-{}",
            username
        ))))
    }

    async fn get_user(&self, access_token: &str) -> Result<UserRecord, ProviderError> {
        self.enter("GetUser")?;
        let username = access_token
            .strip_prefix("access-")
            .ok_or_else(|| ProviderError::service("not_authorized_exception"))?;
        let data = self.data.lock().unwrap();
        data.users
            .get(username)
            .cloned()
            .ok_or_else(|| ProviderError::service("not_authorized_exception"))
    }

    async fn global_sign_out(&self, _access_token: &str) -> Result<(), ProviderError> {
        self.enter("GlobalSignOut")?;
        Ok(())
    }
}

/// Navigator double recording every redirect and flash.
#[derive(Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
    flashes: Mutex<Vec<(FlashLevel, String)>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingNavigator::default())
    }

    pub fn last_redirect(&self) -> Option<String> {
        self.redirects.lock().unwrap().last().cloned()
    }

    pub fn last_flash(&self) -> Option<(FlashLevel, String)> {
        self.flashes.lock().unwrap().last().cloned()
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.lock().unwrap().len()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to(&self, path: &str) {
        self.redirects.lock().unwrap().push(path.to_string());
    }

    fn flash(&self, level: FlashLevel, message: &str) {
        self.flashes
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}

/// Invite-mailer double counting sends, optionally failing.
#[derive(Default)]
pub struct CountingMailer {
    sends: AtomicUsize,
    fail: AtomicBool,
}

impl CountingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(CountingMailer::default())
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn fail_deliveries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl InviteMailer for CountingMailer {
    async fn send_group_invite(
        &self,
        _user: &UserRecord,
        _group_name: &str,
    ) -> Result<(), AdapterError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AdapterError::Mail("delivery refused".to_string()));
        }
        self.sends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> AdapterConfig {
    AdapterConfig::new(TEST_POOL, TEST_CLIENT, "http://localhost:0")
}

pub fn directory(provider: &Arc<FakeProvider>, mailer: &Arc<CountingMailer>) -> Directory {
    init_tracing();
    Directory::new(provider.clone(), mailer.clone(), TEST_POOL)
}

pub fn session(provider: &Arc<FakeProvider>, navigator: &Arc<RecordingNavigator>) -> AuthSession {
    init_tracing();
    AuthSession::new(test_config(), provider.clone(), navigator.clone())
}
