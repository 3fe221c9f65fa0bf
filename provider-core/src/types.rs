//! Records and value types exchanged with the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Canonical group record as held by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupRecord {
    pub group_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub role_arn: Option<String>,
    #[serde(default)]
    pub precedence: Option<i64>,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_pool_id: String,
}

/// Canonical user record as held by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "UserStatus::unknown")]
    pub user_status: UserStatus,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub user_create_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_last_modified_date: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

/// Account lifecycle status reported by the provider.
///
/// Only `Confirmed` and `ForceChangePassword` carry meaning for the
/// adapter; everything else is passed through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserStatus {
    Confirmed,
    ForceChangePassword,
    Unconfirmed,
    Archived,
    ResetRequired,
    Other(String),
}

impl UserStatus {
    fn unknown() -> Self {
        UserStatus::Other("UNKNOWN".to_string())
    }

    pub fn as_provider_str(&self) -> &str {
        match self {
            UserStatus::Confirmed => "CONFIRMED",
            UserStatus::ForceChangePassword => "FORCE_CHANGE_PASSWORD",
            UserStatus::Unconfirmed => "UNCONFIRMED",
            UserStatus::Archived => "ARCHIVED",
            UserStatus::ResetRequired => "RESET_REQUIRED",
            UserStatus::Other(s) => s,
        }
    }
}

impl From<String> for UserStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CONFIRMED" => UserStatus::Confirmed,
            "FORCE_CHANGE_PASSWORD" => UserStatus::ForceChangePassword,
            "UNCONFIRMED" => UserStatus::Unconfirmed,
            "ARCHIVED" => UserStatus::Archived,
            "RESET_REQUIRED" => UserStatus::ResetRequired,
            _ => UserStatus::Other(s),
        }
    }
}

impl From<UserStatus> for String {
    fn from(s: UserStatus) -> Self {
        s.as_provider_str().to_string()
    }
}

/// Closed set of intermediate authentication challenges the provider
/// can interpose before a session is fully authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChallengeKind {
    NewPasswordRequired,
    SmsMfa,
    SoftwareTokenMfa,
    MfaSetup,
    SelectMfaType,
    PasswordVerifier,
    CustomChallenge,
    DeviceSrpAuth,
    DevicePasswordVerifier,
}

#[derive(Debug, Error)]
#[error("unknown challenge name: {0}")]
pub struct UnknownChallenge(pub String);

impl ChallengeKind {
    pub fn as_provider_str(&self) -> &'static str {
        match self {
            ChallengeKind::NewPasswordRequired => "NEW_PASSWORD_REQUIRED",
            ChallengeKind::SmsMfa => "SMS_MFA",
            ChallengeKind::SoftwareTokenMfa => "SOFTWARE_TOKEN_MFA",
            ChallengeKind::MfaSetup => "MFA_SETUP",
            ChallengeKind::SelectMfaType => "SELECT_MFA_TYPE",
            ChallengeKind::PasswordVerifier => "PASSWORD_VERIFIER",
            ChallengeKind::CustomChallenge => "CUSTOM_CHALLENGE",
            ChallengeKind::DeviceSrpAuth => "DEVICE_SRP_AUTH",
            ChallengeKind::DevicePasswordVerifier => "DEVICE_PASSWORD_VERIFIER",
        }
    }

    /// Route segment of the recovery endpoint handling this challenge.
    pub fn recovery_route(&self) -> &'static str {
        match self {
            ChallengeKind::NewPasswordRequired => "new-password-required",
            ChallengeKind::SmsMfa => "sms-mfa",
            ChallengeKind::SoftwareTokenMfa => "software-token-mfa",
            ChallengeKind::MfaSetup => "mfa-setup",
            ChallengeKind::SelectMfaType => "select-mfa-type",
            ChallengeKind::PasswordVerifier => "password-verifier",
            ChallengeKind::CustomChallenge => "custom-challenge",
            ChallengeKind::DeviceSrpAuth => "device-srp-auth",
            ChallengeKind::DevicePasswordVerifier => "device-password-verifier",
        }
    }

    /// Message-catalog key for the user-facing challenge notice.
    pub fn message_key(&self) -> String {
        self.as_provider_str().to_lowercase()
    }
}

impl FromStr for ChallengeKind {
    type Err = UnknownChallenge;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW_PASSWORD_REQUIRED" => Ok(ChallengeKind::NewPasswordRequired),
            "SMS_MFA" => Ok(ChallengeKind::SmsMfa),
            "SOFTWARE_TOKEN_MFA" => Ok(ChallengeKind::SoftwareTokenMfa),
            "MFA_SETUP" => Ok(ChallengeKind::MfaSetup),
            "SELECT_MFA_TYPE" => Ok(ChallengeKind::SelectMfaType),
            "PASSWORD_VERIFIER" => Ok(ChallengeKind::PasswordVerifier),
            "CUSTOM_CHALLENGE" => Ok(ChallengeKind::CustomChallenge),
            "DEVICE_SRP_AUTH" => Ok(ChallengeKind::DeviceSrpAuth),
            "DEVICE_PASSWORD_VERIFIER" => Ok(ChallengeKind::DevicePasswordVerifier),
            _ => Err(UnknownChallenge(s.to_string())),
        }
    }
}

impl TryFrom<String> for ChallengeKind {
    type Error = UnknownChallenge;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChallengeKind> for String {
    fn from(k: ChallengeKind) -> Self {
        k.as_provider_str().to_string()
    }
}

/// Provider-issued tokens for an authenticated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenSet {
    pub fn access_only(access_token: impl Into<String>) -> Self {
        TokenSet {
            access_token: access_token.into(),
            id_token: None,
            refresh_token: None,
            expires_in: None,
        }
    }
}

/// Result of an authentication call: either a fully resolved session or
/// an outstanding challenge that must be answered to proceed.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated(TokenSet),
    Challenge {
        kind: ChallengeKind,
        session_token: String,
    },
}

/// One batch of a paginated listing plus the opaque continuation token.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Page {
            items,
            next_token: None,
        }
    }
}

/// Explicit outcome of a lookup whose not-found case is control flow,
/// not an error.
#[derive(Debug, Clone)]
pub enum LookupOutcome<T> {
    Found(T),
    NotFound,
}

impl<T> LookupOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            LookupOutcome::Found(v) => Some(v),
            LookupOutcome::NotFound => None,
        }
    }
}

/// Attribute subset sent when creating a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewGroup {
    pub user_pool_id: String,
    pub group_name: String,
    pub description: Option<String>,
    pub role_arn: Option<String>,
    pub precedence: Option<i64>,
}

/// Attribute subset sent when updating a group. The group name is the
/// immutable key and only identifies the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupUpdate {
    pub user_pool_id: String,
    pub group_name: String,
    pub description: Option<String>,
    pub role_arn: Option<String>,
    pub precedence: Option<i64>,
}

/// Payload for creating a user. The provider delivers the invitation
/// with the temporary credentials itself.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub user_pool_id: String,
    pub username: String,
    pub attributes: HashMap<String, String>,
}
