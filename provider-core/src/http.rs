//! HTTP implementation of [`IdentityProvider`].
//!
//! The provider speaks a JSON-POST protocol: every operation is a POST
//! against a single endpoint, selected by an `X-Amz-Target` header, with
//! failures reported as a JSON body carrying a namespaced `__type`
//! exception name.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::instrument;

use crate::client::IdentityProvider;
use crate::error::{from_wire_type, ProviderError};
use crate::types::{
    AuthOutcome, ChallengeKind, GroupRecord, GroupUpdate, LookupOutcome, NewGroup, NewUser, Page,
    TokenSet, UserRecord,
};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE_JSON: &str = "application/x-amz-json-1.1";
const AUTH_FLOW: &str = "USER_PASSWORD_AUTH";

/// Listing calls cap the batch size the provider will honor.
const MAX_PAGE_SIZE: usize = 60;

#[derive(Clone)]
pub struct HttpProvider {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpProvider {
    /// Build a provider client against `endpoint`. Timeouts and retry
    /// policy are the caller's concern; pass a preconfigured client
    /// through [`HttpProvider::with_client`] to set them.
    pub fn new(endpoint: &str) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: &str) -> Self {
        tracing::info!(endpoint = %endpoint, "identity provider client configured");
        Self {
            http,
            endpoint: endpoint.to_string(),
        }
    }

    #[instrument(skip(self, body), fields(op = %op))]
    async fn call(&self, op: &str, body: Value) -> Result<Value, ProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, op))
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await?;
        if status.is_success() {
            Ok(payload)
        } else {
            let err = error_from_payload(&payload);
            tracing::warn!(op = %op, kind = err.kind(), "provider call failed");
            Err(err)
        }
    }
}

fn error_from_payload(payload: &Value) -> ProviderError {
    let wire_type = payload
        .get("__type")
        .and_then(Value::as_str)
        .unwrap_or("ServiceError");
    let message = payload
        .get("message")
        .or_else(|| payload.get("Message"))
        .and_then(Value::as_str)
        .unwrap_or("");
    from_wire_type(wire_type, message)
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Dates arrive as fractional epoch seconds.
fn date_field(v: &Value, key: &str) -> Option<DateTime<Utc>> {
    v.get(key)
        .and_then(Value::as_f64)
        .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single())
}

fn group_from_value(v: &Value) -> GroupRecord {
    GroupRecord {
        group_name: str_field(v, "GroupName").unwrap_or_default(),
        description: str_field(v, "Description"),
        role_arn: str_field(v, "RoleArn"),
        precedence: v.get("Precedence").and_then(Value::as_i64),
        creation_date: date_field(v, "CreationDate"),
        last_modified_date: date_field(v, "LastModifiedDate"),
        user_pool_id: str_field(v, "UserPoolId").unwrap_or_default(),
    }
}

/// Users arrive with their attribute bag as a `[{Name, Value}]` list;
/// the email is folded out of the bag for convenience.
fn user_from_value(v: &Value) -> UserRecord {
    let mut attributes = HashMap::new();
    let attr_list = v
        .get("UserAttributes")
        .or_else(|| v.get("Attributes"))
        .and_then(Value::as_array);
    if let Some(list) = attr_list {
        for attr in list {
            if let (Some(name), Some(value)) = (str_field(attr, "Name"), str_field(attr, "Value"))
            {
                attributes.insert(name, value);
            }
        }
    }
    UserRecord {
        username: str_field(v, "Username").unwrap_or_default(),
        email: attributes.get("email").cloned(),
        user_status: str_field(v, "UserStatus")
            .unwrap_or_else(|| "UNKNOWN".to_string())
            .into(),
        enabled: v.get("Enabled").and_then(Value::as_bool).unwrap_or(true),
        attributes,
        user_create_date: date_field(v, "UserCreateDate"),
        user_last_modified_date: date_field(v, "UserLastModifiedDate"),
    }
}

fn auth_outcome_from_value(v: &Value) -> Result<AuthOutcome, ProviderError> {
    if let Some(name) = v.get("ChallengeName").and_then(Value::as_str) {
        let kind: ChallengeKind = name.parse().map_err(|_| {
            ProviderError::service_with("unsupported_challenge", format!("challenge {}", name))
        })?;
        let session_token = str_field(v, "Session").unwrap_or_default();
        return Ok(AuthOutcome::Challenge {
            kind,
            session_token,
        });
    }
    let result = v.get("AuthenticationResult").ok_or_else(|| {
        ProviderError::service_with("service_error", "response carried neither tokens nor challenge")
    })?;
    Ok(AuthOutcome::Authenticated(TokenSet {
        access_token: str_field(result, "AccessToken").unwrap_or_default(),
        id_token: str_field(result, "IdToken"),
        refresh_token: str_field(result, "RefreshToken"),
        expires_in: result.get("ExpiresIn").and_then(Value::as_i64),
    }))
}

fn attribute_list(attributes: &HashMap<String, String>) -> Value {
    Value::Array(
        attributes
            .iter()
            .map(|(name, value)| json!({ "Name": name, "Value": value }))
            .collect(),
    )
}

fn page_params(body: &mut Value, token_key: &str, token: Option<&str>, size: Option<usize>) {
    if let Some(token) = token {
        body[token_key] = json!(token);
    }
    if let Some(size) = size {
        body["Limit"] = json!(size.min(MAX_PAGE_SIZE) as i64);
    }
}

#[async_trait]
impl IdentityProvider for HttpProvider {
    async fn create_group(&self, group: NewGroup) -> Result<GroupRecord, ProviderError> {
        let mut body = json!({
            "UserPoolId": group.user_pool_id,
            "GroupName": group.group_name,
        });
        if let Some(description) = &group.description {
            body["Description"] = json!(description);
        }
        if let Some(role_arn) = &group.role_arn {
            body["RoleArn"] = json!(role_arn);
        }
        if let Some(precedence) = group.precedence {
            body["Precedence"] = json!(precedence);
        }
        let payload = self.call("CreateGroup", body).await?;
        Ok(group_from_value(payload.get("Group").unwrap_or(&payload)))
    }

    async fn update_group(&self, group: GroupUpdate) -> Result<GroupRecord, ProviderError> {
        let mut body = json!({
            "UserPoolId": group.user_pool_id,
            "GroupName": group.group_name,
        });
        if let Some(description) = &group.description {
            body["Description"] = json!(description);
        }
        if let Some(role_arn) = &group.role_arn {
            body["RoleArn"] = json!(role_arn);
        }
        if let Some(precedence) = group.precedence {
            body["Precedence"] = json!(precedence);
        }
        let payload = self.call("UpdateGroup", body).await?;
        Ok(group_from_value(payload.get("Group").unwrap_or(&payload)))
    }

    async fn delete_group(&self, pool: &str, group_name: &str) -> Result<(), ProviderError> {
        self.call(
            "DeleteGroup",
            json!({ "UserPoolId": pool, "GroupName": group_name }),
        )
        .await?;
        Ok(())
    }

    async fn get_group(&self, pool: &str, group_name: &str) -> Result<GroupRecord, ProviderError> {
        let payload = self
            .call(
                "GetGroup",
                json!({ "UserPoolId": pool, "GroupName": group_name }),
            )
            .await?;
        Ok(group_from_value(payload.get("Group").unwrap_or(&payload)))
    }

    async fn list_groups(
        &self,
        pool: &str,
        page_token: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Page<GroupRecord>, ProviderError> {
        let mut body = json!({ "UserPoolId": pool });
        page_params(&mut body, "NextToken", page_token, page_size);
        let payload = self.call("ListGroups", body).await?;
        let items = payload
            .get("Groups")
            .and_then(Value::as_array)
            .map(|groups| groups.iter().map(group_from_value).collect())
            .unwrap_or_default();
        Ok(Page {
            items,
            next_token: str_field(&payload, "NextToken"),
        })
    }

    async fn admin_add_user_to_group(
        &self,
        pool: &str,
        username: &str,
        group_name: &str,
    ) -> Result<(), ProviderError> {
        self.call(
            "AdminAddUserToGroup",
            json!({ "UserPoolId": pool, "Username": username, "GroupName": group_name }),
        )
        .await?;
        Ok(())
    }

    async fn admin_remove_user_from_group(
        &self,
        pool: &str,
        username: &str,
        group_name: &str,
    ) -> Result<(), ProviderError> {
        self.call(
            "AdminRemoveUserFromGroup",
            json!({ "UserPoolId": pool, "Username": username, "GroupName": group_name }),
        )
        .await?;
        Ok(())
    }

    async fn list_users_in_group(
        &self,
        pool: &str,
        group_name: &str,
        page_token: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Page<UserRecord>, ProviderError> {
        let mut body = json!({ "UserPoolId": pool, "GroupName": group_name });
        page_params(&mut body, "NextToken", page_token, page_size);
        let payload = self.call("ListUsersInGroup", body).await?;
        let items = payload
            .get("Users")
            .and_then(Value::as_array)
            .map(|users| users.iter().map(user_from_value).collect())
            .unwrap_or_default();
        Ok(Page {
            items,
            next_token: str_field(&payload, "NextToken"),
        })
    }

    async fn admin_get_user(
        &self,
        pool: &str,
        username: &str,
    ) -> Result<UserRecord, ProviderError> {
        let payload = self
            .call(
                "AdminGetUser",
                json!({ "UserPoolId": pool, "Username": username }),
            )
            .await?;
        Ok(user_from_value(&payload))
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
        let body = json!({
            "UserPoolId": user.user_pool_id,
            "Username": user.username,
            "UserAttributes": attribute_list(&user.attributes),
            "DesiredDeliveryMediums": ["EMAIL"],
        });
        let payload = self.call("AdminCreateUser", body).await?;
        Ok(user_from_value(payload.get("User").unwrap_or(&payload)))
    }

    async fn admin_update_user_attributes(
        &self,
        pool: &str,
        username: &str,
        attributes: HashMap<String, String>,
    ) -> Result<(), ProviderError> {
        self.call(
            "AdminUpdateUserAttributes",
            json!({
                "UserPoolId": pool,
                "Username": username,
                "UserAttributes": attribute_list(&attributes),
            }),
        )
        .await?;
        Ok(())
    }

    async fn admin_delete_user(&self, pool: &str, username: &str) -> Result<(), ProviderError> {
        self.call(
            "AdminDeleteUser",
            json!({ "UserPoolId": pool, "Username": username }),
        )
        .await?;
        Ok(())
    }

    async fn admin_reset_user_password(
        &self,
        pool: &str,
        username: &str,
    ) -> Result<(), ProviderError> {
        self.call(
            "AdminResetUserPassword",
            json!({ "UserPoolId": pool, "Username": username }),
        )
        .await?;
        Ok(())
    }

    async fn list_users(
        &self,
        pool: &str,
        page_token: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Page<UserRecord>, ProviderError> {
        let mut body = json!({ "UserPoolId": pool });
        page_params(&mut body, "PaginationToken", page_token, page_size);
        let payload = self.call("ListUsers", body).await?;
        let items = payload
            .get("Users")
            .and_then(Value::as_array)
            .map(|users| users.iter().map(user_from_value).collect())
            .unwrap_or_default();
        Ok(Page {
            items,
            next_token: str_field(&payload, "PaginationToken"),
        })
    }

    async fn initiate_auth(
        &self,
        client_id: &str,
        params: &HashMap<String, String>,
    ) -> Result<AuthOutcome, ProviderError> {
        let payload = self
            .call(
                "InitiateAuth",
                json!({
                    "ClientId": client_id,
                    "AuthFlow": AUTH_FLOW,
                    "AuthParameters": params,
                }),
            )
            .await?;
        auth_outcome_from_value(&payload)
    }

    async fn respond_to_auth_challenge(
        &self,
        client_id: &str,
        challenge: ChallengeKind,
        session_token: &str,
        responses: &HashMap<String, String>,
    ) -> Result<AuthOutcome, ProviderError> {
        let payload = self
            .call(
                "RespondToAuthChallenge",
                json!({
                    "ClientId": client_id,
                    "ChallengeName": challenge.as_provider_str(),
                    "Session": session_token,
                    "ChallengeResponses": responses,
                }),
            )
            .await?;
        auth_outcome_from_value(&payload)
    }

    async fn get_user(&self, access_token: &str) -> Result<UserRecord, ProviderError> {
        let payload = self
            .call("GetUser", json!({ "AccessToken": access_token }))
            .await?;
        Ok(user_from_value(&payload))
    }

    async fn global_sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        self.call("GlobalSignOut", json!({ "AccessToken": access_token }))
            .await?;
        Ok(())
    }
}
