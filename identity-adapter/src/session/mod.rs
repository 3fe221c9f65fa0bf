//! Session state machine driving login, challenge response, and
//! sign-out against the identity provider.

mod navigator;

pub use navigator::{FlashLevel, Navigator};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use provider_core::client::IdentityProvider;
use provider_core::types::{AuthOutcome, ChallengeKind, TokenSet, UserRecord};

use crate::config::AdapterConfig;
use crate::services::{AdapterError, MessageCatalog};

/// Where a session stands. The variants make the core invariant
/// structural: a session is authenticated, mid-challenge, or anonymous,
/// never two at once. Serializable so embedders can park it in their
/// session store between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionState {
    Anonymous,
    ChallengePending {
        challenge: ChallengeKind,
        session_token: String,
    },
    Authenticated {
        tokens: TokenSet,
        /// Memoized principal, resolved lazily on first access.
        identity: Option<UserRecord>,
    },
}

/// One instance per logical user session. Not internally synchronized:
/// concurrent auth attempts for the same session must be serialized by
/// the owner (e.g. a session-store lock).
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    messages: MessageCatalog,
    config: AdapterConfig,
    state: SessionState,
    pending_username: Option<String>,
}

impl AuthSession {
    pub fn new(
        config: AdapterConfig,
        provider: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        AuthSession {
            provider,
            navigator,
            messages: MessageCatalog::default(),
            config,
            state: SessionState::Anonymous,
            pending_username: None,
        }
    }

    /// Rebuild a session around state previously taken from [`state`].
    ///
    /// [`state`]: AuthSession::state
    pub fn resume(
        config: AdapterConfig,
        provider: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        state: SessionState,
    ) -> Self {
        AuthSession {
            state,
            ..AuthSession::new(config, provider, navigator)
        }
    }

    pub fn with_messages(mut self, messages: MessageCatalog) -> Self {
        self.messages = messages;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn logged_in(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn challenge(&self) -> Option<ChallengeKind> {
        match &self.state {
            SessionState::ChallengePending { challenge, .. } => Some(*challenge),
            _ => None,
        }
    }

    pub fn pending_username(&self) -> Option<&str> {
        self.pending_username.as_deref()
    }

    /// Start an authentication flow with raw provider parameters.
    ///
    /// Success with resolved identity redirects to the application
    /// root and returns true. An outstanding challenge moves the
    /// session to `ChallengePending` and redirects to that challenge's
    /// recovery endpoint. A provider error leaves the state untouched,
    /// flashes a message keyed by the error kind, and redirects to the
    /// login endpoint.
    pub async fn authenticate(&mut self, params: HashMap<String, String>) -> bool {
        match self
            .provider
            .initiate_auth(&self.config.client_id, &params)
            .await
        {
            Ok(outcome) => self.apply_outcome(outcome, true).await,
            Err(e) => self.fail(&e.into()),
        }
    }

    /// Answer the outstanding challenge. Valid only from
    /// `ChallengePending`; calling it in any other state is a no-op
    /// failure with no remote call.
    pub async fn respond_to_auth_challenge(
        &mut self,
        responses: HashMap<String, String>,
    ) -> bool {
        let (challenge, session_token) = match &self.state {
            SessionState::ChallengePending {
                challenge,
                session_token,
            } => (*challenge, session_token.clone()),
            _ => {
                tracing::warn!("challenge response with no challenge pending");
                return false;
            }
        };
        match self
            .provider
            .respond_to_auth_challenge(
                &self.config.client_id,
                challenge,
                &session_token,
                &responses,
            )
            .await
        {
            Ok(outcome) => self.apply_outcome(outcome, false).await,
            Err(e) => self.fail(&e.into()),
        }
    }

    async fn apply_outcome(&mut self, outcome: AuthOutcome, announce_challenge: bool) -> bool {
        match outcome {
            AuthOutcome::Authenticated(tokens) => {
                self.state = SessionState::Authenticated {
                    tokens,
                    identity: None,
                };
                self.pending_username = None;
                if self.current_identity().await.is_some() {
                    self.navigator.redirect_to(&self.config.routes.root_path);
                    true
                } else {
                    // current_identity already ran the error path
                    false
                }
            }
            AuthOutcome::Challenge {
                kind,
                session_token,
            } => {
                self.state = SessionState::ChallengePending {
                    challenge: kind,
                    session_token,
                };
                if announce_challenge {
                    self.navigator.flash(
                        FlashLevel::Warning,
                        self.messages.lookup(&kind.message_key()),
                    );
                }
                self.navigator
                    .redirect_to(&self.config.routes.challenge_path(kind));
                false
            }
        }
    }

    /// The authenticated principal, resolved lazily from the provider
    /// and memoized for the lifetime of this session object. Resolution
    /// failure runs the error path and yields nothing.
    pub async fn current_identity(&mut self) -> Option<&UserRecord> {
        let access_token = match &self.state {
            SessionState::Authenticated {
                identity: Some(_), ..
            } => None,
            SessionState::Authenticated { tokens, .. } => Some(tokens.access_token.clone()),
            _ => return None,
        };
        if let Some(token) = access_token {
            match self.provider.get_user(&token).await {
                Ok(record) => {
                    if let SessionState::Authenticated { identity, .. } = &mut self.state {
                        *identity = Some(record);
                    }
                }
                Err(e) => {
                    self.fail(&e.into());
                    return None;
                }
            }
        }
        match &self.state {
            SessionState::Authenticated { identity, .. } => identity.as_ref(),
            _ => None,
        }
    }

    /// End the session. Local state is cleared unconditionally before
    /// the remote sign-out so a failed provider call can never leave a
    /// half-authenticated session behind; the failure still runs the
    /// error path and reports false.
    pub async fn log_out(&mut self) -> bool {
        let access_token = match &self.state {
            SessionState::Authenticated { tokens, .. } => Some(tokens.access_token.clone()),
            _ => None,
        };
        self.state = SessionState::Anonymous;
        self.pending_username = None;
        if let Some(token) = access_token {
            if let Err(e) = self.provider.global_sign_out(&token).await {
                return self.fail(&e.into());
            }
        }
        self.navigator.redirect_to(&self.config.routes.login_path());
        true
    }

    /// Username/password convenience wrapper over `authenticate`. The
    /// username is stashed across a failed attempt so a follow-up
    /// challenge response can identify the account.
    pub async fn log_in(&mut self, username: &str, password: &str) -> bool {
        let mut params = HashMap::new();
        params.insert("USERNAME".to_string(), username.to_string());
        params.insert("PASSWORD".to_string(), password.to_string());
        let ok = self.authenticate(params).await;
        if !ok {
            self.pending_username = Some(username.to_string());
        }
        ok
    }

    /// Answer a `NEW_PASSWORD_REQUIRED` challenge using the username
    /// stashed by the preceding `log_in`.
    pub async fn replace_temporary_password(&mut self, new_password: &str) -> bool {
        let mut responses = HashMap::new();
        if let Some(username) = &self.pending_username {
            responses.insert("USERNAME".to_string(), username.clone());
        }
        responses.insert("NEW_PASSWORD".to_string(), new_password.to_string());
        self.respond_to_auth_challenge(responses).await
    }

    fn fail(&self, error: &AdapterError) -> bool {
        tracing::warn!(kind = error.kind(), error = %error, "auth operation failed");
        self.navigator
            .flash(FlashLevel::Danger, self.messages.lookup(error.kind()));
        self.navigator.redirect_to(&self.config.routes.login_path());
        false
    }
}
