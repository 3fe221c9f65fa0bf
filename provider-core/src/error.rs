use thiserror::Error;

/// Failures surfaced by the remote identity provider.
///
/// `UserNotFound` and `InvalidParameter` are split out of the generic
/// `Service` bucket because callers branch on them: a missing user drives
/// the invite-then-create fallback, and an invalid parameter degrades a
/// creation flow to a boolean failure.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider service error ({kind}): {message}")]
    Service { kind: String, message: String },

    #[error("user not found")]
    UserNotFound,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn service(kind: impl Into<String>) -> Self {
        ProviderError::Service {
            kind: kind.into(),
            message: String::new(),
        }
    }

    pub fn service_with(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Service {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Stable key used to look up the user-facing message for this error.
    pub fn kind(&self) -> &str {
        match self {
            ProviderError::Service { kind, .. } => kind,
            ProviderError::UserNotFound => "user_not_found_exception",
            ProviderError::InvalidParameter(_) => "invalid_parameter_exception",
            ProviderError::Transport(_) => "service_error",
            ProviderError::Decode(_) => "service_error",
        }
    }
}

/// Map a wire-level exception type to the error taxonomy.
///
/// The provider reports failures as a namespaced exception name in a
/// `__type` field (e.g. `com.example.identity#NotAuthorizedException`).
/// The namespace is stripped and the bare name snake_cased so it can
/// double as a message-catalog key.
pub fn from_wire_type(wire_type: &str, message: &str) -> ProviderError {
    let name = wire_type.rsplit(['#', '.']).next().unwrap_or(wire_type);
    match name {
        "UserNotFoundException" => ProviderError::UserNotFound,
        "InvalidParameterException" => ProviderError::InvalidParameter(message.to_string()),
        other => ProviderError::Service {
            kind: snake_case(other),
            message: message.to_string(),
        },
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
