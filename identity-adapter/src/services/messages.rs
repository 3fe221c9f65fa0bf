use std::collections::HashMap;

const DEFAULT_MESSAGE: &str = "Something went wrong. Please try again.";

/// User-facing messages keyed by error kind or challenge name.
///
/// Ships a default English table; embedders override or extend entries
/// through [`MessageCatalog::insert`].
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    entries: HashMap<String, String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let mut entries = HashMap::new();
        for (key, message) in [
            ("not_authorized_exception", "Incorrect username or password."),
            ("user_not_found_exception", "No account exists for that address."),
            ("user_not_confirmed_exception", "Your account has not been confirmed yet."),
            ("password_reset_required_exception", "A password reset is required before signing in."),
            ("invalid_parameter_exception", "One of the submitted values was not accepted."),
            ("invalid_password_exception", "The password does not meet the requirements."),
            ("too_many_requests_exception", "Too many attempts. Please wait and try again."),
            ("expired_code_exception", "That code has expired. Request a new one."),
            ("code_mismatch_exception", "The code you entered does not match."),
            ("limit_exceeded_exception", "Attempt limit exceeded. Please try again later."),
            ("service_error", "The sign-in service is currently unavailable."),
            ("mail_delivery_failed", "The invitation email could not be sent."),
            ("new_password_required", "Please choose a new password to continue."),
            ("sms_mfa", "Enter the code we sent to your phone."),
            ("software_token_mfa", "Enter the code from your authenticator app."),
            ("mfa_setup", "Finish setting up multi-factor authentication."),
        ] {
            entries.insert(key.to_string(), message.to_string());
        }
        MessageCatalog { entries }
    }
}

impl MessageCatalog {
    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.entries.insert(key.into(), message.into());
    }

    pub fn lookup(&self, key: &str) -> &str {
        self.entries
            .get(key)
            .map(String::as_str)
            .unwrap_or(DEFAULT_MESSAGE)
    }
}
