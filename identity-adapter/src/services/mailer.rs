use async_trait::async_trait;
use provider_core::types::UserRecord;

use super::error::AdapterError;

/// Outbound invitation notification. Delivery itself is owned by the
/// embedding application; the adapter only consumes this seam.
#[async_trait]
pub trait InviteMailer: Send + Sync {
    async fn send_group_invite(
        &self,
        user: &UserRecord,
        group_name: &str,
    ) -> Result<(), AdapterError>;
}

#[derive(Clone)]
pub struct MockInviteMailer;

#[async_trait]
impl InviteMailer for MockInviteMailer {
    async fn send_group_invite(
        &self,
        _user: &UserRecord,
        _group_name: &str,
    ) -> Result<(), AdapterError> {
        Ok(())
    }
}
