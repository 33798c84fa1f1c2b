//! Password-reset delivery
//!
//! Outbound mail is not part of this service. The default implementation
//! writes the reset token to the log so local setups can finish the flow.

use async_trait::async_trait;

use crate::store::TempCredential;

use crate::BoxError;

#[async_trait]
pub trait ResetDelivery: Send + Sync {
    async fn deliver(&self, email: &str, credential: &TempCredential) -> Result<(), BoxError>;
}

/// Logs deliveries. The token itself is only logged when `reveal_token` is set.
#[derive(Debug, Clone, Default)]
pub struct LogDelivery {
    pub reveal_token: bool,
}

#[async_trait]
impl ResetDelivery for LogDelivery {
    async fn deliver(&self, email: &str, credential: &TempCredential) -> Result<(), BoxError> {
        if self.reveal_token {
            tracing::info!(
                to = email,
                token = %credential.token,
                expires_at = credential.expires_at,
                "Password reset token issued"
            );
        } else {
            tracing::info!(
                to = email,
                expires_at = credential.expires_at,
                "Password reset token issued"
            );
        }
        Ok(())
    }
}
