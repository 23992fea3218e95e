//! Anonymous caller identity.

use crate::error::StoreError;
use async_trait::async_trait;
use tracing::{info, warn};

/// Something that can establish an anonymous identity for the caller.
///
/// Signing in when an identity already exists returns the existing one.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_anonymously(&self) -> Result<String, StoreError>;
}

/// Sign in anonymously, logging rather than returning any failure.
///
/// Viewing a list does not need an identity; writes made without one are
/// rejected by the store itself.
pub async fn bootstrap_identity(provider: &dyn IdentityProvider) -> Option<String> {
    match provider.sign_in_anonymously().await {
        Ok(uid) => {
            info!("Signed in anonymously as {}", uid);
            Some(uid)
        }
        Err(e) => {
            warn!("Anonymous sign-in failed: {}", e);
            None
        }
    }
}
