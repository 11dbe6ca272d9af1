use async_trait::async_trait;

use crate::{domain::PrincipalId, Result};

/// Hexagonal port for the external conversational-AI endpoint.
///
/// One call is one single-turn exchange; implementations must bound their own
/// latency and never retry.
#[async_trait]
pub trait ConversationPort: Send + Sync {
    async fn reply(&self, text: &str) -> Result<String>;
}

/// Load/store contract for the persisted co-owner list.
#[async_trait]
pub trait CoOwnerRepository: Send + Sync {
    /// Returns an empty list when nothing has been persisted yet.
    async fn load(&self) -> Result<Vec<PrincipalId>>;

    /// Replaces the persisted list. A later `load` never observes a partial write.
    async fn save(&self, ids: &[PrincipalId]) -> Result<()>;
}
