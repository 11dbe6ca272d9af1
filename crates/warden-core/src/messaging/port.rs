use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, PrincipalId},
    messaging::types::{MemberPermissions, Removal, ResolvedPrincipal},
    Result,
};

/// Hexagonal port for the chat transport.
///
/// Telegram is the only implementation; handlers talk to this trait so they can be
/// exercised against a recording fake.
#[async_trait]
pub trait TransportPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Best-effort "typing..." indicator.
    async fn send_typing(&self, chat_id: ChatId) -> Result<()>;

    async fn remove_member(&self, chat_id: ChatId, member: PrincipalId, removal: Removal)
        -> Result<()>;

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        member: PrincipalId,
        permissions: MemberPermissions,
    ) -> Result<()>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    /// Resolve a public handle (without the leading `@`) to a principal.
    async fn resolve_handle(&self, handle: &str) -> Result<ResolvedPrincipal>;
}
