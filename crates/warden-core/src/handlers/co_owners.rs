use std::sync::Arc;

use tracing::debug;

use crate::{
    domain::PrincipalId,
    errors::Error,
    messaging::{port::TransportPort, types::IncomingUpdate},
    principals::Edit,
    routing::MembershipEdit,
    security::Authority,
};

use super::reply;

pub const NOT_FOUND: &str = "❌ Invalid username or user not found.";
pub const SAVE_FAILED: &str = "❌ Could not save co-owner list. Nothing was changed.";

#[derive(Debug)]
pub enum CoOwnerOutcome {
    Applied {
        edit: MembershipEdit,
        principal: PrincipalId,
        handle: String,
    },
    /// Already a member (add) or not a member (remove).
    Unchanged {
        edit: MembershipEdit,
        principal: PrincipalId,
        handle: String,
    },
    Denied,
    Usage,
    /// `error` is `None` when the handle was rejected before any lookup.
    NotFound {
        handle: String,
        error: Option<Error>,
    },
    PersistFailed {
        edit: MembershipEdit,
        principal: PrincipalId,
        error: Error,
    },
}

/// `/add` and `/unadd`, reserved to the primary owner.
pub struct CoOwnerHandler {
    authority: Authority,
    transport: Arc<dyn TransportPort>,
}

impl CoOwnerHandler {
    pub fn new(authority: Authority, transport: Arc<dyn TransportPort>) -> Self {
        Self {
            authority,
            transport,
        }
    }

    pub async fn handle(
        &self,
        update: &IncomingUpdate,
        edit: MembershipEdit,
        handle: Option<&str>,
    ) -> CoOwnerOutcome {
        let chat_id = update.chat.id;
        let transport = self.transport.as_ref();

        // Checked before resolving so unauthorized callers learn nothing about membership.
        if !self
            .authority
            .permits(update.sender_id(), edit.privilege())
            .await
        {
            let refusal = match edit {
                MembershipEdit::Add => "🚫 Only main owner can add co-owners.",
                MembershipEdit::Remove => "🚫 Only main owner can remove co-owners.",
            };
            reply(transport, chat_id, refusal).await;
            return CoOwnerOutcome::Denied;
        }

        let Some(handle) = handle else {
            let usage = format!("⚠️ Usage: /{} @username", edit.command());
            reply(transport, chat_id, &usage).await;
            return CoOwnerOutcome::Usage;
        };

        if !is_valid_handle(handle) {
            reply(transport, chat_id, NOT_FOUND).await;
            return CoOwnerOutcome::NotFound {
                handle: handle.to_string(),
                error: None,
            };
        }

        let principal = match transport.resolve_handle(handle).await {
            Ok(resolved) => resolved.id,
            Err(e) => {
                debug!(handle, error = %e, "handle resolution failed");
                reply(transport, chat_id, NOT_FOUND).await;
                return CoOwnerOutcome::NotFound {
                    handle: handle.to_string(),
                    error: Some(e),
                };
            }
        };

        let store = self.authority.store();
        let result = match edit {
            MembershipEdit::Add => store.add(principal).await,
            MembershipEdit::Remove => store.remove(principal).await,
        };

        match result {
            Ok(Edit::Applied) => {
                let msg = match edit {
                    MembershipEdit::Add => format!("✅ @{handle} added as co-owner."),
                    MembershipEdit::Remove => format!("❎ @{handle} removed from co-owners."),
                };
                reply(transport, chat_id, &msg).await;
                CoOwnerOutcome::Applied {
                    edit,
                    principal,
                    handle: handle.to_string(),
                }
            }
            Ok(Edit::Unchanged) => {
                let msg = match edit {
                    MembershipEdit::Add => format!("ℹ️ @{handle} is already a co-owner."),
                    MembershipEdit::Remove => format!("ℹ️ @{handle} is not a co-owner."),
                };
                reply(transport, chat_id, &msg).await;
                CoOwnerOutcome::Unchanged {
                    edit,
                    principal,
                    handle: handle.to_string(),
                }
            }
            Err(error) => {
                reply(transport, chat_id, SAVE_FAILED).await;
                CoOwnerOutcome::PersistFailed {
                    edit,
                    principal,
                    error,
                }
            }
        }
    }
}

/// Telegram handles are ASCII letters, digits and underscores.
fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
