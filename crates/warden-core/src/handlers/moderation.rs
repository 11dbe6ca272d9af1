use std::sync::Arc;

use crate::{
    errors::Error,
    messaging::{
        port::TransportPort,
        types::{IncomingUpdate, MemberPermissions, Removal, RepliedMessage},
    },
    routing::ModerationAction,
    security::Authority,
    Result,
};

use super::reply;

pub const NOT_AUTHORIZED: &str = "🚫 You are not authorized to use this command.";
pub const REPLY_REQUIRED: &str = "⚠️ Reply to a user's message to perform this action.";
pub const OWNER_PROTECTED: &str = "🚫 The main owner cannot be moderated.";
pub const ACTION_FAILED: &str = "❌ Failed to perform action. Make sure the bot is admin.";

#[derive(Debug)]
pub enum ModerationOutcome {
    Applied {
        action: ModerationAction,
        target: String,
    },
    Denied,
    MissingTarget,
    /// The replied-to author is the primary owner and the sender is not.
    Protected {
        action: ModerationAction,
        target: String,
    },
    Failed {
        action: ModerationAction,
        target: String,
        error: Error,
    },
}

/// Executes reply-targeted moderation commands for authorized principals.
pub struct ModerationHandler {
    authority: Authority,
    transport: Arc<dyn TransportPort>,
}

impl ModerationHandler {
    pub fn new(authority: Authority, transport: Arc<dyn TransportPort>) -> Self {
        Self {
            authority,
            transport,
        }
    }

    pub async fn handle(
        &self,
        update: &IncomingUpdate,
        action: ModerationAction,
        target: Option<&RepliedMessage>,
    ) -> ModerationOutcome {
        let chat_id = update.chat.id;

        if !self
            .authority
            .permits(update.sender_id(), action.privilege())
            .await
        {
            reply(self.transport.as_ref(), chat_id, NOT_AUTHORIZED).await;
            return ModerationOutcome::Denied;
        }

        let Some(target) = target else {
            reply(self.transport.as_ref(), chat_id, REPLY_REQUIRED).await;
            return ModerationOutcome::MissingTarget;
        };

        // Delete only needs the message; the other actions need its author.
        let author = target.author.as_ref();
        if author.is_none() && action != ModerationAction::Delete {
            reply(self.transport.as_ref(), chat_id, REPLY_REQUIRED).await;
            return ModerationOutcome::MissingTarget;
        }
        let name = author
            .map(|a| a.mention())
            .unwrap_or_else(|| "unknown".to_string());

        if let Some(author) = author {
            let allowed = update
                .sender_id()
                .is_some_and(|actor| self.authority.may_target(actor, author.id));
            if !allowed {
                reply(self.transport.as_ref(), chat_id, OWNER_PROTECTED).await;
                return ModerationOutcome::Protected {
                    action,
                    target: name,
                };
            }
        }

        match self.apply(update, action, target).await {
            Ok(()) => {
                let ack = match action {
                    ModerationAction::Ban => format!("🚫 Banned {name}"),
                    ModerationAction::Kick => format!("👢 Kicked {name}"),
                    ModerationAction::Mute => format!("🔇 Muted {name}"),
                    ModerationAction::Delete => format!("🗑️ Deleted message from {name}"),
                };
                reply(self.transport.as_ref(), chat_id, &ack).await;
                ModerationOutcome::Applied {
                    action,
                    target: name,
                }
            }
            Err(error) => {
                reply(self.transport.as_ref(), chat_id, ACTION_FAILED).await;
                ModerationOutcome::Failed {
                    action,
                    target: name,
                    error,
                }
            }
        }
    }

    async fn apply(
        &self,
        update: &IncomingUpdate,
        action: ModerationAction,
        target: &RepliedMessage,
    ) -> Result<()> {
        let chat_id = update.chat.id;
        let author = target.author.as_ref().map(|a| a.id);
        match (action, author) {
            (ModerationAction::Delete, _) => self.transport.delete_message(target.message).await,
            (ModerationAction::Ban, Some(member)) => {
                self.transport
                    .remove_member(chat_id, member, Removal::Permanent)
                    .await
            }
            (ModerationAction::Kick, Some(member)) => {
                self.transport
                    .remove_member(chat_id, member, Removal::Temporary)
                    .await
            }
            (ModerationAction::Mute, Some(member)) => {
                self.transport
                    .restrict_member(chat_id, member, MemberPermissions::muted())
                    .await
            }
            (_, None) => Err(Error::Transport(
                "replied-to message has no author".to_string(),
            )),
        }
    }
}
