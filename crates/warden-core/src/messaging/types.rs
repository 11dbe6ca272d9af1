use crate::domain::{ChatId, MessageId, MessageRef, PrincipalId};

/// Messenger-agnostic inbound update.
///
/// Telegram-specific fields stay in the Telegram adapter; this carries only what
/// routing, authorization and forwarding look at.
#[derive(Clone, Debug)]
pub struct IncomingUpdate {
    pub chat: ChatInfo,
    pub message_id: MessageId,
    pub sender: Option<Sender>,
    pub text: Option<String>,
    pub reply_to: Option<RepliedMessage>,
}

impl IncomingUpdate {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat.id,
            message_id: self.message_id,
        }
    }

    pub fn sender_id(&self) -> Option<PrincipalId> {
        self.sender.as_ref().map(|s| s.id)
    }
}

#[derive(Clone, Debug)]
pub struct ChatInfo {
    pub id: ChatId,
    pub kind: ChatKind,
    pub title: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn is_group(self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }

    pub fn is_private(self) -> bool {
        self == ChatKind::Private
    }

    /// Platform name of the chat type, as shown in forwarded summaries.
    pub fn as_str(self) -> &'static str {
        match self {
            ChatKind::Private => "private",
            ChatKind::Group => "group",
            ChatKind::Supergroup => "supergroup",
            ChatKind::Channel => "channel",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub id: PrincipalId,
    pub first_name: String,
    pub username: Option<String>,
}

impl Sender {
    /// `@username` when the user has one, otherwise the first name.
    pub fn mention(&self) -> String {
        match &self.username {
            Some(u) if !u.is_empty() => format!("@{u}"),
            _ => self.first_name.clone(),
        }
    }
}

/// The message an update replies to (the target of moderation commands).
#[derive(Clone, Debug)]
pub struct RepliedMessage {
    pub message: MessageRef,
    pub author: Option<Sender>,
}

/// How a member is removed from a chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    /// Banned; cannot rejoin until unbanned.
    Permanent,
    /// Removed but allowed to rejoin.
    Temporary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberPermissions {
    pub can_send_messages: bool,
}

impl MemberPermissions {
    pub fn muted() -> Self {
        Self {
            can_send_messages: false,
        }
    }
}

/// A handle resolved to a platform identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPrincipal {
    pub id: PrincipalId,
    pub handle: String,
}
