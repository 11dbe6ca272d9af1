//! Update classification.
//!
//! Every inbound update maps to exactly one [`Route`]; the first matching rule wins:
//! start/help, moderation command, co-owner edit, group greeting, private AI
//! conversation, and finally plain forward.

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    messaging::types::{IncomingUpdate, RepliedMessage},
    security::PrivilegedAction,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationAction {
    Ban,
    Mute,
    Kick,
    Delete,
}

impl ModerationAction {
    fn from_command(cmd: &str) -> Option<Self> {
        match cmd {
            "ban" => Some(Self::Ban),
            "mute" => Some(Self::Mute),
            "kick" => Some(Self::Kick),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn privilege(self) -> PrivilegedAction {
        match self {
            Self::Ban => PrivilegedAction::Ban,
            Self::Mute => PrivilegedAction::Mute,
            Self::Kick => PrivilegedAction::Kick,
            Self::Delete => PrivilegedAction::DeleteMessage,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipEdit {
    Add,
    Remove,
}

impl MembershipEdit {
    fn from_command(cmd: &str) -> Option<Self> {
        match cmd {
            "add" => Some(Self::Add),
            "unadd" => Some(Self::Remove),
            _ => None,
        }
    }

    pub fn privilege(self) -> PrivilegedAction {
        match self {
            Self::Add => PrivilegedAction::AddCoOwner,
            Self::Remove => PrivilegedAction::RemoveCoOwner,
        }
    }

    pub fn command(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "unadd",
        }
    }
}

#[derive(Clone, Debug)]
pub enum Route {
    /// `target` is `None` when the command was not sent as a reply.
    ModerationCommand {
        action: ModerationAction,
        target: Option<RepliedMessage>,
    },
    CoOwnerEdit {
        edit: MembershipEdit,
        handle: Option<String>,
    },
    Start,
    Greeting,
    AiConversation {
        text: String,
    },
    PlainForward,
}

pub fn classify(update: &IncomingUpdate) -> Route {
    let text = update.text.as_deref().unwrap_or("");

    if let Some((cmd, args)) = parse_command(text) {
        if cmd == "start" || cmd == "help" {
            return Route::Start;
        }
        if let Some(action) = ModerationAction::from_command(&cmd) {
            return Route::ModerationCommand {
                action,
                target: update.reply_to.clone(),
            };
        }
        if let Some(edit) = MembershipEdit::from_command(&cmd) {
            return Route::CoOwnerEdit {
                edit,
                handle: parse_handle(&args),
            };
        }
    }

    if update.chat.kind.is_group() && greeting_regex().is_match(text) {
        return Route::Greeting;
    }

    if update.chat.kind.is_private() && !text.trim().is_empty() {
        return Route::AiConversation {
            text: text.to_string(),
        };
    }

    Route::PlainForward
}

/// Split `/cmd@botname args...` into a lowercased command name and the raw args.
///
/// Returns `None` for text that is not a command.
pub fn parse_command(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    let mut parts = text.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();
    if cmd.is_empty() {
        return None;
    }

    Some((cmd, rest))
}

/// First argument with one leading `@` removed.
pub fn parse_handle(args: &str) -> Option<String> {
    let first = args.split_whitespace().next()?;
    let handle = first.strip_prefix('@').unwrap_or(first);
    if handle.is_empty() {
        return None;
    }
    Some(handle.to_string())
}

fn greeting_regex() -> &'static Regex {
    static GREETING: OnceLock<Regex> = OnceLock::new();
    GREETING.get_or_init(|| Regex::new(r"(?i)\b(hi|hello|hey|yo|hii|hlo)\b").expect("valid regex"))
}
