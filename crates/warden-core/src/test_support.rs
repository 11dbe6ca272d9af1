//! Fakes for the ports plus small update builders, shared by unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef, PrincipalId},
    errors::Error,
    messaging::{
        port::TransportPort,
        types::{
            ChatInfo, ChatKind, IncomingUpdate, MemberPermissions, Removal, RepliedMessage,
            ResolvedPrincipal, Sender,
        },
    },
    ports::{CoOwnerRepository, ConversationPort},
    Result,
};

// ============== Repository ==============

#[derive(Default)]
pub struct MemoryRepository {
    ids: Mutex<Vec<PrincipalId>>,
    saves: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryRepository {
    pub fn with_ids(ids: Vec<PrincipalId>) -> Self {
        Self {
            ids: Mutex::new(ids),
            ..Self::default()
        }
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn persisted(&self) -> Vec<PrincipalId> {
        self.ids.lock().unwrap().clone()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CoOwnerRepository for MemoryRepository {
    async fn load(&self) -> Result<Vec<PrincipalId>> {
        Ok(self.persisted())
    }

    async fn save(&self, ids: &[PrincipalId]) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Persistence {
                path: "memory".into(),
                reason: "disk full".to_string(),
            });
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.ids.lock().unwrap() = ids.to_vec();
        Ok(())
    }
}

// ============== Transport ==============

#[derive(Default)]
pub struct RecordingTransport {
    next_id: Mutex<i32>,
    sent: Mutex<Vec<(ChatId, String)>>,
    typing: Mutex<Vec<ChatId>>,
    removals: Mutex<Vec<(ChatId, PrincipalId, Removal)>>,
    restrictions: Mutex<Vec<(ChatId, PrincipalId, MemberPermissions)>>,
    deletions: Mutex<Vec<MessageRef>>,
    handles: Mutex<HashMap<String, PrincipalId>>,
    resolutions: AtomicUsize,
    unreachable: Mutex<HashSet<ChatId>>,
    reject_moderation: AtomicBool,
}

impl RecordingTransport {
    pub fn with_handle(self, handle: &str, id: i64) -> Self {
        self.handles
            .lock()
            .unwrap()
            .insert(handle.to_string(), PrincipalId(id));
        self
    }

    /// Every `send_text` to this chat fails.
    pub fn unreachable(self, chat: i64) -> Self {
        self.unreachable.lock().unwrap().insert(ChatId(chat));
        self
    }

    /// Moderation primitives fail as if the bot were not an admin.
    pub fn rejecting_moderation(self) -> Self {
        self.reject_moderation.store(true, Ordering::SeqCst);
        self
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(c, _)| *c == ChatId(chat))
            .map(|(_, t)| t)
            .collect()
    }

    pub fn typing(&self) -> Vec<ChatId> {
        self.typing.lock().unwrap().clone()
    }

    pub fn removals(&self) -> Vec<(ChatId, PrincipalId, Removal)> {
        self.removals.lock().unwrap().clone()
    }

    pub fn restrictions(&self) -> Vec<(ChatId, PrincipalId, MemberPermissions)> {
        self.restrictions.lock().unwrap().clone()
    }

    pub fn deletions(&self) -> Vec<MessageRef> {
        self.deletions.lock().unwrap().clone()
    }

    pub fn resolution_calls(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    fn check_moderation(&self) -> Result<()> {
        if self.reject_moderation.load(Ordering::SeqCst) {
            return Err(Error::Transport(
                "Bad Request: not enough rights".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TransportPort for RecordingTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        if self.unreachable.lock().unwrap().contains(&chat_id) {
            return Err(Error::Transport(
                "Forbidden: bot was blocked by the user".to_string(),
            ));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(*next),
        })
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<()> {
        self.typing.lock().unwrap().push(chat_id);
        Ok(())
    }

    async fn remove_member(
        &self,
        chat_id: ChatId,
        member: PrincipalId,
        removal: Removal,
    ) -> Result<()> {
        self.check_moderation()?;
        self.removals
            .lock()
            .unwrap()
            .push((chat_id, member, removal));
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        member: PrincipalId,
        permissions: MemberPermissions,
    ) -> Result<()> {
        self.check_moderation()?;
        self.restrictions
            .lock()
            .unwrap()
            .push((chat_id, member, permissions));
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.check_moderation()?;
        self.deletions.lock().unwrap().push(msg);
        Ok(())
    }

    async fn resolve_handle(&self, handle: &str) -> Result<ResolvedPrincipal> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        let id = self.handles.lock().unwrap().get(handle).copied();
        id.map(|id| ResolvedPrincipal {
            id,
            handle: handle.to_string(),
        })
        .ok_or_else(|| Error::Transport("Bad Request: chat not found".to_string()))
    }
}

// ============== Conversation ==============

/// Answers every prompt with a fixed reply, or fails every call when built with `failing`.
pub struct ScriptedConversation {
    answer: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConversation {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationPort for ScriptedConversation {
    async fn reply(&self, text: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(text.to_string());
        self.answer
            .clone()
            .ok_or_else(|| Error::External("ai endpoint unreachable".to_string()))
    }
}

// ============== Builders ==============

pub const GROUP_CHAT: i64 = -1001;

pub fn sender(id: i64, first_name: &str) -> Sender {
    Sender {
        id: PrincipalId(id),
        first_name: first_name.to_string(),
        username: Some(first_name.to_lowercase()),
    }
}

/// An update from `from` (named `User<from>`); private chats use the sender's id.
pub fn update(kind: ChatKind, from: i64, text: Option<&str>) -> IncomingUpdate {
    let (id, title) = if kind.is_private() {
        (ChatId(from), None)
    } else {
        (ChatId(GROUP_CHAT), Some("Test Group".to_string()))
    };
    IncomingUpdate {
        chat: ChatInfo { id, kind, title },
        message_id: MessageId(50),
        sender: Some(sender(from, &format!("User{from}"))),
        text: text.map(|t| t.to_string()),
        reply_to: None,
    }
}

pub fn reply_from(author: i64, first_name: &str) -> RepliedMessage {
    RepliedMessage {
        message: MessageRef {
            chat_id: ChatId(GROUP_CHAT),
            message_id: MessageId(40),
        },
        author: Some(sender(author, first_name)),
    }
}
