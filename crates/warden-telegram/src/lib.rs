//! Telegram adapter (teloxide).
//!
//! This crate implements the `warden-core` TransportPort over the Telegram Bot API.

use std::{future::IntoFuture, time::Duration};

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ChatPermissions, Recipient},
    RequestError,
};

use tokio::time::{sleep, timeout};

pub mod handlers;
pub mod router;

use warden_core::{
    domain::{ChatId, MessageId, MessageRef, PrincipalId},
    errors::Error,
    messaging::{
        port::TransportPort,
        types::{MemberPermissions, Removal, ResolvedPrincipal},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    call_timeout: Duration,
}

impl TelegramTransport {
    pub fn new(bot: Bot, call_timeout: Duration) -> Self {
        Self { bot, call_timeout }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn tg_user(member: PrincipalId) -> Result<teloxide::types::UserId> {
        u64::try_from(member.0)
            .map(teloxide::types::UserId)
            .map_err(|_| Error::Transport(format!("not a user id: {member}")))
    }

    fn tg_permissions(permissions: MemberPermissions) -> ChatPermissions {
        if permissions.can_send_messages {
            ChatPermissions::SEND_MESSAGES
        } else {
            ChatPermissions::empty()
        }
    }

    fn map_err(e: RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    /// Run one Bot API call under the per-call timeout.
    ///
    /// A flood-control `RetryAfter` answer is retried once after the requested wait;
    /// every other failure is returned as is.
    async fn call<T, Fut>(&self, operation: &'static str, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            let res = timeout(self.call_timeout, op().into_future())
                .await
                .map_err(|_| Error::Timeout {
                    operation,
                    after: self.call_timeout,
                })?;
            match res {
                Ok(v) => return Ok(v),
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    sleep(d).await;
                }
                Err(other) => return Err(Self::map_err(other)),
            }
        }
    }
}

#[async_trait]
impl TransportPort for TelegramTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .call("sendMessage", || {
                self.bot.send_message(Self::tg_chat(chat_id), text.to_string())
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<()> {
        self.call("sendChatAction", || {
            self.bot
                .send_chat_action(Self::tg_chat(chat_id), teloxide::types::ChatAction::Typing)
        })
        .await?;
        Ok(())
    }

    async fn remove_member(
        &self,
        chat_id: ChatId,
        member: PrincipalId,
        removal: Removal,
    ) -> Result<()> {
        let user = Self::tg_user(member)?;
        self.call("banChatMember", || {
            self.bot.ban_chat_member(Self::tg_chat(chat_id), user)
        })
        .await?;

        // Kick = ban + immediate unban, so the member may rejoin.
        if removal == Removal::Temporary {
            self.call("unbanChatMember", || {
                self.bot
                    .unban_chat_member(Self::tg_chat(chat_id), user)
                    .only_if_banned(true)
            })
            .await?;
        }
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        member: PrincipalId,
        permissions: MemberPermissions,
    ) -> Result<()> {
        let user = Self::tg_user(member)?;
        let perms = Self::tg_permissions(permissions);
        self.call("restrictChatMember", || {
            self.bot
                .restrict_chat_member(Self::tg_chat(chat_id), user, perms)
        })
        .await?;
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.call("deleteMessage", || {
            self.bot
                .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
        })
        .await?;
        Ok(())
    }

    async fn resolve_handle(&self, handle: &str) -> Result<ResolvedPrincipal> {
        let recipient = Recipient::ChannelUsername(format!("@{handle}"));
        let chat = self
            .call("getChat", || self.bot.get_chat(recipient.clone()))
            .await?;

        Ok(ResolvedPrincipal {
            id: PrincipalId(chat.id.0),
            handle: handle.to_string(),
        })
    }
}
