//! Telegram update handlers.
//!
//! Every message is converted to the core `IncomingUpdate` and handed to the
//! dispatcher; routing, authorization and replies all happen in `warden-core`.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{Chat, Message, User},
};
use tracing::debug;

use warden_core::{
    dispatch::RouteOutcome,
    domain::{ChatId, MessageId, MessageRef, PrincipalId},
    messaging::types::{ChatInfo, ChatKind, IncomingUpdate, RepliedMessage, Sender},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let update = incoming_update(&msg);
    let chat_id = update.chat.id.0;

    let report = state.dispatcher.handle(update).await;
    debug!(
        chat_id,
        forwarded = report.relay.delivered.len(),
        outcome = outcome_label(&report.outcome),
        "update handled"
    );

    Ok(())
}

fn incoming_update(msg: &Message) -> IncomingUpdate {
    IncomingUpdate {
        chat: chat_info(&msg.chat),
        message_id: MessageId(msg.id.0),
        sender: msg.from().map(sender),
        text: msg.text().map(|t| t.to_string()),
        reply_to: msg.reply_to_message().map(|r| RepliedMessage {
            message: MessageRef {
                chat_id: ChatId(r.chat.id.0),
                message_id: MessageId(r.id.0),
            },
            author: r.from().map(sender),
        }),
    }
}

fn chat_info(chat: &Chat) -> ChatInfo {
    let kind = if chat.is_private() {
        ChatKind::Private
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_group() {
        ChatKind::Group
    } else {
        ChatKind::Channel
    };

    ChatInfo {
        id: ChatId(chat.id.0),
        kind,
        title: chat.title().map(|t| t.to_string()),
    }
}

fn sender(user: &User) -> Sender {
    Sender {
        id: PrincipalId(user.id.0 as i64),
        first_name: user.first_name.clone(),
        username: user.username.clone(),
    }
}

fn outcome_label(outcome: &RouteOutcome) -> &'static str {
    match outcome {
        RouteOutcome::Moderation(_) => "moderation",
        RouteOutcome::CoOwner(_) => "co_owner_edit",
        RouteOutcome::Started => "start",
        RouteOutcome::Greeted => "greeting",
        RouteOutcome::Conversation(_) => "ai_conversation",
        RouteOutcome::Forwarded => "plain_forward",
    }
}
