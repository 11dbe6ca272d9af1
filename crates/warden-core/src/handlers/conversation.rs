use std::sync::Arc;

use tracing::debug;

use crate::{
    domain::ChatId, errors::Error, messaging::port::TransportPort, ports::ConversationPort,
};

use super::reply;

pub const APOLOGY: &str = "Sorry, something went wrong.";

#[derive(Debug)]
pub enum ConversationOutcome {
    Answered,
    Failed(Error),
}

/// Relays private free text to the AI endpoint; one attempt, no retry.
pub struct ConversationalResponder {
    ai: Arc<dyn ConversationPort>,
    transport: Arc<dyn TransportPort>,
}

impl ConversationalResponder {
    pub fn new(ai: Arc<dyn ConversationPort>, transport: Arc<dyn TransportPort>) -> Self {
        Self { ai, transport }
    }

    pub async fn respond(&self, chat_id: ChatId, text: &str) -> ConversationOutcome {
        if let Err(e) = self.transport.send_typing(chat_id).await {
            debug!(chat_id = chat_id.0, error = %e, "typing indicator failed");
        }

        let result = match self.ai.reply(text).await {
            Ok(answer) if answer.trim().is_empty() => Err(Error::External(
                "ai endpoint returned an empty answer".to_string(),
            )),
            other => other,
        };

        match result {
            Ok(answer) => {
                reply(self.transport.as_ref(), chat_id, &answer).await;
                ConversationOutcome::Answered
            }
            Err(e) => {
                reply(self.transport.as_ref(), chat_id, APOLOGY).await;
                ConversationOutcome::Failed(e)
            }
        }
    }
}
