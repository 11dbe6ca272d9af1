//! Route handlers.
//!
//! Each handler:
//! - checks authorization where the route is privileged
//! - calls the transport / AI ports
//! - replies in the invoking chat
//! - returns an explicit outcome for the dispatcher to log and audit

pub mod co_owners;
pub mod conversation;
pub mod moderation;
pub mod relay;

use tracing::warn;

use crate::{domain::ChatId, messaging::port::TransportPort};

/// Send a reply; a failed reply is logged and otherwise ignored.
pub(crate) async fn reply(transport: &dyn TransportPort, chat_id: ChatId, text: &str) {
    if let Err(e) = transport.send_text(chat_id, text).await {
        warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
    }
}
