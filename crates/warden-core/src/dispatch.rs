//! Per-update pipeline: forward to supervisors, classify, run exactly one handler.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    handlers::{
        co_owners::{CoOwnerHandler, CoOwnerOutcome},
        conversation::{ConversationOutcome, ConversationalResponder},
        moderation::{ModerationHandler, ModerationOutcome},
        relay::{ForwardingRelay, RelayReport},
        reply,
    },
    messaging::{port::TransportPort, types::IncomingUpdate},
    ports::ConversationPort,
    principals::PrincipalStore,
    routing::{classify, Route},
    security::{Authority, PrivilegedAction},
    utils::{AuditEvent, AuditLogger},
};

pub const START_TEXT: &str = "Hi! I'm your AI assistant 🤖\nType /add @username to add co-owner.";

#[derive(Debug)]
pub enum RouteOutcome {
    Moderation(ModerationOutcome),
    CoOwner(CoOwnerOutcome),
    Started,
    Greeted,
    Conversation(ConversationOutcome),
    Forwarded,
}

/// Everything that happened while handling one update.
#[derive(Debug)]
pub struct DispatchReport {
    pub relay: RelayReport,
    pub outcome: RouteOutcome,
}

pub struct UpdateDispatcher {
    transport: Arc<dyn TransportPort>,
    relay: ForwardingRelay,
    moderation: ModerationHandler,
    co_owners: CoOwnerHandler,
    conversation: ConversationalResponder,
    audit: Arc<AuditLogger>,
}

impl UpdateDispatcher {
    pub fn new(
        store: Arc<PrincipalStore>,
        transport: Arc<dyn TransportPort>,
        ai: Arc<dyn ConversationPort>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        let authority = Authority::new(store.clone());
        Self {
            relay: ForwardingRelay::new(store, transport.clone()),
            moderation: ModerationHandler::new(authority.clone(), transport.clone()),
            co_owners: CoOwnerHandler::new(authority, transport.clone()),
            conversation: ConversationalResponder::new(ai, transport.clone()),
            transport,
            audit,
        }
    }

    pub async fn handle(&self, update: IncomingUpdate) -> DispatchReport {
        let relay = self.relay.forward(&update).await;
        if !relay.failed.is_empty() {
            warn!(
                delivered = relay.delivered.len(),
                failed = relay.failed.len(),
                "forwarding incomplete"
            );
        }

        let route = classify(&update);
        debug!(chat_id = update.chat.id.0, ?route, "classified update");

        let outcome = match route {
            Route::ModerationCommand { action, target } => {
                let out = self
                    .moderation
                    .handle(&update, action, target.as_ref())
                    .await;
                self.audit_moderation(&update, action.privilege(), &out);
                RouteOutcome::Moderation(out)
            }
            Route::CoOwnerEdit { edit, handle } => {
                let out = self
                    .co_owners
                    .handle(&update, edit, handle.as_deref())
                    .await;
                self.audit_co_owner(&update, edit.privilege(), &out);
                RouteOutcome::CoOwner(out)
            }
            Route::Start => {
                reply(self.transport.as_ref(), update.chat.id, START_TEXT).await;
                RouteOutcome::Started
            }
            Route::Greeting => {
                let name = update
                    .sender
                    .as_ref()
                    .map(|s| s.first_name.as_str())
                    .unwrap_or("there");
                let greeting = format!("Hi {name}! 👋 How can I assist you?");
                reply(self.transport.as_ref(), update.chat.id, &greeting).await;
                RouteOutcome::Greeted
            }
            Route::AiConversation { text } => {
                let out = self.conversation.respond(update.chat.id, &text).await;
                if let ConversationOutcome::Failed(e) = &out {
                    warn!(chat_id = update.chat.id.0, error = %e, "ai conversation failed");
                }
                RouteOutcome::Conversation(out)
            }
            Route::PlainForward => RouteOutcome::Forwarded,
        };

        DispatchReport { relay, outcome }
    }

    fn audit_moderation(
        &self,
        update: &IncomingUpdate,
        action: PrivilegedAction,
        out: &ModerationOutcome,
    ) {
        let base = |authorized| {
            AuditEvent::privileged(update.sender.as_ref(), update.chat.id, action, authorized)
        };
        let event = match out {
            ModerationOutcome::Applied { target, .. } => {
                info!(action = action.as_str(), target = %target, "moderation applied");
                base(true).target(target.as_str()).result("applied")
            }
            ModerationOutcome::Denied => {
                info!(action = action.as_str(), sender = ?update.sender_id(), "moderation denied");
                base(false).result("denied")
            }
            ModerationOutcome::MissingTarget => base(true).result("missing_target"),
            ModerationOutcome::Protected { target, .. } => {
                info!(action = action.as_str(), sender = ?update.sender_id(), "moderation of primary owner refused");
                base(false).target(target.as_str()).result("protected")
            }
            ModerationOutcome::Failed { target, error: e, .. } => {
                error!(action = action.as_str(), target = %target, error = %e, "moderation failed");
                base(true).target(target.as_str()).result("failed").error(e)
            }
        };
        self.write_audit(event);
    }

    fn audit_co_owner(&self, update: &IncomingUpdate, action: PrivilegedAction, out: &CoOwnerOutcome) {
        let base = |authorized| {
            AuditEvent::privileged(update.sender.as_ref(), update.chat.id, action, authorized)
        };
        let event = match out {
            CoOwnerOutcome::Applied {
                principal, handle, ..
            } => {
                info!(action = action.as_str(), principal = principal.0, handle = %handle, "co-owner list updated");
                base(true).target(format!("@{handle} ({principal})")).result("applied")
            }
            CoOwnerOutcome::Unchanged {
                principal, handle, ..
            } => base(true)
                .target(format!("@{handle} ({principal})"))
                .result("unchanged"),
            CoOwnerOutcome::Denied => {
                info!(action = action.as_str(), sender = ?update.sender_id(), "co-owner edit denied");
                base(false).result("denied")
            }
            CoOwnerOutcome::Usage => base(true).result("usage"),
            CoOwnerOutcome::NotFound { handle, .. } => {
                base(true).target(format!("@{handle}")).result("not_found")
            }
            CoOwnerOutcome::PersistFailed {
                principal, error: e, ..
            } => {
                error!(action = action.as_str(), principal = principal.0, error = %e, "co-owner list not saved");
                base(true)
                    .target(principal.to_string())
                    .result("persist_failed")
                    .error(e)
            }
        };
        self.write_audit(event);
    }

    fn write_audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.write(event) {
            warn!(path = %self.audit.path().display(), error = %e, "failed to write audit event");
        }
    }
}
