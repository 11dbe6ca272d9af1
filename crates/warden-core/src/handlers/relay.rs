use std::sync::Arc;

use tracing::warn;

use crate::{
    domain::PrincipalId, errors::Error, messaging::port::TransportPort,
    messaging::types::IncomingUpdate, principals::PrincipalStore,
};

#[derive(Debug, Default)]
pub struct RelayReport {
    pub delivered: Vec<PrincipalId>,
    pub failed: Vec<(PrincipalId, Error)>,
}

/// Copies every inbound message to the supervisory set (owner + co-owners).
pub struct ForwardingRelay {
    store: Arc<PrincipalStore>,
    transport: Arc<dyn TransportPort>,
}

impl ForwardingRelay {
    pub fn new(store: Arc<PrincipalStore>, transport: Arc<dyn TransportPort>) -> Self {
        Self { store, transport }
    }

    /// Delivers one copy per supervisor; a failed delivery does not stop the rest.
    pub async fn forward(&self, update: &IncomingUpdate) -> RelayReport {
        let summary = summarize(update);
        let mut report = RelayReport::default();

        for recipient in self.store.supervisors().await {
            match self
                .transport
                .send_text(recipient.private_chat(), &summary)
                .await
            {
                Ok(_) => report.delivered.push(recipient),
                Err(e) => {
                    warn!(recipient = recipient.0, error = %e, "forwarding failed");
                    report.failed.push((recipient, e));
                }
            }
        }

        report
    }
}

pub fn summarize(update: &IncomingUpdate) -> String {
    let name = update
        .sender
        .as_ref()
        .map(|s| s.first_name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown");
    let title = update.chat.title.as_deref().unwrap_or("Private");
    let body = update.text.as_deref().unwrap_or("[Non-text]");

    format!(
        "📨 Message from {name} ({}) [{title}]:\n{body}",
        update.chat.kind.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::types::ChatKind;
    use crate::test_support::{update, MemoryRepository, RecordingTransport};

    async fn relay(co_owners: &[i64], transport: Arc<RecordingTransport>) -> ForwardingRelay {
        let repo = Arc::new(MemoryRepository::with_ids(
            co_owners.iter().copied().map(PrincipalId).collect(),
        ));
        let store = PrincipalStore::open(PrincipalId(100), repo).await.unwrap();
        ForwardingRelay::new(Arc::new(store), transport)
    }

    #[test]
    fn summary_for_group_text() {
        let u = update(ChatKind::Supergroup, 7, Some("hey there"));
        assert_eq!(
            summarize(&u),
            "📨 Message from User7 (supergroup) [Test Group]:\nhey there"
        );
    }

    #[test]
    fn summary_placeholders() {
        let mut u = update(ChatKind::Private, 7, None);
        u.sender = None;
        assert_eq!(
            summarize(&u),
            "📨 Message from Unknown (private) [Private]:\n[Non-text]"
        );
    }

    #[tokio::test]
    async fn forwards_to_owner_and_every_co_owner() {
        let transport = Arc::new(RecordingTransport::default());
        let r = relay(&[200, 201], transport.clone()).await;
        let u = update(ChatKind::Group, 7, Some("hi"));

        let report = r.forward(&u).await;
        assert_eq!(
            report.delivered,
            vec![PrincipalId(100), PrincipalId(200), PrincipalId(201)]
        );
        assert!(report.failed.is_empty());
        for id in [100, 200, 201] {
            assert_eq!(transport.sent_to(id).len(), 1, "recipient {id}");
        }
    }

    #[tokio::test]
    async fn one_failed_recipient_does_not_block_others() {
        let transport = Arc::new(RecordingTransport::default().unreachable(200));
        let r = relay(&[200, 201], transport.clone()).await;
        let u = update(ChatKind::Group, 7, Some("hello"));

        let report = r.forward(&u).await;
        assert_eq!(report.delivered, vec![PrincipalId(100), PrincipalId(201)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, PrincipalId(200));
        assert_eq!(transport.sent_to(201).len(), 1);
    }
}
