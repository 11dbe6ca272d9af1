use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use warden_core::{
    config::Config, dispatch::UpdateDispatcher, messaging::port::TransportPort,
    ports::ConversationPort, principals::PrincipalStore, utils::AuditLogger,
};

use crate::handlers;
use crate::TelegramTransport;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<UpdateDispatcher>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    store: Arc<PrincipalStore>,
    ai: Arc<dyn ConversationPort>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "bot started"),
        Err(e) => warn!(error = %e, "getMe failed; continuing"),
    }
    info!(
        owner = store.primary_owner().0,
        co_owners = store.co_owners().await.len(),
        file = %cfg.co_owners_file.display(),
        "principals loaded"
    );

    let transport: Arc<dyn TransportPort> =
        Arc::new(TelegramTransport::new(bot.clone(), cfg.transport_timeout));
    let audit = Arc::new(AuditLogger::new(
        cfg.audit_log_path.clone(),
        cfg.audit_log_json,
    ));

    let state = Arc::new(AppState {
        dispatcher: Arc::new(UpdateDispatcher::new(store, transport, ai, audit)),
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
