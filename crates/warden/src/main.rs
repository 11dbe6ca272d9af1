use std::sync::Arc;

use warden_ai::ChatEndpointClient;

use warden_core::{
    config::Config,
    principals::{JsonCoOwnerFile, PrincipalStore},
};

#[tokio::main]
async fn main() -> Result<(), warden_core::Error> {
    warden_core::logging::init("warden")?;

    let cfg = Arc::new(Config::load()?);

    let repo = Arc::new(JsonCoOwnerFile::new(cfg.co_owners_file.clone()));
    let store = Arc::new(PrincipalStore::open(cfg.owner_id, repo).await?);

    let ai = Arc::new(ChatEndpointClient::new(
        cfg.ai_endpoint.clone(),
        cfg.ai_model.clone(),
        cfg.ai_timeout,
    )?);

    warden_telegram::router::run_polling(cfg, store, ai)
        .await
        .map_err(|e| warden_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
