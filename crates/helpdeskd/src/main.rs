//! Helpdesk Daemon - ticket tracking and policy-grounded support assistant
//!
//! Serves the JSON API, owns the SQLite ticket store, and brokers
//! questions to the configured LLM provider.

use anyhow::Result;
use helpdeskd::assistant::AssistantService;
use helpdeskd::auth::{seed_admin_from_env, StoreVerifier};
use helpdeskd::config::Config;
use helpdeskd::llm;
use helpdeskd::policy::PolicyStore;
use helpdeskd::server::{self, AppState};
use helpdeskd::store::TicketStore;
use helpdeskd::tickets::TicketService;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Helpdesk Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load();

    // Provider problems (unknown name, missing API key) are fatal here,
    // before anything binds or opens.
    let provider = llm::build_provider(&config.llm)?;

    let store = Arc::new(TicketStore::open(Path::new(&config.server.database_path))?);
    info!("Ticket store: {}", config.server.database_path);

    if seed_admin_from_env(store.as_ref())? {
        info!("Admin account refreshed from environment");
    }

    let policies = Arc::new(PolicyStore::load(Path::new(&config.server.policy_dir)));
    let tickets = Arc::new(TicketService::new(store.clone()));
    let assistant = Arc::new(AssistantService::new(
        policies.clone(),
        provider,
        tickets.clone(),
    ));
    let verifier = Arc::new(StoreVerifier::new(store));

    let state = AppState::new(tickets, policies, assistant, verifier);

    info!("Helpdesk Daemon ready");
    server::run(state, &config.server.bind_addr).await
}
