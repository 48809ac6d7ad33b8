//! HTTP server for helpdeskd

use crate::assistant::AssistantService;
use crate::auth::{CredentialVerifier, SessionStore};
use crate::policy::PolicyStore;
use crate::routes;
use crate::tickets::TicketService;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub tickets: Arc<TicketService>,
    pub policies: Arc<PolicyStore>,
    pub assistant: Arc<AssistantService>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub sessions: Arc<SessionStore>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        tickets: Arc<TicketService>,
        policies: Arc<PolicyStore>,
        assistant: Arc<AssistantService>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            tickets,
            policies,
            assistant,
            verifier,
            sessions: Arc::new(SessionStore::new()),
            start_time: Instant::now(),
        }
    }
}

/// Build the full route tree. Split out of `run` so tests can drive the
/// router without binding a socket.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::ticket_routes())
        .merge(routes::message_routes())
        .merge(routes::assistant_routes())
        .merge(routes::stats_routes())
        .merge(routes::health_routes())
        .merge(routes::admin_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Browser admin console may be served from another port
        .layer(CorsLayer::permissive())
}

/// Run the HTTP server
pub async fn run(state: AppState, bind_addr: &str) -> Result<()> {
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("  Listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
