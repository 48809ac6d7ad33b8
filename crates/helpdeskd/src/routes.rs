//! API routes for helpdeskd

use crate::server::AppState;
use crate::store::SearchFilter;
use helpdesk_common::{
    AskRequest, AskResponse, CreateTicketRequest, ErrorResponse, HealthResponse, HelpdeskError,
    LoginRequest, LoginResponse, MessageAuthor, MessageListResponse, NewMessageRequest,
    ReopenRequest, StatsResponse, TicketDetailResponse, TicketEnvelope, TicketListResponse,
    TicketMessage, TicketPriority, TicketQuery, TicketStatus, UpdateTicketRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

type AppStateArc = Arc<AppState>;

/// Error shape every failing handler returns.
type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: HelpdeskError) -> ApiError {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(err.to_string())))
}

/// Actor recorded on audit entries for unauthenticated admin-console
/// calls.
const CONSOLE_ACTOR: &str = "admin";

// ============================================================================
// Ticket Routes
// ============================================================================

pub fn ticket_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/tickets", post(create_ticket).get(list_tickets))
        .route("/api/tickets/:id", get(get_ticket).put(update_ticket))
        .route("/api/tickets/:id/reopen", post(reopen_ticket))
}

async fn create_ticket(
    State(state): State<AppStateArc>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketEnvelope>), ApiError> {
    let priority = req
        .priority
        .as_deref()
        .map(TicketPriority::parse_or_default)
        .unwrap_or_default();

    let ticket = state
        .tickets
        .create(&req.requester_name, &req.description, priority)
        .map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(TicketEnvelope {
            success: true,
            ticket,
        }),
    ))
}

async fn list_tickets(
    State(state): State<AppStateArc>,
    Query(query): Query<TicketQuery>,
) -> Result<Json<TicketListResponse>, ApiError> {
    let filter = build_filter(&query)?;

    let tickets = match query.viewer.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(viewer) => state.tickets.search_with_viewer(&filter, viewer),
        None => state.tickets.search(&filter),
    }
    .map_err(api_error)?;

    Ok(Json(TicketListResponse {
        success: true,
        count: tickets.len(),
        tickets,
    }))
}

/// Unknown filter labels are a 400, not an empty result, so a typo in
/// a dashboard query fails loudly.
fn build_filter(query: &TicketQuery) -> Result<SearchFilter, ApiError> {
    let mut filter = SearchFilter::default();

    if let Some(ref s) = query.status {
        filter.status = Some(TicketStatus::from_str(s).map_err(|_| {
            api_error(HelpdeskError::Validation(format!("unknown status '{}'", s)))
        })?);
    }
    if let Some(ref p) = query.priority {
        filter.priority = Some(TicketPriority::from_str(p).map_err(|_| {
            api_error(HelpdeskError::Validation(format!("unknown priority '{}'", p)))
        })?);
    }
    filter.assignee = query.assignee.clone();
    filter.text = query.search.clone();
    Ok(filter)
}

async fn get_ticket(
    State(state): State<AppStateArc>,
    Path(id): Path<i64>,
) -> Result<Json<TicketDetailResponse>, ApiError> {
    let (ticket, messages) = state.tickets.get_with_messages(id).map_err(api_error)?;

    Ok(Json(TicketDetailResponse {
        success: true,
        ticket,
        messages,
    }))
}

async fn update_ticket(
    State(state): State<AppStateArc>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<TicketEnvelope>, ApiError> {
    let ticket = state
        .tickets
        .apply_update(id, &req, CONSOLE_ACTOR)
        .map_err(api_error)?;

    Ok(Json(TicketEnvelope {
        success: true,
        ticket,
    }))
}

async fn reopen_ticket(
    State(state): State<AppStateArc>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Option<Json<ReopenRequest>>,
) -> Result<Json<TicketEnvelope>, ApiError> {
    let admin = require_admin(&state, &headers)?;

    // Missing body means the default reopen target
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let target = match req.status.as_deref() {
        Some(s) => TicketStatus::from_str(s).map_err(|_| {
            api_error(HelpdeskError::Validation(format!("unknown status '{}'", s)))
        })?,
        None => TicketStatus::InProgress,
    };

    info!("Reopen ticket #{} to {} by {}", id, target, admin);
    let ticket = state
        .tickets
        .reopen(id, target, &admin)
        .map_err(api_error)?;

    Ok(Json(TicketEnvelope {
        success: true,
        ticket,
    }))
}

/// Resolve the bearer token to the admin username, or 401.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| api_error(HelpdeskError::Unauthorized))?;

    state
        .sessions
        .validate(token)
        .ok_or_else(|| api_error(HelpdeskError::Unauthorized))
}

// ============================================================================
// Message Routes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: TicketMessage,
}

/// Query string for `GET /api/tickets/{id}/messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesQuery {
    /// When present, the listing also marks the ticket viewed for this
    /// name
    #[serde(default)]
    pub viewer: Option<String>,
}

pub fn message_routes() -> Router<AppStateArc> {
    Router::new().route(
        "/api/tickets/:id/messages",
        get(list_messages).post(post_message),
    )
}

async fn list_messages(
    State(state): State<AppStateArc>,
    Path(id): Path<i64>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let (_, messages) = state.tickets.get_with_messages(id).map_err(api_error)?;

    if let Some(viewer) = query.viewer.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        state.tickets.mark_viewed(id, viewer).map_err(api_error)?;
    }

    Ok(Json(MessageListResponse {
        success: true,
        messages,
    }))
}

async fn post_message(
    State(state): State<AppStateArc>,
    Path(id): Path<i64>,
    Json(req): Json<NewMessageRequest>,
) -> Result<(StatusCode, Json<MessageEnvelope>), ApiError> {
    let author = req
        .author
        .as_deref()
        .map(MessageAuthor::parse_lossy)
        .unwrap_or(MessageAuthor::User);

    let message = state
        .tickets
        .add_message(id, author, &req.author_name, &req.body)
        .map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageEnvelope {
            success: true,
            message,
        }),
    ))
}

// ============================================================================
// Assistant Routes
// ============================================================================

pub fn assistant_routes() -> Router<AppStateArc> {
    Router::new().route("/api/agent/ask", post(ask_agent))
}

async fn ask_agent(
    State(state): State<AppStateArc>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let outcome = state
        .assistant
        .ask(
            &req.question,
            req.requester.as_deref(),
            req.ticket_id,
            req.create_ticket_if_suggested,
        )
        .await
        .map_err(api_error)?;

    Ok(Json(AskResponse {
        success: true,
        answer_text: outcome.answer.answer_text,
        citations: outcome.answer.cited_policies,
        requires_approval: outcome.answer.requires_approval,
        suggested_ticket: outcome.answer.suggested_ticket,
        ticket_id: outcome.ticket_id,
    }))
}

// ============================================================================
// Stats Routes
// ============================================================================

pub fn stats_routes() -> Router<AppStateArc> {
    Router::new().route("/api/stats", get(get_stats))
}

async fn get_stats(State(state): State<AppStateArc>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.tickets.stats().map_err(api_error)?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/api/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        policies_loaded: state.policies.count(),
    })
}

// ============================================================================
// Admin Routes
// ============================================================================

pub fn admin_routes() -> Router<AppStateArc> {
    Router::new().route("/api/admin/login", post(admin_login))
}

async fn admin_login(
    State(state): State<AppStateArc>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Cheap place to drop stale sessions
    state.sessions.prune_expired();

    let user = state
        .verifier
        .verify(&req.username, &req.password)
        .ok_or_else(|| api_error(HelpdeskError::Unauthorized))?;

    let token = state.sessions.issue(&user.username);
    info!("Admin login: {}", user.username);

    Ok(Json(LoginResponse {
        success: true,
        token,
        username: user.username,
    }))
}
