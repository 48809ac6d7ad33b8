//! Request and response payloads for the HTTP JSON API.
//!
//! Shared between the daemon's routes and the CLI client so the two
//! sides cannot drift apart. Successful responses carry `success: true`
//! plus their payload; failures are always `{success: false, error}`.

use crate::ticket::{Ticket, TicketMessage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Ticket requests
// ============================================================================

/// Body for `POST /api/tickets`.
///
/// Priority arrives as free text; anything unrecognized is coerced to
/// Medium rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub requester_name: String,
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
}

/// Body for `PUT /api/tickets/{id}`; any subset of the fields.
///
/// Status is a string so that an unknown label becomes a validation
/// error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTicketRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub resolution_notes: Option<String>,
}

impl UpdateTicketRequest {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assignee.is_none() && self.resolution_notes.is_none()
    }
}

/// Body for `POST /api/tickets/{id}/reopen`. Omitting the status reopens
/// to In Progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReopenRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// Body for `POST /api/tickets/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessageRequest {
    /// "user", "admin" or "assistant"; unknown tags count as "user"
    #[serde(default)]
    pub author: Option<String>,
    pub author_name: String,
    pub body: String,
}

/// Query string for `GET /api/tickets`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    /// Name of the caller; when present, each ticket in the response
    /// carries its unread-messages indicator for this viewer
    #[serde(default)]
    pub viewer: Option<String>,
}

// ============================================================================
// Ticket responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEnvelope {
    pub success: bool,
    pub ticket: Ticket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketListResponse {
    pub success: bool,
    pub tickets: Vec<Ticket>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetailResponse {
    pub success: bool,
    pub ticket: Ticket,
    pub messages: Vec<TicketMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub success: bool,
    pub messages: Vec<TicketMessage>,
}

// ============================================================================
// Assistant
// ============================================================================

/// Body for `POST /api/agent/ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    /// Requester name used if the assistant files a ticket
    #[serde(default)]
    pub requester: Option<String>,
    /// Existing ticket to attach the question and answer to
    #[serde(default)]
    pub ticket_id: Option<i64>,
    /// Create a ticket when the assistant suggests one
    #[serde(default)]
    pub create_ticket_if_suggested: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub success: bool,
    pub answer_text: String,
    pub citations: Vec<String>,
    pub requires_approval: bool,
    pub suggested_ticket: bool,
    /// Set when the assistant filed a new ticket for this question
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<i64>,
}

// ============================================================================
// Stats / health / auth
// ============================================================================

/// Aggregate ticket counts, computed on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketStats {
    pub total: i64,
    /// New + In Progress
    pub open: i64,
    pub by_status: HashMap<String, i64>,
    pub by_priority: HashMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: TicketStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub policies_loaded: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub username: String,
}

// ============================================================================
// Errors
// ============================================================================

/// The error body every failing endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
