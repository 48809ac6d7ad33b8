//! Ticket types and the lifecycle state machine.
//!
//! A ticket moves along the forward edges New -> In Progress -> Resolved
//! -> Closed. Reopening a Resolved or Closed ticket is a separate,
//! explicit operation, never a side effect of a status write. All
//! transition legality lives here so that every caller shares one truth
//! table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ticket priority, defaulting to Medium when the requester gives none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }

    /// Parse a priority label, falling back to Medium for anything
    /// unrecognized. Requesters type these by hand; a typo should not
    /// reject the ticket.
    pub fn parse_or_default(s: &str) -> Self {
        Self::from_str(s).unwrap_or_default()
    }

    pub fn all() -> [TicketPriority; 4] {
        [Self::Low, Self::Medium, Self::High, Self::Urgent]
    }
}

impl FromStr for TicketPriority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ticket status in the helpdesk workflow.
///
/// Serialized with the human-facing labels ("In Progress") because the
/// API and the database both store them that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TicketStatus {
    /// Ticket created, nobody working on it yet
    #[default]
    New,
    /// An agent has picked it up
    #[serde(rename = "In Progress")]
    InProgress,
    /// Fix delivered, awaiting confirmation
    Resolved,
    /// Confirmed done, archived
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }

    pub fn all() -> [TicketStatus; 4] {
        [Self::New, Self::InProgress, Self::Resolved, Self::Closed]
    }

    /// Whether `next` is a legal forward edge from this status.
    ///
    /// The workflow is strictly linear: no skips, no self-transitions,
    /// no going backward. Backward movement is `can_reopen_to`.
    pub fn can_advance_to(&self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::InProgress)
                | (Self::InProgress, Self::Resolved)
                | (Self::Resolved, Self::Closed)
        )
    }

    /// Whether `next` is a legal reopen target from this status.
    ///
    /// Only finished tickets (Resolved or Closed) can be reopened, and
    /// only back to the working states (New or In Progress).
    pub fn can_reopen_to(&self, next: TicketStatus) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
            && matches!(next, Self::New | Self::InProgress)
    }

    /// Open tickets are the ones still needing attention.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::New | Self::InProgress)
    }
}

impl FromStr for TicketStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', " ").as_str() {
            "new" => Ok(Self::New),
            "in progress" | "inprogress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who wrote a ticket message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAuthor {
    /// The requester or another end user
    User,
    /// A helpdesk agent or administrator
    Admin,
    /// The AI assistant
    Assistant,
    /// Automatic audit entries
    System,
}

impl MessageAuthor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    /// Parse a stored author tag. Unknown tags map to User so an old
    /// database row never fails a read.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" => Self::Admin,
            "assistant" => Self::Assistant,
            "system" => Self::System,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for MessageAuthor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A helpdesk ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Row id, assigned by the store, never reused
    pub id: i64,
    pub requester_name: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    /// Agent working the ticket, set by admin action
    pub assignee: Option<String>,
    /// Set when the ticket moves to Resolved or Closed
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation; always >= created_at
    pub updated_at: DateTime<Utc>,
    /// Present on list responses when the caller identified itself as a
    /// viewer to get the unread-messages indicator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_new_messages: Option<bool>,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

/// A chat or audit entry attached to a ticket. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: i64,
    pub author: MessageAuthor,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
