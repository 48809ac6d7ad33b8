//! Ticket service: lifecycle enforcement and audit trail.
//!
//! Every mutation goes through here; the web layer never writes ticket
//! fields directly. Status changes are validated against the state
//! machine on `TicketStatus`, and every state-changing call appends an
//! audit message, including rejected attempts.

use crate::store::{SearchFilter, TicketStore};
use helpdesk_common::{
    HelpdeskError, MessageAuthor, Ticket, TicketMessage, TicketPriority, TicketStats, TicketStatus,
    UpdateTicketRequest,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

type Result<T> = std::result::Result<T, HelpdeskError>;

pub struct TicketService {
    store: Arc<TicketStore>,
}

impl TicketService {
    pub fn new(store: Arc<TicketStore>) -> Self {
        Self { store }
    }

    /// Create a ticket. Requester and description must be non-empty;
    /// both are trimmed. The new ticket always starts in New.
    pub fn create(
        &self,
        requester_name: &str,
        description: &str,
        priority: TicketPriority,
    ) -> Result<Ticket> {
        let requester_name = requester_name.trim();
        let description = description.trim();

        if requester_name.is_empty() {
            return Err(HelpdeskError::Validation(
                "requester_name must not be empty".into(),
            ));
        }
        if description.is_empty() {
            return Err(HelpdeskError::Validation(
                "description must not be empty".into(),
            ));
        }

        let ticket = self
            .store
            .create_ticket(requester_name, description, priority)
            .map_err(db_err)?;

        self.audit(
            ticket.id,
            requester_name,
            &format!("Ticket created (priority {})", priority),
        )?;

        info!("Created ticket #{} for {}", ticket.id, requester_name);
        Ok(ticket)
    }

    /// Move a ticket along a forward edge of the workflow. Anything
    /// that is not New -> In Progress -> Resolved -> Closed is rejected
    /// with an audit entry recording the refused attempt.
    pub fn advance_status(
        &self,
        id: i64,
        new_status: TicketStatus,
        actor: &str,
    ) -> Result<Ticket> {
        let ticket = self.get(id)?;

        if !ticket.status.can_advance_to(new_status) {
            self.audit(
                id,
                actor,
                &format!(
                    "Rejected status change {} -> {}",
                    ticket.status, new_status
                ),
            )?;
            return Err(HelpdeskError::InvalidTransition {
                from: ticket.status,
                to: new_status,
            });
        }

        self.store.set_status(id, new_status).map_err(db_err)?;
        self.audit(
            id,
            actor,
            &format!("Status changed {} -> {}", ticket.status, new_status),
        )?;

        info!(
            "Ticket #{}: {} -> {} by {}",
            id, ticket.status, new_status, actor
        );
        self.get(id)
    }

    /// Administrative override: bring a Resolved or Closed ticket back
    /// into the working states. Separate from `advance_status` so a
    /// plain status write can never jump backward.
    pub fn reopen(&self, id: i64, new_status: TicketStatus, actor: &str) -> Result<Ticket> {
        let ticket = self.get(id)?;

        if !ticket.status.can_reopen_to(new_status) {
            self.audit(
                id,
                actor,
                &format!("Rejected reopen {} -> {}", ticket.status, new_status),
            )?;
            return Err(HelpdeskError::InvalidTransition {
                from: ticket.status,
                to: new_status,
            });
        }

        self.store.set_status(id, new_status).map_err(db_err)?;
        self.audit(
            id,
            actor,
            &format!("Ticket reopened {} -> {}", ticket.status, new_status),
        )?;

        info!(
            "Ticket #{} reopened to {} by {}",
            id, new_status, actor
        );
        self.get(id)
    }

    /// Assign the ticket to an agent. Legal in every status.
    pub fn assign(&self, id: i64, assignee: &str, actor: &str) -> Result<Ticket> {
        let assignee = assignee.trim();
        if assignee.is_empty() {
            return Err(HelpdeskError::Validation("assignee must not be empty".into()));
        }

        self.get(id)?;
        self.store.set_assignee(id, assignee).map_err(db_err)?;
        self.audit(id, actor, &format!("Assigned to {}", assignee))?;
        self.get(id)
    }

    /// Attach or replace resolution notes. Legal in every status.
    pub fn add_resolution_notes(&self, id: i64, notes: &str, actor: &str) -> Result<Ticket> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(HelpdeskError::Validation(
                "resolution_notes must not be empty".into(),
            ));
        }

        self.get(id)?;
        self.store.set_resolution_notes(id, notes).map_err(db_err)?;
        self.audit(id, actor, "Resolution notes updated")?;
        self.get(id)
    }

    /// Apply a `PUT /api/tickets/{id}` body: status first (so an illegal
    /// transition rejects before any field changes), then assignee, then
    /// resolution notes.
    pub fn apply_update(&self, id: i64, req: &UpdateTicketRequest, actor: &str) -> Result<Ticket> {
        if req.is_empty() {
            return Err(HelpdeskError::Validation("no update fields provided".into()));
        }

        if let Some(ref status_str) = req.status {
            let new_status = TicketStatus::from_str(status_str).map_err(|_| {
                HelpdeskError::Validation(format!("unknown status '{}'", status_str))
            })?;
            self.advance_status(id, new_status, actor)?;
        }

        if let Some(ref assignee) = req.assignee {
            self.assign(id, assignee, actor)?;
        }

        if let Some(ref notes) = req.resolution_notes {
            self.add_resolution_notes(id, notes, actor)?;
        }

        self.get(id)
    }

    pub fn get(&self, id: i64) -> Result<Ticket> {
        self.store
            .get_ticket(id)
            .map_err(db_err)?
            .ok_or_else(|| HelpdeskError::NotFound(format!("ticket {}", id)))
    }

    pub fn get_with_messages(&self, id: i64) -> Result<(Ticket, Vec<TicketMessage>)> {
        let ticket = self.get(id)?;
        let messages = self.store.messages_for(id).map_err(db_err)?;
        Ok((ticket, messages))
    }

    /// Append a chat message to an existing ticket.
    pub fn add_message(
        &self,
        id: i64,
        author: MessageAuthor,
        author_name: &str,
        body: &str,
    ) -> Result<TicketMessage> {
        if body.trim().is_empty() {
            return Err(HelpdeskError::Validation("message body must not be empty".into()));
        }

        self.get(id)?;
        self.store
            .add_message(id, author, author_name, body.trim())
            .map_err(db_err)
    }

    pub fn search(&self, filter: &SearchFilter) -> Result<Vec<Ticket>> {
        self.store.search(filter).map_err(db_err)
    }

    /// Search, filling the unread-messages indicator for `viewer`.
    pub fn search_with_viewer(&self, filter: &SearchFilter, viewer: &str) -> Result<Vec<Ticket>> {
        let mut tickets = self.search(filter)?;
        for ticket in &mut tickets {
            let unread = self
                .store
                .has_new_messages(ticket.id, viewer)
                .map_err(db_err)?;
            ticket.has_new_messages = Some(unread);
        }
        Ok(tickets)
    }

    pub fn mark_viewed(&self, id: i64, viewer: &str) -> Result<()> {
        self.get(id)?;
        self.store.mark_viewed(id, viewer).map_err(db_err)
    }

    /// Aggregate counts over the current store contents, computed on
    /// demand. Every status and priority appears, zero or not.
    pub fn stats(&self) -> Result<TicketStats> {
        let mut by_status: std::collections::HashMap<String, i64> = TicketStatus::all()
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for (status, count) in self.store.count_by_status().map_err(db_err)? {
            by_status.insert(status, count);
        }

        let mut by_priority: std::collections::HashMap<String, i64> = TicketPriority::all()
            .iter()
            .map(|p| (p.as_str().to_string(), 0))
            .collect();
        for (priority, count) in self.store.count_by_priority().map_err(db_err)? {
            by_priority.insert(priority, count);
        }

        let open = by_status.get(TicketStatus::New.as_str()).copied().unwrap_or(0)
            + by_status
                .get(TicketStatus::InProgress.as_str())
                .copied()
                .unwrap_or(0);

        Ok(TicketStats {
            total: self.store.count_total().map_err(db_err)?,
            open,
            by_status,
            by_priority,
        })
    }

    /// Audit entries are system messages carrying the acting party's
    /// name.
    fn audit(&self, ticket_id: i64, actor: &str, what: &str) -> Result<()> {
        self.store
            .add_message(ticket_id, MessageAuthor::System, actor, what)
            .map_err(db_err)?;
        Ok(())
    }
}

fn db_err(e: anyhow::Error) -> HelpdeskError {
    HelpdeskError::Internal(format!("database: {}", e))
}
