//! Ticket Lifecycle Correctness Tests
//!
//! Exercises the complete ticket workflow end to end:
//!
//! 1. New -> In Progress -> Resolved -> Closed, one edge at a time
//! 2. Every skipped or backward edge is rejected with an audit entry
//! 3. Reopen works only through the explicit operation, only from
//!    Resolved or Closed
//! 4. Search filters return exactly the matching set
//!
//! ## Running
//!
//! ```bash
//! cargo test -p helpdeskd lifecycle_correctness -- --nocapture
//! ```

use helpdesk_common::{HelpdeskError, MessageAuthor, TicketPriority, TicketStatus};
use helpdeskd::store::{SearchFilter, TicketStore};
use helpdeskd::tickets::TicketService;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn service() -> (TicketService, TempDir) {
    let temp = TempDir::new().unwrap();
    let store = TicketStore::open(&temp.path().join("lifecycle.db")).unwrap();
    (TicketService::new(Arc::new(store)), temp)
}

fn audit_bodies(svc: &TicketService, id: i64) -> Vec<String> {
    let (_, messages) = svc.get_with_messages(id).unwrap();
    messages
        .into_iter()
        .filter(|m| m.author == MessageAuthor::System)
        .map(|m| m.body)
        .collect()
}

// ============================================================================
// Test: Full Forward Workflow
// ============================================================================

#[test]
fn test_full_workflow_forward_edges() {
    let (svc, _temp) = service();
    let ticket = svc
        .create("alice", "VPN drops every hour", TicketPriority::High)
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::New, "Tickets must start in New");

    let ticket = svc
        .advance_status(ticket.id, TicketStatus::InProgress, "bob")
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::InProgress);

    let ticket = svc
        .advance_status(ticket.id, TicketStatus::Resolved, "bob")
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Resolved);

    let ticket = svc
        .advance_status(ticket.id, TicketStatus::Closed, "bob")
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Closed);

    // Creation plus three transitions, every one audited
    let audit = audit_bodies(&svc, ticket.id);
    assert_eq!(audit.len(), 4, "Expected 4 audit entries, got {:?}", audit);
    assert!(audit[1].contains("New -> In Progress"));
    assert!(audit[2].contains("In Progress -> Resolved"));
    assert!(audit[3].contains("Resolved -> Closed"));
}

// ============================================================================
// Test: Illegal Edges Are Rejected And Audited
// ============================================================================

#[test]
fn test_every_illegal_advance_is_rejected() {
    let (svc, _temp) = service();

    // From New: only In Progress is legal
    for target in [TicketStatus::New, TicketStatus::Resolved, TicketStatus::Closed] {
        let t = svc.create("x", "case", TicketPriority::Medium).unwrap();
        let err = svc.advance_status(t.id, target, "admin").unwrap_err();
        assert!(
            matches!(err, HelpdeskError::InvalidTransition { .. }),
            "New -> {} must be rejected",
            target
        );
        assert_eq!(svc.get(t.id).unwrap().status, TicketStatus::New);
    }

    // From Closed: nothing is legal via advance
    let t = svc.create("x", "case", TicketPriority::Medium).unwrap();
    svc.advance_status(t.id, TicketStatus::InProgress, "admin").unwrap();
    svc.advance_status(t.id, TicketStatus::Resolved, "admin").unwrap();
    svc.advance_status(t.id, TicketStatus::Closed, "admin").unwrap();
    for target in TicketStatus::all() {
        let err = svc.advance_status(t.id, target, "admin").unwrap_err();
        assert!(
            matches!(err, HelpdeskError::InvalidTransition { .. }),
            "Closed -> {} must be rejected",
            target
        );
    }
}

#[test]
fn test_rejected_attempt_leaves_audit_trail() {
    let (svc, _temp) = service();
    let t = svc.create("alice", "printer jam", TicketPriority::Low).unwrap();

    let _ = svc.advance_status(t.id, TicketStatus::Closed, "eve");

    let audit = audit_bodies(&svc, t.id);
    let rejected: Vec<&String> = audit.iter().filter(|b| b.contains("Rejected")).collect();
    assert_eq!(rejected.len(), 1, "The refused attempt must be recorded");
    assert!(rejected[0].contains("New -> Closed"));
}

// ============================================================================
// Test: Reopen Semantics
// ============================================================================

#[test]
fn test_reopen_only_from_terminal_states() {
    let (svc, _temp) = service();
    let t = svc.create("alice", "flaky wifi", TicketPriority::Medium).unwrap();

    // Open tickets cannot be "reopened"
    for target in [TicketStatus::New, TicketStatus::InProgress] {
        let err = svc.reopen(t.id, target, "admin").unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
    }

    svc.advance_status(t.id, TicketStatus::InProgress, "admin").unwrap();
    svc.advance_status(t.id, TicketStatus::Resolved, "admin").unwrap();

    // Resolved -> In Progress via reopen
    let t2 = svc.reopen(t.id, TicketStatus::InProgress, "admin").unwrap();
    assert_eq!(t2.status, TicketStatus::InProgress);

    // And a closed ticket can come back to New
    svc.advance_status(t.id, TicketStatus::Resolved, "admin").unwrap();
    svc.advance_status(t.id, TicketStatus::Closed, "admin").unwrap();
    let t3 = svc.reopen(t.id, TicketStatus::New, "admin").unwrap();
    assert_eq!(t3.status, TicketStatus::New);
}

#[test]
fn test_reopen_cannot_target_terminal_states() {
    let (svc, _temp) = service();
    let t = svc.create("alice", "case", TicketPriority::Medium).unwrap();
    svc.advance_status(t.id, TicketStatus::InProgress, "admin").unwrap();
    svc.advance_status(t.id, TicketStatus::Resolved, "admin").unwrap();

    for target in [TicketStatus::Resolved, TicketStatus::Closed] {
        let err = svc.reopen(t.id, target, "admin").unwrap_err();
        assert!(
            matches!(err, HelpdeskError::InvalidTransition { .. }),
            "Reopen target {} must be rejected",
            target
        );
    }
}

// ============================================================================
// Test: Search Filters
// ============================================================================

#[test]
fn test_search_returns_exact_status_set() {
    let (svc, _temp) = service();

    let a = svc.create("alice", "one", TicketPriority::Low).unwrap();
    let b = svc.create("bob", "two", TicketPriority::High).unwrap();
    let c = svc.create("carol", "three", TicketPriority::High).unwrap();

    // Close b; move c to In Progress
    svc.advance_status(b.id, TicketStatus::InProgress, "admin").unwrap();
    svc.advance_status(b.id, TicketStatus::Resolved, "admin").unwrap();
    svc.advance_status(b.id, TicketStatus::Closed, "admin").unwrap();
    svc.advance_status(c.id, TicketStatus::InProgress, "admin").unwrap();

    let closed = svc
        .search(&SearchFilter {
            status: Some(TicketStatus::Closed),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].id, b.id);

    let new_tickets = svc
        .search(&SearchFilter {
            status: Some(TicketStatus::New),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(new_tickets.len(), 1);
    assert_eq!(new_tickets[0].id, a.id);

    let high = svc
        .search(&SearchFilter {
            priority: Some(TicketPriority::High),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(high.len(), 2);
}

#[test]
fn test_search_combines_filters_conjunctively() {
    let (svc, _temp) = service();

    svc.create("alice", "laptop battery swelling", TicketPriority::Urgent).unwrap();
    let b = svc.create("alice", "laptop screen cracked", TicketPriority::Low).unwrap();
    svc.create("bob", "laptop bag missing", TicketPriority::Low).unwrap();

    let hits = svc
        .search(&SearchFilter {
            priority: Some(TicketPriority::Low),
            text: Some("screen".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, b.id);
}

// ============================================================================
// Test: Round-Trip Fidelity
// ============================================================================

#[test]
fn test_create_then_fetch_roundtrips_all_fields() {
    let (svc, _temp) = service();
    let created = svc
        .create("Dana Scully", "badge reader rejects my badge", TicketPriority::Urgent)
        .unwrap();

    let fetched = svc.get(created.id).unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.requester_name, "Dana Scully");
    assert_eq!(fetched.description, "badge reader rejects my badge");
    assert_eq!(fetched.priority, TicketPriority::Urgent);
    assert_eq!(fetched.status, TicketStatus::New);
    assert_eq!(fetched.created_at, created.created_at);
    assert!(fetched.assignee.is_none());
    assert!(fetched.resolution_notes.is_none());
}

#[test]
fn test_ids_are_fresh_across_creates() {
    let (svc, _temp) = service();
    let mut seen = std::collections::HashSet::new();
    for i in 0..5 {
        let t = svc
            .create("alice", &format!("case {}", i), TicketPriority::Medium)
            .unwrap();
        assert!(seen.insert(t.id), "Duplicate ticket id {}", t.id);
    }
}
