//! API Contract Tests
//!
//! Boots the daemon's router on an ephemeral localhost port and talks
//! to it over HTTP, checking the wire contract endpoint by endpoint:
//!
//! 1. Success envelopes carry `success: true` plus their payload
//! 2. Failures are always `{success: false, error}` with the right code
//! 3. The reopen override demands a bearer token
//! 4. The assistant endpoint works with retrieval and absorbs failures
//!
//! ## Running
//!
//! ```bash
//! cargo test -p helpdeskd api_contract -- --nocapture
//! ```

use helpdesk_common::{
    AskResponse, HealthResponse, LoginResponse, StatsResponse, TicketDetailResponse,
    TicketEnvelope, TicketListResponse,
};
use helpdeskd::assistant::AssistantService;
use helpdeskd::auth::{hash_password, StoreVerifier};
use helpdeskd::llm::FakeProvider;
use helpdeskd::policy::PolicyStore;
use helpdeskd::server::{build_router, AppState};
use helpdeskd::store::{TicketStore, UserRecord};
use helpdeskd::tickets::TicketService;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

// ============================================================================
// Server Fixture
// ============================================================================

struct TestServer {
    base: String,
    client: reqwest::Client,
    _shutdown: tokio::sync::oneshot::Sender<()>,
    _temp: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

async fn spawn_server(provider: FakeProvider) -> TestServer {
    let temp = TempDir::new().unwrap();

    let policy_dir = temp.path().join("policies");
    fs::create_dir(&policy_dir).unwrap();
    fs::write(
        policy_dir.join("password_reset.txt"),
        "Password Reset Policy\n\nUse the self-service portal to reset a forgotten password.",
    )
    .unwrap();

    let store = Arc::new(TicketStore::open(&temp.path().join("api.db")).unwrap());
    store
        .upsert_user(&UserRecord {
            username: "admin".into(),
            password_sha256: hash_password("letmein"),
            display_name: "Admin".into(),
            role: "admin".into(),
        })
        .unwrap();

    let policies = Arc::new(PolicyStore::load(&policy_dir));
    let tickets = Arc::new(TicketService::new(store.clone()));
    let assistant = Arc::new(AssistantService::new(
        policies.clone(),
        Arc::new(provider),
        tickets.clone(),
    ));
    let verifier = Arc::new(StoreVerifier::new(store));

    let state = AppState::new(tickets, policies, assistant, verifier);
    let app = build_router(Arc::new(state));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let base = format!("http://{}", addr);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        base,
        client: reqwest::Client::new(),
        _shutdown: tx,
        _temp: temp,
    }
}

fn ok_provider() -> FakeProvider {
    FakeProvider::with_reply("Use the portal.\nAPPROVAL_REQUIRED: no\nFILE_TICKET: no")
}

async fn create_ticket(server: &TestServer, requester: &str, description: &str) -> TicketEnvelope {
    let resp = server
        .client
        .post(server.url("/api/tickets"))
        .json(&json!({"requester_name": requester, "description": description}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    resp.json().await.unwrap()
}

// ============================================================================
// Test: Ticket CRUD Contract
// ============================================================================

#[tokio::test]
async fn test_create_and_fetch_ticket() {
    let server = spawn_server(ok_provider()).await;

    let created = create_ticket(&server, "alice", "screen flickers").await;
    assert!(created.success);
    assert_eq!(created.ticket.requester_name, "alice");
    assert_eq!(created.ticket.status.to_string(), "New");
    assert_eq!(created.ticket.priority.to_string(), "Medium");

    let resp = server
        .client
        .get(server.url(&format!("/api/tickets/{}", created.ticket.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let detail: TicketDetailResponse = resp.json().await.unwrap();
    assert_eq!(detail.ticket.id, created.ticket.id);
    assert!(
        !detail.messages.is_empty(),
        "Creation must leave an audit message"
    );
}

#[tokio::test]
async fn test_create_with_blank_description_is_400() {
    let server = spawn_server(ok_provider()).await;

    let resp = server
        .client
        .post(server.url("/api/tickets"))
        .json(&json!({"requester_name": "alice", "description": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("description"));
}

#[tokio::test]
async fn test_unknown_ticket_is_404_envelope() {
    let server = spawn_server(ok_provider()).await;

    let resp = server
        .client
        .get(server.url("/api/tickets/4040"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_list_filters_and_bad_label() {
    let server = spawn_server(ok_provider()).await;
    create_ticket(&server, "alice", "one").await;
    create_ticket(&server, "bob", "two").await;

    let resp = server
        .client
        .get(server.url("/api/tickets?status=New"))
        .send()
        .await
        .unwrap();
    let list: TicketListResponse = resp.json().await.unwrap();
    assert!(list.success);
    assert_eq!(list.count, 2);
    assert_eq!(list.tickets.len(), 2);

    let resp = server
        .client
        .get(server.url("/api/tickets?status=Sideways"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

// ============================================================================
// Test: Status Updates Over The Wire
// ============================================================================

#[tokio::test]
async fn test_put_advances_and_rejects_with_409() {
    let server = spawn_server(ok_provider()).await;
    let ticket = create_ticket(&server, "alice", "no sound").await.ticket;

    let resp = server
        .client
        .put(server.url(&format!("/api/tickets/{}", ticket.id)))
        .json(&json!({"status": "In Progress", "assignee": "bob"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let updated: TicketEnvelope = resp.json().await.unwrap();
    assert_eq!(updated.ticket.status.to_string(), "In Progress");
    assert_eq!(updated.ticket.assignee.as_deref(), Some("bob"));

    // In Progress -> Closed skips Resolved
    let resp = server
        .client
        .put(server.url(&format!("/api/tickets/{}", ticket.id)))
        .json(&json!({"status": "Closed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Invalid transition"));
}

// ============================================================================
// Test: Admin Login And Reopen
// ============================================================================

async fn resolve(server: &TestServer, id: i64) {
    for status in ["In Progress", "Resolved"] {
        let resp = server
            .client
            .put(server.url(&format!("/api/tickets/{}", id)))
            .json(&json!({"status": status}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }
}

#[tokio::test]
async fn test_reopen_requires_bearer_token() {
    let server = spawn_server(ok_provider()).await;
    let ticket = create_ticket(&server, "alice", "mouse double-clicks").await.ticket;
    resolve(&server, ticket.id).await;

    // No token: 401
    let resp = server
        .client
        .post(server.url(&format!("/api/tickets/{}/reopen", ticket.id)))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    // Wrong password: 401, no session
    let resp = server
        .client
        .post(server.url("/api/admin/login"))
        .json(&json!({"username": "admin", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    // Proper login, then reopen succeeds
    let resp = server
        .client
        .post(server.url("/api/admin/login"))
        .json(&json!({"username": "admin", "password": "letmein"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let login: LoginResponse = resp.json().await.unwrap();
    assert!(login.success);
    assert_eq!(login.username, "admin");

    let resp = server
        .client
        .post(server.url(&format!("/api/tickets/{}/reopen", ticket.id)))
        .header("Authorization", format!("Bearer {}", login.token))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let reopened: TicketEnvelope = resp.json().await.unwrap();
    assert_eq!(reopened.ticket.status.to_string(), "In Progress");
}

#[tokio::test]
async fn test_reopen_open_ticket_is_409_even_with_token() {
    let server = spawn_server(ok_provider()).await;
    let ticket = create_ticket(&server, "alice", "fresh case").await.ticket;

    let login: LoginResponse = server
        .client
        .post(server.url("/api/admin/login"))
        .json(&json!({"username": "admin", "password": "letmein"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = server
        .client
        .post(server.url(&format!("/api/tickets/{}/reopen", ticket.id)))
        .header("Authorization", format!("Bearer {}", login.token))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

// ============================================================================
// Test: Messages And View Tracking
// ============================================================================

#[tokio::test]
async fn test_message_append_and_unread_flag() {
    let server = spawn_server(ok_provider()).await;
    let ticket = create_ticket(&server, "alice", "vpn client crashes").await.ticket;

    let resp = server
        .client
        .post(server.url(&format!("/api/tickets/{}/messages", ticket.id)))
        .json(&json!({"author": "admin", "author_name": "bob", "body": "Which OS version?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    // alice has never viewed the ticket and there are messages: unread
    let resp = server
        .client
        .get(server.url("/api/tickets?viewer=alice"))
        .send()
        .await
        .unwrap();
    let list: TicketListResponse = resp.json().await.unwrap();
    assert_eq!(list.tickets[0].has_new_messages, Some(true));

    // Listing the messages with viewer=alice marks them seen
    let resp = server
        .client
        .get(server.url(&format!(
            "/api/tickets/{}/messages?viewer=alice",
            ticket.id
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = server
        .client
        .get(server.url("/api/tickets?viewer=alice"))
        .send()
        .await
        .unwrap();
    let list: TicketListResponse = resp.json().await.unwrap();
    assert_eq!(list.tickets[0].has_new_messages, Some(false));
}

// ============================================================================
// Test: Assistant Endpoint
// ============================================================================

#[tokio::test]
async fn test_ask_returns_answer_with_citations() {
    let server = spawn_server(ok_provider()).await;

    let resp = server
        .client
        .post(server.url("/api/agent/ask"))
        .json(&json!({"question": "I forgot my password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let ask: AskResponse = resp.json().await.unwrap();
    assert!(ask.success);
    assert_eq!(ask.answer_text, "Use the portal.");
    assert_eq!(ask.citations, vec!["Password Reset"]);
    assert!(ask.ticket_id.is_none());
}

#[tokio::test]
async fn test_ask_with_failing_provider_still_200() {
    let server = spawn_server(FakeProvider::failing("boom")).await;

    let resp = server
        .client
        .post(server.url("/api/agent/ask"))
        .json(&json!({"question": "I forgot my password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.status().as_u16(),
        200,
        "Provider trouble must never become an HTTP error"
    );
    let ask: AskResponse = resp.json().await.unwrap();
    assert!(ask.success);
    assert!(ask.citations.is_empty());
}

#[tokio::test]
async fn test_ask_empty_question_is_400() {
    let server = spawn_server(ok_provider()).await;

    let resp = server
        .client
        .post(server.url("/api/agent/ask"))
        .json(&json!({"question": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

// ============================================================================
// Test: Stats And Health
// ============================================================================

#[tokio::test]
async fn test_stats_and_health_endpoints() {
    let server = spawn_server(ok_provider()).await;
    create_ticket(&server, "alice", "one").await;
    let t = create_ticket(&server, "bob", "two").await.ticket;
    resolve(&server, t.id).await;

    let stats: StatsResponse = server
        .client
        .get(server.url("/api/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(stats.success);
    assert_eq!(stats.stats.total, 2);
    assert_eq!(stats.stats.open, 1, "Resolved tickets are not open");
    assert_eq!(stats.stats.by_status.get("Resolved"), Some(&1));
    assert_eq!(stats.stats.by_status.get("Closed"), Some(&0));

    let health: HealthResponse = server
        .client
        .get(server.url("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.policies_loaded, 1);
    assert!(!health.version.is_empty());
}
