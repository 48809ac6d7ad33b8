//! Admin authentication: credential check plus bearer-token sessions.
//!
//! Passwords are stored as SHA-256 hex in the users table. Sessions
//! live in memory only; restarting the daemon logs everyone out, which
//! is acceptable for a single-admin tool.

use crate::store::{TicketStore, UserRecord};
use anyhow::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Environment variables seeding the admin account at startup.
pub const ADMIN_USER_ENV: &str = "HELPDESK_ADMIN_USER";
pub const ADMIN_PASSWORD_ENV: &str = "HELPDESK_ADMIN_PASSWORD";

/// Sessions last a working day.
const SESSION_TTL_SECS: u64 = 8 * 60 * 60;

/// An authenticated admin identity.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub username: String,
    pub display_name: String,
    pub role: String,
}

/// Checks a username/password pair against some backing source.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> Option<AdminUser>;
}

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Production verifier backed by the users table.
pub struct StoreVerifier {
    store: Arc<TicketStore>,
}

impl StoreVerifier {
    pub fn new(store: Arc<TicketStore>) -> Self {
        Self { store }
    }
}

impl CredentialVerifier for StoreVerifier {
    fn verify(&self, username: &str, password: &str) -> Option<AdminUser> {
        let record = match self.store.get_user(username) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!("User lookup failed for {}: {}", username, e);
                return None;
            }
        };

        if record.password_sha256 != hash_password(password) {
            return None;
        }

        Some(AdminUser {
            username: record.username,
            display_name: record.display_name,
            role: record.role,
        })
    }
}

#[derive(Debug, Clone)]
struct Session {
    username: String,
    issued_at: Instant,
}

/// In-memory bearer-token store with TTL expiry.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(SESSION_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Issue a fresh token for a verified user.
    pub fn issue(&self, username: &str) -> String {
        let bytes: [u8; 32] = rand::random();
        let token = hex::encode(bytes);

        self.sessions.lock().unwrap().insert(
            token.clone(),
            Session {
                username: username.to_string(),
                issued_at: Instant::now(),
            },
        );
        token
    }

    /// Resolve a token to its username. Expired tokens are dropped on
    /// the spot.
    pub fn validate(&self, token: &str) -> Option<String> {
        let mut sessions = self.sessions.lock().unwrap();
        let now = Instant::now();

        match sessions.get(token) {
            Some(session) if now.duration_since(session.issued_at) < self.ttl => {
                Some(session.username.clone())
            }
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Drop every expired session. Cheap enough to call opportunistically.
    pub fn prune_expired(&self) {
        let mut sessions = self.sessions.lock().unwrap();
        let now = Instant::now();
        sessions.retain(|_, s| now.duration_since(s.issued_at) < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Create or refresh the admin account from the environment. With no
/// seed variables set, whatever is already in the users table stands;
/// if that is nothing, login will simply fail.
pub fn seed_admin_from_env(store: &TicketStore) -> Result<bool> {
    let username = match std::env::var(ADMIN_USER_ENV) {
        Ok(u) if !u.trim().is_empty() => u.trim().to_string(),
        _ => return Ok(false),
    };
    let password = match std::env::var(ADMIN_PASSWORD_ENV) {
        Ok(p) if !p.is_empty() => p,
        _ => {
            warn!(
                "{} is set but {} is not; admin account not seeded",
                ADMIN_USER_ENV, ADMIN_PASSWORD_ENV
            );
            return Ok(false);
        }
    };

    store.upsert_user(&UserRecord {
        username: username.clone(),
        password_sha256: hash_password(&password),
        display_name: username.clone(),
        role: "admin".to_string(),
    })?;

    info!("Seeded admin account '{}' from environment", username);
    Ok(true)
}
