//! SQLite-backed ticket storage.
//!
//! One database file holds tickets, their append-only messages, per
//! viewer read markers and the admin user table. All access goes
//! through parameterized queries; the connection's own locking
//! serializes concurrent writes.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use helpdesk_common::{MessageAuthor, Ticket, TicketMessage, TicketPriority, TicketStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Filters for ticket search; all provided fields must match.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assignee: Option<String>,
    /// Case-insensitive substring over requester name and description
    pub text: Option<String>,
}

/// An admin user row. The password is stored only as a SHA-256 hex
/// digest.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub password_sha256: String,
    pub display_name: String,
    pub role: String,
}

/// Ticket store backed by SQLite.
pub struct TicketStore {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl TicketStore {
    /// Open or create the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.to_path_buf(),
        };

        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                requester_name TEXT NOT NULL,
                description TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'Medium',
                status TEXT NOT NULL DEFAULT 'New',
                assignee TEXT,
                resolution_notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS ticket_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_id INTEGER NOT NULL,
                author TEXT NOT NULL,
                author_name TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (ticket_id) REFERENCES tickets(id)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS ticket_views (
                ticket_id INTEGER NOT NULL,
                viewer TEXT NOT NULL,
                last_viewed TEXT NOT NULL,
                PRIMARY KEY (ticket_id, viewer)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password_sha256 TEXT NOT NULL,
                display_name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'admin'
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tickets_priority ON tickets(priority)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_ticket ON ticket_messages(ticket_id)",
            [],
        )?;

        Ok(())
    }

    // ========================================================================
    // Tickets
    // ========================================================================

    /// Insert a new ticket with status New and fresh timestamps.
    pub fn create_ticket(
        &self,
        requester_name: &str,
        description: &str,
        priority: TicketPriority,
    ) -> Result<Ticket> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            r#"
            INSERT INTO tickets (requester_name, description, priority, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                requester_name,
                description,
                priority.as_str(),
                TicketStatus::New.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339()
            ],
        )?;

        Ok(Ticket {
            id: conn.last_insert_rowid(),
            requester_name: requester_name.to_string(),
            description: description.to_string(),
            priority,
            status: TicketStatus::New,
            assignee: None,
            resolution_notes: None,
            created_at: now,
            updated_at: now,
            has_new_messages: None,
        })
    }

    /// Fetch one ticket by id.
    pub fn get_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        let conn = self.conn.lock().unwrap();

        let result = conn
            .query_row(
                r#"
                SELECT id, requester_name, description, priority, status,
                       assignee, resolution_notes, created_at, updated_at
                FROM tickets WHERE id = ?
                "#,
                params![id],
                row_to_ticket,
            )
            .optional()?;

        Ok(result)
    }

    /// Update the status column, bumping `updated_at`.
    pub fn set_status(&self, id: i64, status: TicketStatus) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute(
            "UPDATE tickets SET status = ?, updated_at = ? WHERE id = ?",
            params![status.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        Ok(count > 0)
    }

    /// Update the assignee column, bumping `updated_at`.
    pub fn set_assignee(&self, id: i64, assignee: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute(
            "UPDATE tickets SET assignee = ?, updated_at = ? WHERE id = ?",
            params![assignee, Utc::now().to_rfc3339(), id],
        )?;
        Ok(count > 0)
    }

    /// Update the resolution notes column, bumping `updated_at`.
    pub fn set_resolution_notes(&self, id: i64, notes: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute(
            "UPDATE tickets SET resolution_notes = ?, updated_at = ? WHERE id = ?",
            params![notes, Utc::now().to_rfc3339(), id],
        )?;
        Ok(count > 0)
    }

    /// Search tickets; every provided filter narrows the result.
    /// Newest first.
    pub fn search(&self, filter: &SearchFilter) -> Result<Vec<Ticket>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from(
            "SELECT id, requester_name, description, priority, status, \
             assignee, resolution_notes, created_at, updated_at \
             FROM tickets WHERE 1=1",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            params_vec.push(Box::new(status.as_str().to_string()));
        }

        if let Some(priority) = filter.priority {
            sql.push_str(" AND priority = ?");
            params_vec.push(Box::new(priority.as_str().to_string()));
        }

        if let Some(ref assignee) = filter.assignee {
            sql.push_str(" AND assignee = ?");
            params_vec.push(Box::new(assignee.clone()));
        }

        if let Some(ref text) = filter.text {
            sql.push_str(
                " AND (LOWER(requester_name) LIKE ? OR LOWER(description) LIKE ?)",
            );
            let needle = format!("%{}%", text.to_lowercase());
            params_vec.push(Box::new(needle.clone()));
            params_vec.push(Box::new(needle));
        }

        sql.push_str(" ORDER BY created_at DESC");

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_refs.as_slice(), row_to_ticket)?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// Append a message; messages are never updated or deleted.
    pub fn add_message(
        &self,
        ticket_id: i64,
        author: MessageAuthor,
        author_name: &str,
        body: &str,
    ) -> Result<TicketMessage> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            r#"
            INSERT INTO ticket_messages (ticket_id, author, author_name, body, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![ticket_id, author.as_str(), author_name, body, now.to_rfc3339()],
        )?;

        Ok(TicketMessage {
            id: conn.last_insert_rowid(),
            ticket_id,
            author,
            author_name: author_name.to_string(),
            body: body.to_string(),
            created_at: now,
        })
    }

    /// All messages for a ticket, oldest first.
    pub fn messages_for(&self, ticket_id: i64) -> Result<Vec<TicketMessage>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            r#"
            SELECT id, ticket_id, author, author_name, body, created_at
            FROM ticket_messages WHERE ticket_id = ? ORDER BY created_at ASC, id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![ticket_id], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    // ========================================================================
    // View tracking
    // ========================================================================

    /// Record that `viewer` has seen the ticket as of now.
    pub fn mark_viewed(&self, ticket_id: i64, viewer: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO ticket_views (ticket_id, viewer, last_viewed) VALUES (?, ?, ?)",
            params![ticket_id, viewer, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Whether the ticket has messages the viewer has not seen. A ticket
    /// never viewed counts as unread as soon as it has any message.
    pub fn has_new_messages(&self, ticket_id: i64, viewer: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();

        let last_viewed: Option<String> = conn
            .query_row(
                "SELECT last_viewed FROM ticket_views WHERE ticket_id = ? AND viewer = ?",
                params![ticket_id, viewer],
                |row| row.get(0),
            )
            .optional()?;

        let count: i64 = match last_viewed {
            // RFC 3339 UTC strings compare correctly as text
            Some(ts) => conn.query_row(
                "SELECT COUNT(*) FROM ticket_messages WHERE ticket_id = ? AND created_at > ?",
                params![ticket_id, ts],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM ticket_messages WHERE ticket_id = ?",
                params![ticket_id],
                |row| row.get(0),
            )?,
        };

        Ok(count > 0)
    }

    // ========================================================================
    // Stats
    // ========================================================================

    pub fn count_total(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_by_status(&self) -> Result<HashMap<String, i64>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM tickets GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (status, count) = row?;
            counts.insert(status, count);
        }
        Ok(counts)
    }

    pub fn count_by_priority(&self) -> Result<HashMap<String, i64>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare("SELECT priority, COUNT(*) FROM tickets GROUP BY priority")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (priority, count) = row?;
            counts.insert(priority, count);
        }
        Ok(counts)
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Insert or replace an admin user.
    pub fn upsert_user(&self, user: &UserRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO users (username, password_sha256, display_name, role)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                user.username,
                user.password_sha256,
                user.display_name,
                user.role
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock().unwrap();

        let result = conn
            .query_row(
                "SELECT username, password_sha256, display_name, role FROM users WHERE username = ?",
                params![username],
                |row| {
                    Ok(UserRecord {
                        username: row.get(0)?,
                        password_sha256: row.get(1)?,
                        display_name: row.get(2)?,
                        role: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(result)
    }

    /// Get database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }
}

fn row_to_ticket(row: &Row) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        requester_name: row.get(1)?,
        description: row.get(2)?,
        priority: row
            .get::<_, String>(3)?
            .parse::<TicketPriority>()
            .unwrap_or_default(),
        status: row
            .get::<_, String>(4)?
            .parse::<TicketStatus>()
            .unwrap_or_default(),
        assignee: row.get(5)?,
        resolution_notes: row.get(6)?,
        created_at: parse_ts(&row.get::<_, String>(7)?),
        updated_at: parse_ts(&row.get::<_, String>(8)?),
        has_new_messages: None,
    })
}

fn row_to_message(row: &Row) -> rusqlite::Result<TicketMessage> {
    Ok(TicketMessage {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        author: MessageAuthor::parse_lossy(&row.get::<_, String>(2)?),
        author_name: row.get(3)?,
        body: row.get(4)?,
        created_at: parse_ts(&row.get::<_, String>(5)?),
    })
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .unwrap_or_else(|_| Utc::now().into())
        .with_timezone(&Utc)
}
