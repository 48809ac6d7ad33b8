//! Terminal output helpers - ASCII tags, aligned keys, status colors.

use helpdesk_common::{MessageAuthor, TicketPriority, TicketStatus};
use owo_colors::OwoColorize;

pub const HR: &str = "------------------------------------------------------------";

const KEY_WIDTH: usize = 13;

pub fn display_error(message: &str) {
    eprintln!();
    eprintln!("[ERROR] {}", message.red());
    eprintln!();
}

pub fn display_success(message: &str) {
    println!();
    println!("[OK] {}", message.green());
    println!();
}

pub fn display_info(message: &str) {
    println!("[INFO] {}", message);
}

pub fn display_warning(message: &str) {
    println!("[WARNING] {}", message.yellow());
}

pub fn print_kv(key: &str, value: &str) {
    println!("{:width$} {}", key, value, width = KEY_WIDTH);
}

/// Status label padded to `width`, then colored. Padding happens before
/// coloring so the escape codes do not break column alignment.
pub fn status_cell(status: TicketStatus, width: usize) -> String {
    let padded = format!("{:<width$}", status.as_str(), width = width);
    match status {
        TicketStatus::New => padded.bright_cyan().to_string(),
        TicketStatus::InProgress => padded.yellow().to_string(),
        TicketStatus::Resolved => padded.green().to_string(),
        TicketStatus::Closed => padded.dimmed().to_string(),
    }
}

pub fn priority_cell(priority: TicketPriority, width: usize) -> String {
    let padded = format!("{:<width$}", priority.as_str(), width = width);
    match priority {
        TicketPriority::Low => padded.dimmed().to_string(),
        TicketPriority::Medium => padded,
        TicketPriority::High => padded.yellow().to_string(),
        TicketPriority::Urgent => padded.bright_red().to_string(),
    }
}

pub fn author_tag(author: MessageAuthor) -> String {
    match author {
        MessageAuthor::User => "[user]".cyan().to_string(),
        MessageAuthor::Admin => "[admin]".yellow().to_string(),
        MessageAuthor::Assistant => "[assistant]".magenta().to_string(),
        MessageAuthor::System => "[system]".dimmed().to_string(),
    }
}

/// Cut a description down for one table cell.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

pub fn format_uptime(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
