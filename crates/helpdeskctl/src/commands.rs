//! Command handlers for helpdeskctl.

use crate::client::{HelpdeskClient, ADMIN_TOKEN_ENV};
use crate::output::{self, HR};
use anyhow::{anyhow, Result};
use helpdesk_common::{AskRequest, TicketPriority, TicketStatus, UpdateTicketRequest};
use owo_colors::OwoColorize;

pub async fn create(
    client: &HelpdeskClient,
    requester: &str,
    description: &str,
    priority: Option<&str>,
) -> Result<()> {
    let ticket = client.create_ticket(requester, description, priority).await?;
    output::display_success(&format!(
        "Ticket #{} filed ({} priority)",
        ticket.id, ticket.priority
    ));
    Ok(())
}

pub async fn list(
    client: &HelpdeskClient,
    status: Option<&str>,
    priority: Option<&str>,
    assignee: Option<&str>,
    search: Option<&str>,
) -> Result<()> {
    let list = client.list_tickets(status, priority, assignee, search).await?;

    if list.tickets.is_empty() {
        println!("No tickets match.");
        return Ok(());
    }

    println!();
    println!(
        "{:<6} {:<12} {:<8} {:<14} {:<14} DESCRIPTION",
        "ID", "STATUS", "PRI", "REQUESTER", "ASSIGNEE"
    );
    println!("{}", HR.dimmed());
    for t in &list.tickets {
        println!(
            "{:<6} {} {} {:<14} {:<14} {}",
            t.id,
            output::status_cell(t.status, 12),
            output::priority_cell(t.priority, 8),
            output::truncate(&t.requester_name, 14),
            output::truncate(t.assignee.as_deref().unwrap_or("-"), 14),
            output::truncate(&t.description, 48),
        );
    }
    println!();
    println!("{} ticket(s)", list.count);
    println!();
    Ok(())
}

pub async fn show(client: &HelpdeskClient, id: i64) -> Result<()> {
    let detail = client.ticket_detail(id).await?;
    let t = &detail.ticket;

    println!();
    println!("{}", format!("Ticket #{}", t.id).bold());
    println!("{}", HR.dimmed());
    output::print_kv("status", &output::status_cell(t.status, 0));
    output::print_kv("priority", &output::priority_cell(t.priority, 0));
    output::print_kv("requester", &t.requester_name);
    output::print_kv("assignee", t.assignee.as_deref().unwrap_or("-"));
    output::print_kv(
        "created",
        &t.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    );
    output::print_kv(
        "updated",
        &t.updated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    );
    output::print_kv("description", &t.description);
    if let Some(notes) = &t.resolution_notes {
        output::print_kv("resolution", notes);
    }

    println!();
    println!("[MESSAGES]");
    for m in &detail.messages {
        println!(
            "  {} {} ({}): {}",
            output::author_tag(m.author),
            m.author_name,
            m.created_at.format("%Y-%m-%d %H:%M"),
            m.body
        );
    }
    println!();
    Ok(())
}

pub async fn set_status(client: &HelpdeskClient, id: i64, status: &str) -> Result<()> {
    let update = UpdateTicketRequest {
        status: Some(status.to_string()),
        ..Default::default()
    };
    let ticket = client.update_ticket(id, &update).await?;
    output::display_success(&format!("Ticket #{} is now {}", ticket.id, ticket.status));
    Ok(())
}

pub async fn assign(client: &HelpdeskClient, id: i64, assignee: &str) -> Result<()> {
    let update = UpdateTicketRequest {
        assignee: Some(assignee.to_string()),
        ..Default::default()
    };
    let ticket = client.update_ticket(id, &update).await?;
    output::display_success(&format!(
        "Ticket #{} assigned to {}",
        ticket.id,
        ticket.assignee.as_deref().unwrap_or(assignee)
    ));
    Ok(())
}

pub async fn comment(client: &HelpdeskClient, id: i64, body: &str, name: &str) -> Result<()> {
    client.add_message(id, name, body).await?;
    output::display_success(&format!("Comment added to ticket #{}", id));
    Ok(())
}

pub async fn reopen(client: &HelpdeskClient, id: i64, to: Option<&str>) -> Result<()> {
    let token = std::env::var(ADMIN_TOKEN_ENV).map_err(|_| {
        anyhow!(
            "{} is not set.\nRun `helpdeskctl login` and export the token it prints.",
            ADMIN_TOKEN_ENV
        )
    })?;
    let ticket = client.reopen_ticket(id, &token, to).await?;
    output::display_success(&format!(
        "Ticket #{} reopened to {}",
        ticket.id, ticket.status
    ));
    Ok(())
}

pub async fn ask(
    client: &HelpdeskClient,
    question: String,
    requester: Option<String>,
    ticket: Option<i64>,
    file_ticket: bool,
) -> Result<()> {
    let req = AskRequest {
        question,
        requester,
        ticket_id: ticket,
        create_ticket_if_suggested: file_ticket,
    };
    let answer = client.ask(&req).await?;

    println!();
    println!("{}", answer.answer_text);

    if !answer.citations.is_empty() {
        println!();
        println!("[POLICIES]");
        for citation in &answer.citations {
            println!("  * {}", citation.cyan());
        }
    }

    if answer.requires_approval {
        println!();
        output::display_warning("This request needs manager approval.");
    }

    if let Some(id) = answer.ticket_id {
        println!();
        output::display_info(&format!("Filed ticket #{}", id));
    } else if answer.suggested_ticket {
        println!();
        output::display_info("The assistant suggests filing a ticket (use --file-ticket).");
    }
    println!();
    Ok(())
}

pub async fn stats(client: &HelpdeskClient) -> Result<()> {
    let stats = client.stats().await?;

    println!();
    println!("{}", "Ticket Stats".bold());
    println!("{}", HR.dimmed());
    output::print_kv("total", &stats.total.to_string());
    output::print_kv("open", &stats.open.to_string());

    // Canonical order, not HashMap order
    println!();
    println!("[BY STATUS]");
    for status in TicketStatus::all() {
        let n = stats.by_status.get(status.as_str()).copied().unwrap_or(0);
        println!("  {:<12} {}", status.as_str(), n);
    }

    println!();
    println!("[BY PRIORITY]");
    for priority in TicketPriority::all() {
        let n = stats.by_priority.get(priority.as_str()).copied().unwrap_or(0);
        println!("  {:<12} {}", priority.as_str(), n);
    }
    println!();
    Ok(())
}

pub async fn health(client: &HelpdeskClient) -> Result<()> {
    let health = client.health().await?;

    println!();
    if health.status == "healthy" {
        println!("{} helpdeskd v{}", "[OK]".green(), health.version);
    } else {
        println!("{} helpdeskd v{}", "[WARN]".yellow(), health.version);
    }
    output::print_kv("uptime", &output::format_uptime(health.uptime_seconds));
    output::print_kv("policies", &health.policies_loaded.to_string());
    println!();
    Ok(())
}

pub async fn login(client: &HelpdeskClient, username: &str) -> Result<()> {
    let term = console::Term::stderr();
    term.write_str(&format!("Password for {}: ", username))?;
    let password = term.read_secure_line()?;

    let login = client.login(username, &password).await?;

    output::display_success(&format!("Logged in as {}", login.username));
    println!("Session token (valid for 8 hours):");
    println!();
    println!("  export {}={}", ADMIN_TOKEN_ENV, login.token);
    println!();
    Ok(())
}
