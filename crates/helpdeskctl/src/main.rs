//! Helpdesk Control - CLI client for the helpdesk daemon.
//!
//! Talks to helpdeskd over its HTTP JSON API.

mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "helpdeskctl")]
#[command(about = "IT helpdesk - tickets, assistant, and admin actions", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the helpdesk daemon
    #[arg(long, global = true, default_value = "http://127.0.0.1:7810")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// File a new ticket
    Create {
        /// Who the ticket is for
        requester: String,
        /// What went wrong
        description: String,
        /// low, medium, high or urgent (default medium)
        #[arg(long)]
        priority: Option<String>,
    },

    /// List tickets, optionally filtered
    List {
        /// New, "In Progress", Resolved or Closed
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        /// Substring match on the description
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one ticket with its full message history
    Show { id: i64 },

    /// Move a ticket forward in the workflow
    Status {
        id: i64,
        /// "In Progress", "Resolved" or "Closed"
        status: String,
    },

    /// Assign a ticket to an agent
    Assign { id: i64, assignee: String },

    /// Append a comment to a ticket
    Comment {
        id: i64,
        body: String,
        /// Name recorded as the author
        #[arg(long, default_value = "cli")]
        name: String,
    },

    /// Reopen a Resolved or Closed ticket (admin token required)
    Reopen {
        id: i64,
        /// Target status, New or "In Progress" (default In Progress)
        #[arg(long)]
        to: Option<String>,
    },

    /// Ask the IT assistant a question
    Ask {
        question: String,
        /// Requester name used if a ticket gets filed
        #[arg(long)]
        requester: Option<String>,
        /// Attach the exchange to an existing ticket
        #[arg(long)]
        ticket: Option<i64>,
        /// File a ticket when the assistant suggests one
        #[arg(long)]
        file_ticket: bool,
    },

    /// Ticket counts by status and priority
    Stats,

    /// Daemon health and loaded policy count
    Health,

    /// Log in as an admin and print a session token
    Login {
        #[arg(long, default_value = "admin")]
        username: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = client::HelpdeskClient::new(&cli.server);

    let result = match cli.command {
        Commands::Create {
            requester,
            description,
            priority,
        } => commands::create(&client, &requester, &description, priority.as_deref()).await,
        Commands::List {
            status,
            priority,
            assignee,
            search,
        } => {
            commands::list(
                &client,
                status.as_deref(),
                priority.as_deref(),
                assignee.as_deref(),
                search.as_deref(),
            )
            .await
        }
        Commands::Show { id } => commands::show(&client, id).await,
        Commands::Status { id, status } => commands::set_status(&client, id, &status).await,
        Commands::Assign { id, assignee } => commands::assign(&client, id, &assignee).await,
        Commands::Comment { id, body, name } => commands::comment(&client, id, &body, &name).await,
        Commands::Reopen { id, to } => commands::reopen(&client, id, to.as_deref()).await,
        Commands::Ask {
            question,
            requester,
            ticket,
            file_ticket,
        } => commands::ask(&client, question, requester, ticket, file_ticket).await,
        Commands::Stats => commands::stats(&client).await,
        Commands::Health => commands::health(&client).await,
        Commands::Login { username } => commands::login(&client, &username).await,
    };

    if let Err(e) = result {
        output::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
