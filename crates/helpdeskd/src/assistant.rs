//! Assistant service: policy retrieval, prompt assembly, completion,
//! and structured answer parsing.
//!
//! Provider failures never reach the caller. Whatever goes wrong on the
//! wire, `ask` returns a usable `AssistantAnswer`; the degraded case is
//! the fixed fallback text with no citations.

use crate::llm::CompletionProvider;
use crate::policy::PolicyStore;
use crate::prompts::build_assistant_prompt;
use crate::tickets::TicketService;
use helpdesk_common::{
    answer::parse_reply, AssistantAnswer, HelpdeskError, MessageAuthor, TicketPriority,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Prefix on descriptions of tickets the assistant files on its own.
const SUGGESTED_PREFIX: &str = "[AI-suggested]";

/// Requester name used when the caller gave none.
const DEFAULT_REQUESTER: &str = "assistant";

pub struct AssistantService {
    policies: Arc<PolicyStore>,
    provider: Arc<dyn CompletionProvider>,
    tickets: Arc<TicketService>,
}

/// Outcome of one `ask` call. `ticket_id` is set when a ticket was
/// created for the question or the answer was attached to an existing
/// one.
#[derive(Debug)]
pub struct AskOutcome {
    pub answer: AssistantAnswer,
    pub ticket_id: Option<i64>,
}

impl AssistantService {
    pub fn new(
        policies: Arc<PolicyStore>,
        provider: Arc<dyn CompletionProvider>,
        tickets: Arc<TicketService>,
    ) -> Self {
        Self {
            policies,
            provider,
            tickets,
        }
    }

    /// Answer a support question.
    ///
    /// `ticket_id` attaches the exchange to an existing ticket;
    /// `create_ticket_if_suggested` lets the assistant file a new one
    /// when the model recommends it.
    pub async fn ask(
        &self,
        question: &str,
        requester: Option<&str>,
        ticket_id: Option<i64>,
        create_ticket_if_suggested: bool,
    ) -> Result<AskOutcome, HelpdeskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(HelpdeskError::Validation("question must not be empty".into()));
        }

        let matches = self.policies.find_relevant(question);
        let citations: Vec<String> = matches.iter().map(|m| m.name().to_string()).collect();
        info!(
            "Assistant question ({} chars), {} policies matched",
            question.len(),
            matches.len()
        );

        let prompt = build_assistant_prompt(question, &matches);

        let answer = match self.provider.complete(&prompt).await {
            Ok(raw) => {
                let (answer_text, requires_approval, suggested_ticket) = parse_reply(&raw);
                AssistantAnswer {
                    answer_text,
                    cited_policies: citations,
                    requires_approval,
                    suggested_ticket,
                }
            }
            Err(e) => {
                warn!("Provider {} failed, serving fallback: {}", self.provider.name(), e);
                AssistantAnswer::fallback()
            }
        };

        let ticket_id = self
            .record_on_ticket(question, requester, ticket_id, create_ticket_if_suggested, &answer)?;

        Ok(AskOutcome { answer, ticket_id })
    }

    /// Attach the exchange to a ticket: either the one the caller named,
    /// or a fresh one when the model suggested filing and the caller
    /// opted in.
    fn record_on_ticket(
        &self,
        question: &str,
        requester: Option<&str>,
        existing: Option<i64>,
        create_if_suggested: bool,
        answer: &AssistantAnswer,
    ) -> Result<Option<i64>, HelpdeskError> {
        let requester = requester
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REQUESTER);

        if let Some(id) = existing {
            self.tickets
                .add_message(id, MessageAuthor::User, requester, question)?;
            self.tickets.add_message(
                id,
                MessageAuthor::Assistant,
                self.provider.name(),
                &answer.answer_text,
            )?;
            return Ok(Some(id));
        }

        if answer.suggested_ticket && create_if_suggested {
            let ticket = self.tickets.create(
                requester,
                &format!("{} {}", SUGGESTED_PREFIX, question),
                TicketPriority::Medium,
            )?;
            self.tickets.add_message(
                ticket.id,
                MessageAuthor::Assistant,
                self.provider.name(),
                &answer.answer_text,
            )?;
            info!("Assistant filed ticket #{}", ticket.id);
            return Ok(Some(ticket.id));
        }

        Ok(None)
    }
}
