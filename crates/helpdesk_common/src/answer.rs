//! Assistant answers and structured-reply parsing.
//!
//! The daemon asks the model to finish its reply with two marker lines:
//!
//! ```text
//! APPROVAL_REQUIRED: yes
//! FILE_TICKET: no
//! ```
//!
//! `parse_reply` lifts those into booleans and strips them from the text
//! shown to the user. A reply without parseable markers is treated as
//! "no approval needed, no ticket suggested" rather than an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shown when the provider call fails; the assistant degrades instead of
/// surfacing an error to the requester.
pub const FALLBACK_ANSWER: &str =
    "The assistant is temporarily unavailable. Please try again in a few \
     minutes, or create a ticket so an agent can follow up with you.";

static APPROVAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^\s*APPROVAL_REQUIRED:\s*(yes|no)\s*$").unwrap());

static TICKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^\s*FILE_TICKET:\s*(yes|no)\s*$").unwrap());

/// Structured answer from the assistant pipeline.
///
/// Ephemeral: it is returned to the caller and, when a ticket is
/// involved, recorded as a ticket message, but never persisted as its
/// own entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantAnswer {
    pub answer_text: String,
    /// Names of the policies that were retrieved and embedded in the
    /// prompt. Never taken from model output, so a citation can never
    /// name a policy that was not actually consulted.
    pub cited_policies: Vec<String>,
    pub requires_approval: bool,
    pub suggested_ticket: bool,
}

impl AssistantAnswer {
    /// The degraded answer used when the provider call fails.
    pub fn fallback() -> Self {
        Self {
            answer_text: FALLBACK_ANSWER.to_string(),
            cited_policies: Vec::new(),
            requires_approval: false,
            suggested_ticket: false,
        }
    }
}

/// Parse a raw model reply into display text plus the two marker flags.
///
/// Marker lines are removed from the returned text. Missing or mangled
/// markers default to `false`.
pub fn parse_reply(raw: &str) -> (String, bool, bool) {
    let requires_approval = APPROVAL_RE
        .captures(raw)
        .map(|c| c[1].eq_ignore_ascii_case("yes"))
        .unwrap_or(false);

    let suggested_ticket = TICKET_RE
        .captures(raw)
        .map(|c| c[1].eq_ignore_ascii_case("yes"))
        .unwrap_or(false);

    let without_approval = APPROVAL_RE.replace_all(raw, "");
    let cleaned = TICKET_RE.replace_all(&without_approval, "");

    (cleaned.trim().to_string(), requires_approval, suggested_ticket)
}
