//! Prompt assembly for the support assistant.

use helpdesk_common::PolicyMatch;

/// System preamble sent ahead of every question.
const SYSTEM_PREAMBLE: &str = r#"You are an expert IT Support Agent for a company helpdesk.
Your mission is to give helpful, practical technical guidance.

RULES:
1. Lead with concrete, numbered steps the user can follow.
2. When official policy text is provided below, follow it and do not
   contradict it.
3. Mention approval requirements only when the policy text demands them.
4. Be professional but approachable."#;

/// Output contract appended after the question. The parser looks for
/// exactly these two lines at the end of the reply.
const MARKER_INSTRUCTIONS: &str = r#"End your reply with exactly two lines:
APPROVAL_REQUIRED: yes or no (does this request need manager/IT approval per policy?)
FILE_TICKET: yes or no (should a support ticket be filed so a technician follows up?)"#;

const NO_POLICY_NOTE: &str = "No official policy matched this question. Answer from general IT \
knowledge and say clearly that no official policy was found.";

/// Build the full prompt: preamble, any matched policy excerpts, the
/// question, and the marker contract.
pub fn build_assistant_prompt(question: &str, matches: &[PolicyMatch]) -> String {
    let mut prompt = String::from(SYSTEM_PREAMBLE);
    prompt.push_str("\n\n");

    if matches.is_empty() {
        prompt.push_str(NO_POLICY_NOTE);
        prompt.push_str("\n\n");
    } else {
        prompt.push_str("RELEVANT IT POLICIES:\n\n");
        for m in matches {
            prompt.push_str(&format!("--- {} ---\n", m.name()));
            for excerpt in &m.excerpts {
                prompt.push_str(excerpt);
                prompt.push_str("\n\n");
            }
        }
    }

    prompt.push_str(&format!("QUESTION: {}\n\n", question));
    prompt.push_str(MARKER_INSTRUCTIONS);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_common::Policy;

    fn sample_match(name: &str, excerpt: &str) -> PolicyMatch {
        PolicyMatch {
            policy: Policy {
                name: name.to_string(),
                content: excerpt.to_string(),
            },
            score: 1,
            excerpts: vec![excerpt.to_string()],
        }
    }

    #[test]
    fn test_prompt_includes_policy_sections() {
        let matches = vec![
            sample_match("Password Reset", "Use the self-service portal first."),
            sample_match("Email Access", "Webmail is at mail.example.com."),
        ];
        let prompt = build_assistant_prompt("I forgot my password", &matches);

        assert!(prompt.contains("RELEVANT IT POLICIES:"));
        assert!(prompt.contains("--- Password Reset ---"));
        assert!(prompt.contains("--- Email Access ---"));
        assert!(prompt.contains("Use the self-service portal first."));
        assert!(prompt.contains("QUESTION: I forgot my password"));
    }

    #[test]
    fn test_prompt_without_matches_says_so() {
        let prompt = build_assistant_prompt("how do I fold paper airplanes", &[]);
        assert!(!prompt.contains("RELEVANT IT POLICIES:"));
        assert!(prompt.contains("No official policy matched"));
    }

    #[test]
    fn test_prompt_always_demands_markers() {
        for matches in [vec![], vec![sample_match("VPN", "Connect via the client.")]] {
            let prompt = build_assistant_prompt("q", &matches);
            assert!(prompt.contains("APPROVAL_REQUIRED:"));
            assert!(prompt.contains("FILE_TICKET:"));
        }
    }
}
