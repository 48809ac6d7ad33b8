//! Policy document store.
//!
//! Loads every `*.txt` file under the policy directory into memory at
//! startup. The store is passed to consumers explicitly; a reload swaps
//! the whole set, and nothing mutates it in place. Lookup is keyword
//! overlap, not an index: policies number in the dozens at most.

use helpdesk_common::{Policy, PolicyMatch};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Paragraphs embedded per matched policy; keeps prompts small.
const MAX_EXCERPTS: usize = 3;

/// Keywords shorter than this carry no signal ("my", "to", "is").
const MIN_KEYWORD_LEN: usize = 3;

pub struct PolicyStore {
    dir: PathBuf,
    policies: RwLock<Vec<Policy>>,
}

impl PolicyStore {
    /// Load all policy files from `dir`. A missing directory or an
    /// unreadable file is logged and skipped; startup never fails on
    /// policy problems.
    pub fn load(dir: &Path) -> Self {
        let policies = read_policy_dir(dir);
        info!("Loaded {} policy documents from {:?}", policies.len(), dir);
        Self {
            dir: dir.to_path_buf(),
            policies: RwLock::new(policies),
        }
    }

    /// Re-read the policy directory, replacing the loaded set. Returns
    /// the new count.
    pub fn reload(&self) -> usize {
        let fresh = read_policy_dir(&self.dir);
        let count = fresh.len();
        *self.policies.write().unwrap() = fresh;
        info!("Reloaded {} policy documents from {:?}", count, self.dir);
        count
    }

    pub fn count(&self) -> usize {
        self.policies.read().unwrap().len()
    }

    pub fn names(&self) -> Vec<String> {
        self.policies
            .read()
            .unwrap()
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    /// Score every policy against the question's keywords and return the
    /// matches, best first. Ties break by policy name so the order is
    /// stable. An empty result is a normal outcome, not an error.
    pub fn find_relevant(&self, question: &str) -> Vec<PolicyMatch> {
        let keywords = extract_keywords(question);
        if keywords.is_empty() {
            return Vec::new();
        }

        let policies = self.policies.read().unwrap();
        let mut matches: Vec<PolicyMatch> = policies
            .iter()
            .filter_map(|policy| score_policy(policy, &keywords))
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.policy.name.cmp(&b.policy.name))
        });
        matches
    }
}

fn read_policy_dir(dir: &Path) -> Vec<Policy> {
    if !dir.is_dir() {
        warn!("Policy directory {:?} does not exist; starting empty", dir);
        return Vec::new();
    }

    let mut policies = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let name = policy_name_from_path(path);
                policies.push(Policy { name, content });
            }
            Err(e) => {
                warn!("Skipping unreadable policy file {:?}: {}", path, e);
            }
        }
    }
    policies
}

/// "password_reset.txt" becomes "Password Reset".
fn policy_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Policy");

    stem.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Distinct lowercased alphanumeric tokens of useful length.
fn extract_keywords(question: &str) -> Vec<String> {
    let mut keywords: Vec<String> = question
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_KEYWORD_LEN)
        .map(String::from)
        .collect();
    keywords.sort();
    keywords.dedup();
    keywords
}

/// Score one policy: number of distinct keywords found anywhere in the
/// text, case-insensitively. Zero matches means no PolicyMatch.
fn score_policy(policy: &Policy, keywords: &[String]) -> Option<PolicyMatch> {
    let content_lower = policy.content.to_lowercase();
    let score = keywords
        .iter()
        .filter(|kw| content_lower.contains(kw.as_str()))
        .count();
    if score == 0 {
        return None;
    }

    // Keep only the paragraphs that actually mention a keyword
    let excerpts: Vec<String> = policy
        .content
        .split("\n\n")
        .filter(|para| {
            let para_lower = para.to_lowercase();
            keywords.iter().any(|kw| para_lower.contains(kw.as_str()))
        })
        .take(MAX_EXCERPTS)
        .map(|para| para.trim().to_string())
        .collect();

    Some(PolicyMatch {
        policy: policy.clone(),
        score,
        excerpts,
    })
}
