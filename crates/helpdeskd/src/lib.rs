//! Helpdesk daemon library - exposes modules for testing.

pub mod assistant;
pub mod auth;
pub mod config;
pub mod llm;
pub mod policy;
pub mod prompts;
pub mod routes;
pub mod server;
pub mod store;
pub mod tickets;
