//! Shared types for the helpdesk daemon and CLI.
//!
//! Domain types (tickets, policies, assistant answers), the error
//! taxonomy, and the HTTP API request/response payloads.

pub mod answer;
pub mod api;
pub mod error;
pub mod policy;
pub mod ticket;

pub use answer::*;
pub use api::*;
pub use error::*;
pub use policy::*;
pub use ticket::*;
