//! Pull-request bot for a YAML list of scam sites.
//!
//! When a pull request is opened, the tracked data file is read at the base and
//! head refs, entries whose URL is new are submitted to urlscan.io, and a summary
//! comment is posted on the pull request.

pub mod auth;
pub mod comment;
pub mod context;
pub mod diff;
pub mod enrich;
pub mod entry;
pub mod error;
pub mod event;
pub mod github;
pub mod urlscan;
pub mod webhook;
pub mod workflow;

pub use context::BotContext;
pub use entry::{Entry, EntryList};
pub use event::PullRequestEvent;
pub use workflow::{Outcome, WorkflowState};
