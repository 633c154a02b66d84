use std::fmt;

use tracing::{debug, info, instrument};

use crate::comment;
use crate::context::BotContext;
use crate::diff;
use crate::entry::parse_entries;
use crate::error::WorkflowError;
use crate::event::PullRequestEvent;

/// Steps of one diff-and-report run. Every run starts and ends in `Idle`, including
/// runs aborted by an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Authenticating,
    FetchingBase,
    FetchingHead,
    Diffing,
    Enriching,
    Commenting,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::FetchingBase => "fetching-base",
            Self::FetchingHead => "fetching-head",
            Self::Diffing => "diffing",
            Self::Enriching => "enriching",
            Self::Commenting => "commenting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event does not trigger a run; nothing was called.
    Ignored,
    Commented { new_entries: usize },
}

struct Tracker {
    number: u64,
    state: WorkflowState,
}

impl Tracker {
    fn new(number: u64) -> Self {
        Self {
            number,
            state: WorkflowState::Idle,
        }
    }

    fn enter(&mut self, next: WorkflowState) {
        debug!(pr = self.number, from = %self.state, to = %next, "workflow transition");
        self.state = next;
    }

    fn reset(&mut self) {
        if self.state != WorkflowState::Idle {
            debug!(pr = self.number, at = %self.state, "workflow aborted");
            self.enter(WorkflowState::Idle);
        }
    }
}

// Early returns through `?` still bring the run back to `Idle`.
impl Drop for Tracker {
    fn drop(&mut self) {
        self.reset();
    }
}

/// Run the diff-and-report workflow for one pull-request event.
///
/// Only `opened` events do any work. Auth, fetch, parse, and comment failures abort
/// the run before anything is posted.
#[instrument(skip_all, fields(repo = %event.repo, pr = event.number, action = %event.action))]
pub async fn run(ctx: &BotContext, event: &PullRequestEvent) -> Result<Outcome, WorkflowError> {
    if !event.is_opened() {
        debug!("action does not trigger a report");
        return Ok(Outcome::Ignored);
    }

    let mut tracker = Tracker::new(event.number);

    tracker.enter(WorkflowState::Authenticating);
    let host = ctx.auth.authenticate(event.installation_id).await?;

    tracker.enter(WorkflowState::FetchingBase);
    let base = host
        .get_content(&event.repo, &event.base_ref, &ctx.data_path)
        .await?;

    tracker.enter(WorkflowState::FetchingHead);
    let head = host
        .get_content(&event.repo, &event.head_ref, &ctx.data_path)
        .await?;

    tracker.enter(WorkflowState::Diffing);
    let base = parse_entries(&base).map_err(|source| WorkflowError::Parse {
        which: "base",
        source,
    })?;
    let head = parse_entries(&head).map_err(|source| WorkflowError::Parse {
        which: "head",
        source,
    })?;
    let new_entries = diff::resolve(&base, &head);
    info!(count = new_entries.len(), "new entries found");

    tracker.enter(WorkflowState::Enriching);
    let enriched = ctx.enrich.run(new_entries).await;

    tracker.enter(WorkflowState::Commenting);
    let body = comment::format(&enriched);
    host.create_comment(&event.repo, event.number, &body).await?;

    tracker.enter(WorkflowState::Idle);
    Ok(Outcome::Commented {
        new_entries: enriched.len(),
    })
}
