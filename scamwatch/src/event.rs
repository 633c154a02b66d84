use serde_json::Value;

use crate::error::ValidationError;
use crate::github::RepoCoords;

/// The fields of a `pull_request` delivery the workflow acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestEvent {
    pub action: String,
    pub repo: RepoCoords,
    pub base_ref: String,
    pub head_ref: String,
    pub number: u64,
    pub installation_id: Option<u64>,
}

impl PullRequestEvent {
    pub fn is_opened(&self) -> bool {
        self.action == "opened"
    }
}

fn str_at(payload: &Value, pointer: &str, name: &'static str) -> Result<String, ValidationError> {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ValidationError(name))
}

impl TryFrom<&Value> for PullRequestEvent {
    type Error = ValidationError;

    fn try_from(payload: &Value) -> Result<Self, Self::Error> {
        Ok(Self {
            action: str_at(payload, "/action", "action")?,
            repo: RepoCoords {
                owner: str_at(payload, "/repository/owner/login", "repository.owner.login")?,
                name: str_at(payload, "/repository/name", "repository.name")?,
            },
            base_ref: str_at(payload, "/pull_request/base/ref", "pull_request.base.ref")?,
            head_ref: str_at(payload, "/pull_request/head/ref", "pull_request.head.ref")?,
            number: payload
                .pointer("/pull_request/number")
                .and_then(Value::as_u64)
                .ok_or(ValidationError("pull_request.number"))?,
            installation_id: payload.pointer("/installation/id").and_then(Value::as_u64),
        })
    }
}
