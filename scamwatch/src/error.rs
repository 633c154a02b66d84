use thiserror::Error;

/// Failure to read the tracked file from the repository.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {path}@{git_ref} failed: {source}")]
    Transport {
        path: String,
        git_ref: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} not found at ref {git_ref}")]
    NotFound { path: String, git_ref: String },
    #[error("contents API returned HTTP {status} for {path}@{git_ref}")]
    UnexpectedStatus {
        path: String,
        git_ref: String,
        status: u16,
    },
    #[error("could not decode {path}@{git_ref}: {reason}")]
    Decode {
        path: String,
        git_ref: String,
        reason: String,
    },
}

/// The tracked file is not a valid entry list.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("top level of the data file must be a sequence")]
    NotASequence,
    #[error("entry {0} is not a mapping")]
    NotAMapping(usize),
    #[error("entry {0} has no string 'url' field")]
    MissingUrl(usize),
}

/// A single urlscan.io submission failed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("urlscan returned HTTP {0}")]
    UnexpectedStatus(u16),
    #[error("urlscan returned an empty body")]
    EmptyBody,
    #[error("urlscan response has no result")]
    MissingResult,
}

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("comment request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("comments API returned HTTP {0}")]
    UnexpectedStatus(u16),
}

/// Failure to obtain an installation-scoped credential.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("event carries no installation id")]
    MissingInstallation,
    #[error("invalid app private key: {0}")]
    Key(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign app JWT: {0}")]
    Jwt(#[source] jsonwebtoken::errors::Error),
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint returned HTTP {0}")]
    UnexpectedStatus(u16),
    #[error("malformed token response: {0}")]
    Response(String),
}

/// A required field is absent from the webhook payload.
#[derive(Debug, Error)]
#[error("webhook payload is missing '{0}'")]
pub struct ValidationError(pub &'static str);

/// Anything that aborts a workflow instance.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{which} file: {source}")]
    Parse {
        which: &'static str,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Comment(#[from] CommentError),
}
