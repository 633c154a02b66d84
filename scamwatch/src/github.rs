use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
pub use reqwest::Url;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{CommentError, FetchError};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Owner/name pair of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoords {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoCoords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Authenticated operations the workflow needs from the source host.
#[async_trait]
pub trait RepoHost: Send + Sync {
    async fn get_content(
        &self,
        repo: &RepoCoords,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError>;

    async fn create_comment(
        &self,
        repo: &RepoCoords,
        number: u64,
        body: &str,
    ) -> Result<(), CommentError>;
}

#[derive(Deserialize)]
struct ContentResponse {
    content: Option<String>,
    encoding: Option<String>,
}

#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: Url,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        let api_base = Url::parse(GITHUB_API_BASE).expect("GITHUB_API_BASE is a valid URL");
        Self::with_base(api_base, token)
    }

    /// Client against a different API root, e.g. GitHub Enterprise or a test server.
    pub fn with_base(api_base: Url, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("scamwatch")
                .build()
                .expect("failed to build HTTP client"),
            api_base,
            token,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    /// Read a file through the contents API and decode its base64 payload.
    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn get_content(
        &self,
        repo: &RepoCoords,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let mut segments = vec!["repos", repo.owner.as_str(), repo.name.as_str(), "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.endpoint(&segments);
        url.query_pairs_mut().append_pair("ref", git_ref);

        let transport = |source| FetchError::Transport {
            path: path.to_string(),
            git_ref: git_ref.to_string(),
            source,
        };

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                path: path.to_string(),
                git_ref: git_ref.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                path: path.to_string(),
                git_ref: git_ref.to_string(),
                status: status.as_u16(),
            });
        }

        let body: ContentResponse = response.json().await.map_err(transport)?;
        decode_content(body).map_err(|reason| FetchError::Decode {
            path: path.to_string(),
            git_ref: git_ref.to_string(),
            reason,
        })
    }

    #[instrument(skip(self, repo, body), fields(repo = %repo))]
    async fn create_comment(
        &self,
        repo: &RepoCoords,
        number: u64,
        body: &str,
    ) -> Result<(), CommentError> {
        let number = number.to_string();
        let url = self.endpoint(&[
            "repos",
            repo.owner.as_str(),
            repo.name.as_str(),
            "issues",
            &number,
            "comments",
        ]);

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CommentError::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }
}

fn decode_content(body: ContentResponse) -> Result<Vec<u8>, String> {
    match body.encoding.as_deref() {
        Some(encoding) if encoding != "base64" => {
            return Err(format!("unsupported encoding '{encoding}'"));
        }
        _ => {}
    }

    let content = body
        .content
        .ok_or_else(|| "response has no 'content' field".to_string())?;
    // The API wraps base64 output at 60 columns.
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| e.to_string())
}
