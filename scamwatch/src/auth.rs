use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::AuthError;
use crate::github::{GitHubClient, RepoHost};

/// Produces a repository client scoped to the installation that sent an event.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        installation_id: Option<u64>,
    ) -> Result<Arc<dyn RepoHost>, AuthError>;
}

/// Uses one pre-issued token for every event.
pub struct StaticToken {
    client: Arc<GitHubClient>,
}

impl StaticToken {
    pub fn new(client: GitHubClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl Authenticator for StaticToken {
    async fn authenticate(
        &self,
        _installation_id: Option<u64>,
    ) -> Result<Arc<dyn RepoHost>, AuthError> {
        Ok(self.client.clone())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AppClaims {
    iat: u64,
    exp: u64,
    iss: String,
}

#[derive(Deserialize)]
struct InstallationToken {
    token: String,
}

/// GitHub App credentials: signs an app JWT and trades it for an installation token.
pub struct GitHubApp {
    app_id: String,
    key: EncodingKey,
    api_base: Url,
    client: reqwest::Client,
}

impl GitHubApp {
    pub fn new(
        app_id: impl Into<String>,
        private_key_pem: &[u8],
        api_base: Url,
    ) -> Result<Self, AuthError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem).map_err(AuthError::Key)?;
        Ok(Self {
            app_id: app_id.into(),
            key,
            api_base,
            client: reqwest::Client::builder()
                .user_agent("scamwatch")
                .build()
                .expect("failed to build HTTP client"),
        })
    }

    fn app_jwt(&self, now: u64) -> Result<String, AuthError> {
        // Backdated to tolerate clock drift; GitHub caps the lifetime at ten minutes.
        let claims = AppClaims {
            iat: now.saturating_sub(60),
            exp: now + 600,
            iss: self.app_id.clone(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(AuthError::Jwt)
    }

    fn token_url(&self, installation_id: u64) -> Url {
        let id = installation_id.to_string();
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["app", "installations", id.as_str(), "access_tokens"]);
        }
        url
    }
}

#[async_trait]
impl Authenticator for GitHubApp {
    #[instrument(skip(self))]
    async fn authenticate(
        &self,
        installation_id: Option<u64>,
    ) -> Result<Arc<dyn RepoHost>, AuthError> {
        let installation_id = installation_id.ok_or(AuthError::MissingInstallation)?;
        let jwt = self.app_jwt(jsonwebtoken::get_current_timestamp())?;

        let response = self
            .client
            .post(self.token_url(installation_id))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .bearer_auth(jwt)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::UnexpectedStatus(status.as_u16()));
        }

        let InstallationToken { token } = response
            .json()
            .await
            .map_err(|e| AuthError::Response(e.to_string()))?;
        debug!(installation_id, "installation token issued");

        Ok(Arc::new(GitHubClient::with_base(self.api_base.clone(), Some(token))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation};
    use wiremock::matchers::{header, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::github::RepoCoords;

    const PRIVATE_KEY: &[u8] = include_bytes!("../tests/fixtures/app-key.pem");
    const PUBLIC_KEY: &[u8] = include_bytes!("../tests/fixtures/app-key.pub.pem");

    fn app(server: &MockServer) -> GitHubApp {
        GitHubApp::new("4242", PRIVATE_KEY, server.uri().parse().unwrap()).unwrap()
    }

    #[test]
    fn rejects_invalid_key() {
        let result = GitHubApp::new("1", b"not a key", "https://api.github.com".parse().unwrap());
        assert!(matches!(result, Err(AuthError::Key(_))));
    }

    #[tokio::test]
    async fn jwt_is_signed_for_app() {
        let server = MockServer::start().await;
        let now = jsonwebtoken::get_current_timestamp();
        let jwt = app(&server).app_jwt(now).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&["4242"]);
        validation.validate_aud = false;
        let decoded = jsonwebtoken::decode::<AppClaims>(
            &jwt,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY).unwrap(),
            &validation,
        )
        .unwrap();
        assert_eq!(decoded.claims.iat, now - 60);
        assert_eq!(decoded.claims.exp, now + 600);
    }

    #[tokio::test]
    async fn token_request_carries_current_jwt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/installations/7/access_tokens"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"token": "ghs_x"})),
            )
            .mount(&server)
            .await;

        let before = jsonwebtoken::get_current_timestamp();
        app(&server).authenticate(Some(7)).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let bearer = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
        let jwt = bearer.strip_prefix("Bearer ").unwrap();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_aud = false;
        let claims = jsonwebtoken::decode::<AppClaims>(
            jwt,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY).unwrap(),
            &validation,
        )
        .unwrap()
        .claims;
        assert!(claims.iat >= before - 60 && claims.iat <= before);
        assert_eq!(claims.exp - claims.iat, 660);
    }

    #[tokio::test]
    async fn missing_installation_is_an_error() {
        let server = MockServer::start().await;
        let result = app(&server).authenticate(None).await;
        assert!(matches!(result, Err(AuthError::MissingInstallation)));
    }

    #[tokio::test]
    async fn exchanges_jwt_for_installation_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/installations/99/access_tokens"))
            .and(header_regex("Authorization", r"^Bearer [\w-]+\.[\w-]+\.[\w-]+$"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"token": "ghs_installation"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/scams/issues/1/comments"))
            .and(header("Authorization", "Bearer ghs_installation"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let host = app(&server).authenticate(Some(99)).await.unwrap();
        let repo = RepoCoords {
            owner: "acme".into(),
            name: "scams".into(),
        };
        host.create_comment(&repo, 1, "hi").await.unwrap();
    }

    #[tokio::test]
    async fn token_endpoint_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = app(&server).authenticate(Some(99)).await;
        assert!(matches!(result, Err(AuthError::UnexpectedStatus(401))));
    }

    #[tokio::test]
    async fn static_token_ignores_installation() {
        let auth = StaticToken::new(GitHubClient::new(Some("tok".into())));
        assert!(auth.authenticate(None).await.is_ok());
        assert!(auth.authenticate(Some(5)).await.is_ok());
    }
}
