use std::time::Duration;

use async_trait::async_trait;
use oauth2::{
    basic::BasicClient, url::ParseError, AuthType, AuthUrl, AuthorizationCode, ClientId,
    ClientSecret, CsrfToken, EndpointNotSet, EndpointSet, RedirectUrl, RequestTokenError, Scope,
    TokenResponse, TokenUrl,
};
use serde::Deserialize;

use crate::config::GoogleOAuthConfig;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

const SCOPES: [&str; 3] = ["openid", "profile", "email"];

/// Client with the authorization and token endpoints configured
type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Invalid OAuth endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
    #[error("Profile request failed: {0}")]
    Profile(String),
}

/// Identity returned by the provider after a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub email: String,
    pub email_verified: bool,
    pub name: String,
    pub picture: Option<String>,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL the browser is sent to, carrying `state` for CSRF protection
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError>;

    /// Trades an authorization code for the user's profile
    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, OAuthError>;
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: String,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Google authorization-code flow client
///
/// The `oauth2` crate drives the authorize URL and the code exchange; the
/// profile comes from Google's userinfo endpoint.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    oauth: GoogleClient,
    userinfo_url: String,
}

fn endpoint<T>(url: &str, parse: fn(String) -> Result<T, ParseError>) -> Result<T, OAuthError> {
    parse(url.to_string()).map_err(|e| OAuthError::InvalidEndpoint(format!("{}: {}", url, e)))
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, OAuthError> {
        Self::with_endpoints(config, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL)
    }

    /// Builds a client against other endpoints (e.g. a local mock server)
    pub fn with_endpoints(
        config: GoogleOAuthConfig,
        auth_url: &str,
        token_url: &str,
        userinfo_url: &str,
    ) -> Result<Self, OAuthError> {
        let oauth = BasicClient::new(ClientId::new(config.client_id))
            .set_client_secret(ClientSecret::new(config.client_secret))
            .set_auth_type(AuthType::RequestBody)
            .set_auth_uri(endpoint(auth_url, AuthUrl::new)?)
            .set_token_uri(endpoint(token_url, TokenUrl::new)?)
            .set_redirect_uri(endpoint(&config.callback_url, RedirectUrl::new)?);

        endpoint(userinfo_url, |url| reqwest::Url::parse(&url))?;

        // Token endpoints must not redirect
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            oauth,
            userinfo_url: userinfo_url.to_string(),
        })
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let state = state.to_string();
        let (url, _) = self
            .oauth
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(SCOPES.iter().map(|scope| Scope::new(scope.to_string())))
            .add_extra_param("prompt", "select_account")
            .url();

        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                OAuthError::TokenExchange(match e {
                    RequestTokenError::ServerResponse(response) => response.to_string(),
                    other => other.to_string(),
                })
            })?;

        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(token.access_token().secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::Profile(response.status().to_string()));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| OAuthError::Profile(e.to_string()))?;

        tracing::debug!(email = %info.email, "Fetched Google profile");

        Ok(OAuthProfile {
            email: info.email,
            email_verified: info.email_verified,
            name: info.name.unwrap_or_default(),
            picture: info.picture,
        })
    }
}
