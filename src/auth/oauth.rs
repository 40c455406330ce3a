//! Google and GitHub sign-in behind one provider abstraction.
//!
//! [`Provider`] carries everything that differs between the two: endpoints, scopes,
//! callback path and how a profile is read from the provider API. [`OAuthClient`] runs the
//! Authorization Code flow with PKCE for any provider and hands back an [`ExternalProfile`];
//! turning that profile into a local user is the job of [`super::identity`].

use std::fmt;

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AppConfig, OAuthProviderConfig};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Github,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Github => "github",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::Github => "GitHub",
        }
    }

    pub fn callback_path(self) -> &'static str {
        match self {
            Provider::Google => "/auth/google/callback",
            Provider::Github => "/auth/github/callback",
        }
    }

    fn auth_url(self) -> &'static str {
        match self {
            Provider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Provider::Github => "https://github.com/login/oauth/authorize",
        }
    }

    fn token_url(self) -> &'static str {
        match self {
            Provider::Google => "https://oauth2.googleapis.com/token",
            Provider::Github => "https://github.com/login/oauth/access_token",
        }
    }

    fn scopes(self) -> &'static [&'static str] {
        match self {
            Provider::Google => &["openid", "email", "profile"],
            Provider::Github => &["read:user", "user:email"],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity data a provider returns once the redirect completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub display_name: String,
    /// Candidate emails, most preferred first.
    pub emails: Vec<String>,
}

/// Google userinfo response.
#[derive(Debug, Deserialize)]
pub(crate) struct GoogleUserInfo {
    email: Option<String>,
    #[serde(default)]
    verified_email: Option<bool>,
    name: Option<String>,
}

impl From<GoogleUserInfo> for ExternalProfile {
    fn from(info: GoogleUserInfo) -> Self {
        let emails = info
            .email
            .filter(|_| info.verified_email != Some(false))
            .into_iter()
            .collect();
        Self {
            display_name: info.name.unwrap_or_default(),
            emails,
        }
    }
}

/// GitHub `/user` response.
#[derive(Debug, Deserialize)]
pub(crate) struct GitHubUser {
    login: String,
    name: Option<String>,
    email: Option<String>,
}

/// GitHub `/user/emails` entry.
#[derive(Debug, Deserialize)]
pub(crate) struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

pub(crate) fn github_profile(user: GitHubUser, mut emails: Vec<GitHubEmail>) -> ExternalProfile {
    // Primary first, unverified addresses never count.
    emails.retain(|e| e.verified);
    emails.sort_by_key(|e| !e.primary);

    let mut candidates: Vec<String> = user.email.into_iter().collect();
    for e in emails {
        if !candidates.contains(&e.email) {
            candidates.push(e.email);
        }
    }

    ExternalProfile {
        display_name: user.name.filter(|n| !n.trim().is_empty()).unwrap_or(user.login),
        emails: candidates,
    }
}

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// What the session keeps between the redirect out and the callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub provider: Provider,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

pub struct OAuthClient {
    provider: Provider,
    client: ConfiguredClient,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(
        provider: Provider,
        creds: &OAuthProviderConfig,
        base_url: &str,
        http: reqwest::Client,
    ) -> anyhow::Result<Self> {
        let client = BasicClient::new(ClientId::new(creds.client_id.clone()))
            .set_client_secret(ClientSecret::new(creds.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(provider.auth_url().to_string())?)
            .set_token_uri(TokenUrl::new(provider.token_url().to_string())?)
            .set_redirect_uri(RedirectUrl::new(format!(
                "{}{}",
                base_url,
                provider.callback_path()
            ))?);
        Ok(Self {
            provider,
            client,
            http,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Authorization URL plus the state to park in the session.
    pub fn authorize_url(&self) -> (String, PendingAuthorization) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let mut request = self.client.authorize_url(CsrfToken::new_random);
        for scope in self.provider.scopes() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (url, csrf_state) = request.set_pkce_challenge(pkce_challenge).url();

        let pending = PendingAuthorization {
            provider: self.provider,
            csrf_state: csrf_state.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        };
        (url.to_string(), pending)
    }

    /// Trade the authorization code for a token and read the profile with it.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: String,
    ) -> Result<ExternalProfile, AppError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&self.http)
            .await
            .map_err(|e| AppError::OAuth(format!("token exchange failed: {e}")))?;
        let access_token = token.access_token().secret();
        debug!(provider = %self.provider, "oauth token obtained");

        match self.provider {
            Provider::Google => {
                let info: GoogleUserInfo = self
                    .get_json("https://www.googleapis.com/oauth2/v2/userinfo", access_token)
                    .await?;
                Ok(info.into())
            }
            Provider::Github => {
                let user: GitHubUser = self
                    .get_json("https://api.github.com/user", access_token)
                    .await?;
                let emails: Vec<GitHubEmail> = self
                    .get_json("https://api.github.com/user/emails", access_token)
                    .await?;
                Ok(github_profile(user, emails))
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        self.http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AppError::OAuth(format!("{} profile request failed: {e}", self.provider)))?
            .json()
            .await
            .map_err(|e| AppError::OAuth(format!("{} profile unreadable: {e}", self.provider)))
    }
}

/// The enabled providers.
#[derive(Default)]
pub struct OAuthClients {
    google: Option<OAuthClient>,
    github: Option<OAuthClient>,
}

impl OAuthClients {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let build = |provider: Provider, creds: Option<&OAuthProviderConfig>| {
            creds
                .map(|c| OAuthClient::new(provider, c, &config.base_url, http.clone()))
                .transpose()
        };

        Ok(Self {
            google: build(Provider::Google, config.google.as_ref())?,
            github: build(Provider::Github, config.github.as_ref())?,
        })
    }

    pub fn get(&self, provider: Provider) -> Option<&OAuthClient> {
        match provider {
            Provider::Google => self.google.as_ref(),
            Provider::Github => self.github.as_ref(),
        }
    }
}
