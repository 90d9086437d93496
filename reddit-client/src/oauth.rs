use crate::token_store::TokenStore;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use threadlens_core::{CoreError, RedditApiError};
use tracing::{debug, info, warn};
use url::Url;

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Fallback lifetime when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct RedditOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub user_agent: String,
}

impl RedditOAuthConfig {
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        user_agent: String,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            user_agent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

/// The three states of the authorization-code flow. The redirect suspension
/// point is explicit: `RedirectPending` means the browser has been sent to
/// Reddit and the run resumes on the callback.
#[derive(Debug)]
pub enum AuthState {
    NoToken,
    RedirectPending { csrf: CsrfToken },
    Authenticated { token: RedditToken },
}

/// Explicit OAuth session: created at startup (load-if-present), updated on a
/// successful code exchange, read on every fetch. Token refresh is out of
/// scope; an expired token simply drops back to `NoToken` behavior.
pub struct RedditSession {
    oauth: BasicClient,
    store: TokenStore,
    state: AuthState,
}

impl RedditSession {
    pub fn new(config: &RedditOAuthConfig, store: TokenStore) -> Result<Self, CoreError> {
        let oauth = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| CoreError::Internal {
                message: format!("invalid authorize URL: {e}"),
            })?,
            Some(
                TokenUrl::new(REDDIT_TOKEN_URL.to_string()).map_err(|e| CoreError::Internal {
                    message: format!("invalid token URL: {e}"),
                })?,
            ),
        )
        .set_redirect_uri(RedirectUrl::new(config.redirect_uri.clone()).map_err(|e| {
            CoreError::Internal {
                message: format!("invalid redirect URI: {e}"),
            }
        })?);

        let state = match store.load()? {
            Some(token) if !token.is_expired() => {
                info!("Loaded persisted Reddit token");
                AuthState::Authenticated { token }
            }
            Some(_) => {
                warn!("Persisted Reddit token has expired, re-authorization required");
                AuthState::NoToken
            }
            None => AuthState::NoToken,
        };

        Ok(Self {
            oauth,
            store,
            state,
        })
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(&self.state, AuthState::Authenticated { token } if !token.is_expired())
    }

    /// The access token for API calls; fails when no valid token is held.
    pub fn access_token(&self) -> Result<&str, CoreError> {
        match &self.state {
            AuthState::Authenticated { token } if !token.is_expired() => {
                Ok(token.access_token.as_str())
            }
            _ => Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "Not authenticated".to_string(),
            })),
        }
    }

    /// Builds the Reddit authorize URL and suspends the flow: the caller is
    /// expected to redirect the browser there and resume on the callback.
    pub fn begin_authorization(&mut self) -> String {
        let (authorize_url, csrf) = self
            .oauth
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("read".to_string()))
            .add_extra_param("duration", "permanent")
            .url();

        debug!("Generated Reddit authorization URL");
        self.state = AuthState::RedirectPending { csrf };
        authorize_url.to_string()
    }

    /// Completes the flow from the redirect callback URL: validates the CSRF
    /// state, exchanges the code (Basic client auth, authorization_code
    /// grant), persists the token and moves to `Authenticated`.
    pub async fn complete_authorization(&mut self, callback_url: &str) -> Result<(), CoreError> {
        let csrf = match &self.state {
            AuthState::RedirectPending { csrf } => csrf.secret().clone(),
            _ => {
                return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: "No authorization in progress".to_string(),
                }))
            }
        };

        let url = Url::parse(callback_url).map_err(|_| {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "Invalid callback URL".to_string(),
            })
        })?;

        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => {
                    return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                        reason: value.into_owned(),
                    }))
                }
                _ => {}
            }
        }

        match state {
            Some(state) if state == csrf => {}
            Some(_) => {
                return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: "CSRF token mismatch".to_string(),
                }))
            }
            None => {
                return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: "Missing state parameter".to_string(),
                }))
            }
        }

        let code = code.ok_or_else(|| {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "Missing authorization code".to_string(),
            })
        })?;

        info!("Exchanging authorization code for access token");
        let response = self
            .oauth
            .exchange_code(AuthorizationCode::new(code))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| {
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: format!("Token exchange failed: {e}"),
                })
            })?;

        let token = RedditToken {
            access_token: response.access_token().secret().clone(),
            refresh_token: response.refresh_token().map(|t| t.secret().clone()),
            expires_at: SystemTime::now()
                + response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME),
            scope: response
                .scopes()
                .map(|scopes| scopes.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        };

        self.store.save(&token)?;
        info!("Reddit authentication completed");
        self.state = AuthState::Authenticated { token };
        Ok(())
    }

    /// Used when Reddit rejects the token mid-run; the next analyze action
    /// restarts the redirect flow.
    pub fn invalidate(&mut self) {
        warn!("Invalidating Reddit session");
        self.state = AuthState::NoToken;
    }

    #[cfg(test)]
    pub(crate) fn set_token(&mut self, token: RedditToken) {
        self.state = AuthState::Authenticated { token };
    }
}
