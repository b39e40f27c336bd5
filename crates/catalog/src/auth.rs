//! OAuth authorization-code flow against the accounts service.
//!
//! Sessions hold a `TokenSet`; `ensure_valid_client` turns one into a
//! usable `SpotifyClient`, refreshing the access token once when it has
//! expired and clearing the tokens when the grant is gone for good.

use serde::{Deserialize, Serialize};
use setlist_core::CatalogApi;
use setlist_core::error::CatalogError;
use tracing::{info, warn};

use crate::client::SpotifyClient;

const AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// OAuth client settings for the authorization-code flow.
#[derive(Clone)]
pub struct SpotifyAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for SpotifyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyAuth")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .finish()
    }
}

impl SpotifyAuth {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scope: scope.into(),
            client,
        }
    }

    /// The URL the user's browser is sent to for consent.
    pub fn authorize_url(&self, state: Option<&str>) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scope)
            .append_pair("show_dialog", "false");
        if let Some(state) = state {
            query.append_pair("state", state);
        }
        format!("{AUTH_URL}?{}", query.finish())
    }

    /// Exchange an authorization code for a token set.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, CatalogError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            warn!(status, "Token exchange failed");
            return Err(CatalogError::Token(format!(
                "token exchange failed (status={status})"
            )));
        }

        let wire: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Network(format!("Failed to parse token response: {e}")))?;

        Ok(TokenSet::from_response(wire, None))
    }

    /// Trade a refresh token for a fresh access token.
    ///
    /// The token endpoint refusing the grant is a `Token` error; transport
    /// failures stay `Network`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, CatalogError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status, "Failed to refresh catalog token");
            return Err(CatalogError::Token(format!(
                "refresh failed (status={status})"
            )));
        }

        let wire: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Network(format!("Failed to parse token response: {e}")))?;

        Ok(TokenSet::from_response(wire, Some(refresh_token)))
    }
}

/// An access/refresh token pair held by a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenSet {
    /// A token response missing a refresh token keeps the previous one;
    /// the provider only reissues refresh tokens sometimes.
    fn from_response(wire: TokenResponse, previous_refresh: Option<&str>) -> Self {
        Self {
            access_token: wire.access_token,
            refresh_token: wire
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
        }
    }
}

/// Build a usable catalog client from a session's tokens.
///
/// Probes `current_user` once; on a 401 the access token is refreshed and
/// the probe retried. A dead grant clears `tokens` and yields `Ok(None)`.
/// Any non-401 catalog error propagates to the caller.
pub async fn ensure_valid_client(
    auth: &SpotifyAuth,
    tokens: &mut Option<TokenSet>,
) -> Result<Option<SpotifyClient>, CatalogError> {
    let Some(current) = tokens.clone() else {
        return Ok(None);
    };

    let client = SpotifyClient::new(&current.access_token);
    match client.current_user().await {
        Ok(_) => return Ok(Some(client)),
        Err(CatalogError::Api { status: 401, .. }) => {}
        Err(other) => return Err(other),
    }

    info!("Catalog token expired, attempting refresh");

    let Some(refresh_token) = current.refresh_token.as_deref() else {
        *tokens = None;
        return Ok(None);
    };

    let refreshed = match auth.refresh(refresh_token).await {
        Ok(set) => set,
        Err(CatalogError::Token(_)) => {
            *tokens = None;
            return Ok(None);
        }
        Err(other) => return Err(other),
    };

    let client = SpotifyClient::new(&refreshed.access_token);
    *tokens = Some(refreshed);

    match client.current_user().await {
        Ok(_) => Ok(Some(client)),
        Err(CatalogError::Api { .. }) => {
            *tokens = None;
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

// --- Token endpoint wire types (internal) ---

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}
