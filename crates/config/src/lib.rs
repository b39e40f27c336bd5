//! Configuration loading and validation for Setlist.
//!
//! All settings come from environment variables. Required credentials are
//! collected together so a misconfigured deployment reports every missing
//! variable at once instead of one per restart.

use std::fmt;

/// The root configuration structure.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Spotify application credentials and OAuth settings
    pub spotify: SpotifySettings,

    /// Model endpoint credentials and selection
    pub openai: OpenAiSettings,

    /// HTTP server bind settings
    pub server: ServerSettings,

    /// Agent loop settings
    pub agent: AgentSettings,
}

/// Spotify application credentials and OAuth settings.
#[derive(Clone)]
pub struct SpotifySettings {
    /// Spotify application client id
    pub client_id: String,

    /// Spotify application client secret
    pub client_secret: String,

    /// Public base URL the OAuth redirect returns to, without the
    /// `/callback` path
    pub redirect_base: String,

    /// OAuth scopes requested during authorization
    pub scope: String,
}

impl SpotifySettings {
    /// The full redirect URI registered with Spotify.
    pub fn redirect_uri(&self) -> String {
        format!("{}/callback", self.redirect_base.trim_end_matches('/'))
    }
}

/// Model endpoint credentials and selection.
#[derive(Clone)]
pub struct OpenAiSettings {
    /// API key for the model endpoint
    pub api_key: String,

    /// Model name sent with every request
    pub model: String,

    /// Base URL of the Responses API
    pub base_url: String,
}

/// HTTP server bind settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Agent loop settings.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Maximum model turns per run before forced termination
    pub max_turns: u32,
}

fn default_redirect_base() -> String {
    "http://127.0.0.1:3000".into()
}
fn default_scope() -> String {
    "playlist-modify-public playlist-modify-private".into()
}
fn default_model() -> String {
    "gpt-5-mini".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    3000
}
fn default_max_turns() -> u32 {
    25
}

impl fmt::Debug for SpotifySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifySettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_base", &self.redirect_base)
            .field("scope", &self.scope)
            .finish()
    }
}

impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Exposed so tests can supply an environment without mutating the
    /// process-wide one.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Blank values count as unset, for both required and optional
        // variables.
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut missing: Vec<&'static str> = Vec::new();
        let client_id = get("SPOTIFY_CLIENT_ID").unwrap_or_default();
        if client_id.is_empty() {
            missing.push("SPOTIFY_CLIENT_ID");
        }
        let client_secret = get("SPOTIFY_CLIENT_SECRET").unwrap_or_default();
        if client_secret.is_empty() {
            missing.push("SPOTIFY_CLIENT_SECRET");
        }
        let api_key = get("OPENAI_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            missing.push("OPENAI_API_KEY");
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing.join(", ")));
        }

        let port = match get("SETLIST_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "SETLIST_PORT".into(),
                reason: format!("not a valid port: {raw}"),
            })?,
            None => default_port(),
        };

        let max_turns = match get("SETLIST_MAX_TURNS") {
            Some(raw) => raw.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                name: "SETLIST_MAX_TURNS".into(),
                reason: format!("not a valid turn count: {raw}"),
            })?,
            None => default_max_turns(),
        };

        let config = Self {
            spotify: SpotifySettings {
                client_id,
                client_secret,
                redirect_base: get("SPOTIFY_REDIRECT_URI")
                    .unwrap_or_else(default_redirect_base),
                scope: default_scope(),
            },
            openai: OpenAiSettings {
                api_key,
                model: get("OPENAI_MODEL").unwrap_or_else(default_model),
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(default_openai_base_url),
            },
            server: ServerSettings {
                host: get("SETLIST_HOST").unwrap_or_else(default_host),
                port,
            },
            agent: AgentSettings { max_turns },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "SETLIST_MAX_TURNS must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {0}")]
    MissingVariables(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
