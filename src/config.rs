//! Runtime configuration resolved from the environment.
//!
//! The only secret is the subgraph API key, read from `GRAPHQL_SECRET` at
//! startup. Resolution fails before any network call is made, and the key
//! is held behind [`SecretString`] so it never appears in Debug output or
//! logs. The endpoint URL embeds the key, so it must be treated as a
//! secret itself.

use secrecy::{ExposeSecret, SecretString};

use crate::types::ExportError;

/// Name of the environment variable holding the subgraph API key.
pub const GRAPHQL_SECRET_ENV: &str = "GRAPHQL_SECRET";

/// Satsuma deployment path of the pool subgraph.
const SUBGRAPH_DEPLOYMENT: &str = "metastreet-labs--232864/v2-pools-mainnet";

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    secret: SecretString,
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ExportError> {
        Self::from_secret(std::env::var(GRAPHQL_SECRET_ENV).ok())
    }

    /// Build a configuration from an already-read secret value.
    ///
    /// Rejects missing and blank values; a blank key would produce a
    /// syntactically valid URL that can only ever return 401.
    pub fn from_secret(secret: Option<String>) -> Result<Self, ExportError> {
        match secret {
            Some(s) if !s.trim().is_empty() => Ok(Self {
                secret: SecretString::new(s),
            }),
            Some(_) => Err(ExportError::Config(format!(
                "{GRAPHQL_SECRET_ENV} is set but empty"
            ))),
            None => Err(ExportError::Config(format!(
                "{GRAPHQL_SECRET_ENV} is not set"
            ))),
        }
    }

    /// The full subgraph endpoint URL with the API key interpolated.
    ///
    /// Contains the secret; do not log the returned value.
    pub fn endpoint(&self) -> String {
        format!(
            "https://subgraph.satsuma-prod.com/{}/{}/api",
            self.secret.expose_secret(),
            SUBGRAPH_DEPLOYMENT
        )
    }

    /// The deployment path, safe to log.
    pub fn deployment(&self) -> &'static str {
        SUBGRAPH_DEPLOYMENT
    }
}
