//! Configuration module
//!
//! Resolves API credentials from command-line options with environment
//! variable fallback.

mod env;

pub use env::{EnvBuilder, EnvConfig, EnvGuard};

use serde_json::Value;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("url-base argument cannot be empty")]
    MissingUrlBase,

    #[error("--token option is required")]
    MissingToken,

    #[error("--organization option is required")]
    MissingOrganization,

    #[error("--project option is required")]
    MissingProject,

    #[error("--http-headers must be a JSON object of string values: {0}")]
    InvalidHttpHeaders(String),
}

/// Resolved API connection settings
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// API base URL without the /api/v1.0 suffix
    pub url_base: String,
    /// API token sent as `Authorization: Token <token>`
    pub token: String,
    /// Organization name (not the display name)
    pub organization: String,
    /// Project name (not the display name)
    pub project: String,
    /// Extra headers attached to every request
    pub http_headers: Vec<(String, String)>,
}

impl ApiConfig {
    /// Resolve connection settings from CLI options and the environment.
    ///
    /// CLI options win over environment variables; a value missing from
    /// both fails fast before any network call.
    pub fn resolve(
        url_base: &str,
        token: Option<&str>,
        organization: Option<&str>,
        project: Option<&str>,
        http_headers: Option<&str>,
        env: &EnvConfig,
    ) -> Result<Self, ConfigError> {
        if url_base.is_empty() {
            return Err(ConfigError::MissingUrlBase);
        }
        // An explicit --url-base beats the environment; the baked-in
        // default does not.
        let url_base = env
            .url_base
            .clone()
            .filter(|_| url_base == crate::cli::DEFAULT_URL_BASE)
            .unwrap_or_else(|| url_base.to_string());

        let token = pick(token, &env.api_token).ok_or(ConfigError::MissingToken)?;
        let organization =
            pick(organization, &env.organization).ok_or(ConfigError::MissingOrganization)?;
        let project = pick(project, &env.project).ok_or(ConfigError::MissingProject)?;
        let http_headers = match http_headers {
            Some(raw) if !raw.is_empty() => parse_http_headers(raw)?,
            _ => Vec::new(),
        };

        Ok(Self {
            url_base,
            token,
            organization,
            project,
            http_headers,
        })
    }
}

fn pick(cli: Option<&str>, env: &Option<String>) -> Option<String> {
    match cli {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => env.clone().filter(|v| !v.is_empty()),
    }
}

/// Parse the `--http-headers` option, a flat JSON object of strings.
fn parse_http_headers(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ConfigError::InvalidHttpHeaders(e.to_string()))?;
    let map = value
        .as_object()
        .ok_or_else(|| ConfigError::InvalidHttpHeaders("not a JSON object".to_string()))?;

    let mut headers = Vec::with_capacity(map.len());
    for (key, value) in map {
        let value = value
            .as_str()
            .ok_or_else(|| ConfigError::InvalidHttpHeaders(format!("value of {key:?} is not a string")))?;
        headers.push((key.clone(), value.to_string()));
    }
    Ok(headers)
}
