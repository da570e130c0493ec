//! Environment variable configuration
//!
//! Provides environment variable defaults for API credentials.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "TESTLAB";

/// Credential defaults read from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// API token from TESTLAB_API_TOKEN
    pub api_token: Option<String>,
    /// Organization name from TESTLAB_ORGANIZATION
    pub organization: Option<String>,
    /// Project name from TESTLAB_PROJECT
    pub project: Option<String>,
    /// API base URL from TESTLAB_URL_BASE
    pub url_base: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            api_token: get_env("API_TOKEN"),
            organization: get_env("ORGANIZATION"),
            project: get_env("PROJECT"),
            url_base: get_env("URL_BASE"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.api_token.is_some()
            || self.organization.is_some()
            || self.project.is_some()
            || self.url_base.is_some()
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set API token
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_API_TOKEN"), token.into()));
        self
    }

    /// Set organization name
    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_ORGANIZATION"), organization.into()));
        self
    }

    /// Set project name
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_PROJECT"), project.into()));
        self
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        for (key, value) in self.vars {
            env::set_var(key, value);
        }

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_config_default_is_empty() {
        let config = EnvConfig::default();
        assert!(!config.has_any());
    }

    #[test]
    fn env_builder_scoped() {
        let _guard = EnvBuilder::new()
            .api_token("secret")
            .organization("acme")
            .project("mobile-app")
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.api_token, Some("secret".to_string()));
        assert_eq!(config.organization, Some("acme".to_string()));
        assert_eq!(config.project, Some("mobile-app".to_string()));
        assert!(config.has_any());
    }
}
