//! Client configuration.

use std::env;
use std::path::PathBuf;

/// Netpulse host serving The Gym Group mobile app.
pub const DEFAULT_BASE_URL: &str = "https://thegymgroup.netpulse.com/np/";

pub const DEFAULT_STATE_FILE: &str = "state.json";

/// Everything `GymClient` needs to know before it talks to the API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub state_file: PathBuf,
    pub username: String,
    pub password: String,
}

impl ClientConfig {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Endpoint paths are joined onto the base URL, so it always ends in `/`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let mut base_url = base_url.trim_end_matches('/').to_string();
        base_url.push('/');
        self.base_url = base_url;
        self
    }

    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = path.into();
        self
    }

    /// Reads `GYMGROUP_USERNAME`, `GYMGROUP_PASSWORD` and the optional
    /// `GYMGROUP_BASE_URL` / `GYMGROUP_STATE_FILE` overrides.
    ///
    /// Missing credentials are left empty; `GymClient::login` reports them.
    pub fn from_env() -> Self {
        let username = env::var("GYMGROUP_USERNAME").unwrap_or_default();
        let password = env::var("GYMGROUP_PASSWORD").unwrap_or_default();
        let mut config = Self::new(&username, &password);
        if let Ok(base_url) = env::var("GYMGROUP_BASE_URL") {
            config = config.with_base_url(&base_url);
        }
        if let Ok(state_file) = env::var("GYMGROUP_STATE_FILE") {
            config = config.with_state_file(state_file);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_vendor() {
        let config = ClientConfig::new("user", "pass");
        assert_eq!(config.base_url, "https://thegymgroup.netpulse.com/np/");
        assert_eq!(config.state_file, PathBuf::from("state.json"));
        assert_eq!(config.username, "user");
        assert_eq!(config.password, "pass");
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = ClientConfig::new("u", "p").with_base_url("http://localhost:3000/np");
        assert_eq!(config.base_url, "http://localhost:3000/np/");
    }

    #[test]
    fn repeated_trailing_slashes_collapse() {
        let config = ClientConfig::new("u", "p").with_base_url("http://localhost:3000//");
        assert_eq!(config.base_url, "http://localhost:3000/");
    }
}
