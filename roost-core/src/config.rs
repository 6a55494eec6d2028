use std::path::PathBuf;

use crate::error::RoostResult;

fn default_listen_on() -> std::net::SocketAddr {
    std::net::SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_session_cookie() -> String {
    "_roost_session".to_string()
}

fn default_flash_cookie() -> String {
    "roost_flash".to_string()
}

fn default_key_directory() -> PathBuf {
    PathBuf::from("./keys")
}

fn default_session_ttl_hours() -> i64 {
    72
}

fn default_page_size() -> u8 {
    25
}

/// Server configuration, read from `ROOST_`-prefixed environment variables.
#[derive(serde::Deserialize, serde::Serialize, Clone, securefmt::Debug)]
pub struct Configuration {
    /// Root URL of the platform API, e.g. `https://api.example.com/`
    pub api_url: url::Url,
    #[serde(default = "default_listen_on")]
    pub listen_on: std::net::SocketAddr,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_flash_cookie")]
    pub flash_cookie: String,
    /// Directory holding `session.key`; generate with `roost gen-keys`
    #[serde(default = "default_key_directory")]
    pub key_directory: PathBuf,
    #[serde(alias = "HTTP_PROXY", alias = "HTTPS_PROXY", alias = "SOCKS_PROXY")]
    #[sensitive]
    pub proxy: Option<url::Url>,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_page_size")]
    pub page_size: u8,
}

impl Configuration {
    pub fn from_env() -> RoostResult<Self> {
        Ok(envy::prefixed("ROOST_").from_env()?)
    }

    pub fn session_key_path(&self) -> PathBuf {
        self.key_directory.join("session.key")
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn minimal_environment_fills_defaults() {
        let config: Configuration = envy::prefixed("ROOST_")
            .from_iter(vec![(
                "ROOST_API_URL".to_string(),
                "https://api.example.com/".to_string(),
            )])
            .unwrap();
        assert_eq!(config.listen_on, default_listen_on());
        assert_eq!(config.session_cookie, "_roost_session");
        assert_eq!(config.session_ttl_hours, 72);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.session_key_path(), PathBuf::from("./keys/session.key"));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let config: Configuration = envy::prefixed("ROOST_")
            .from_iter(vec![
                (
                    "ROOST_API_URL".to_string(),
                    "https://api.example.com/".to_string(),
                ),
                ("ROOST_LISTEN_ON".to_string(), "0.0.0.0:9000".to_string()),
                ("ROOST_PAGE_SIZE".to_string(), "10".to_string()),
            ])
            .unwrap();
        assert_eq!(config.listen_on.port(), 9000);
        assert_eq!(config.page_size, 10);
    }
}
