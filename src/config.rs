// src/config.rs
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    pub secret_key: String,
    #[serde(default = "default_trial_limit")]
    pub trial_limit: i64,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Payment link encoded into generated QR codes; `{username}` is substituted.
    #[serde(default = "default_subscribe_url")]
    pub subscribe_url: String,
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

fn default_database_url() -> String {
    "sqlite://users.db".to_string()
}

fn default_trial_limit() -> i64 {
    5
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_subscribe_url() -> String {
    "https://example.com/subscribe?user={username}".to_string()
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Directory holding generated and uploaded payment QR images.
    pub fn qr_dir(&self) -> PathBuf {
        self.static_dir.join("qr")
    }

    pub fn subscribe_link(&self, username: &str) -> String {
        self.subscribe_url
            .replace("{username}", &urlencoding::encode(username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        envy::from_iter(vec![("SECRET_KEY".to_string(), "s3cret".to_string())])
            .expect("config from iter")
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = base();
        assert_eq!(config.trial_limit, 5);
        assert_eq!(config.database_url, "sqlite://users.db");
        assert_eq!(config.admin_username, "admin");
        assert_eq!(config.qr_dir(), PathBuf::from("static").join("qr"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn overrides_are_read() {
        let config: Config = envy::from_iter(vec![
            ("SECRET_KEY".to_string(), "k".to_string()),
            ("TRIAL_LIMIT".to_string(), "2".to_string()),
            ("UPLOAD_DIR".to_string(), "/tmp/up".to_string()),
        ])
        .expect("config from iter");
        assert_eq!(config.trial_limit, 2);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/up"));
    }

    #[test]
    fn subscribe_link_encodes_username() {
        let config = base();
        assert_eq!(
            config.subscribe_link("ram shyam"),
            "https://example.com/subscribe?user=ram%20shyam"
        );
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result: Result<Config, _> = envy::from_iter(Vec::<(String, String)>::new());
        assert!(result.is_err());
    }
}
