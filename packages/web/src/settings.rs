//! Application Settings
//!
//! Defaults overlaid by an optional `config.toml` and `ONEBASE_*`
//! environment variables (double-underscore section separator, e.g.
//! `ONEBASE_AUTH__ADMIN_PASSWORD`).

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Database {
    /// Directory of the embedded document store.
    pub path: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            path: "./data/onebase.db".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    /// Password for the bootstrapped administrator account.
    pub admin_password: String,

    /// Development convenience: requests without a session user are silently
    /// logged in as this email. Never set this outside development.
    pub persist_user: Option<String>,

    /// Mark session cookies Secure (requires HTTPS).
    pub secure_cookies: bool,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            admin_password: "admin".into(),
            persist_user: None,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub auth: Auth,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "./data/onebase.db")?
            .set_default("auth.admin_password", "admin")?
            .set_default("auth.secure_cookies", false)?
            .add_source(
                File::with_name("config.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix("ONEBASE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::new().unwrap_or_default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.auth.admin_password, "admin");
        assert!(settings.auth.persist_user.is_none());
        assert!(!settings.auth.secure_cookies);
    }
}
