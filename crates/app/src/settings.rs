//! Handles settings for the application.
//!
//! Configuration is read from `settings.toml` in the working directory (if
//! present) and then from `CHARITY_FUND__*` environment variables, e.g.
//! `CHARITY_FUND__SERVER__PORT=8080`. See `settings.example.toml`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Credentials of the administrator created (or promoted) at startup.
#[derive(Debug, Deserialize)]
pub struct FirstSuperuser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    pub first_superuser: Option<FirstSuperuser>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(Environment::with_prefix("CHARITY_FUND").separator("__"))
                .build()?,
        )
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Settings::from_config(
            Config::builder()
                .add_source(File::from_str(toml, FileFormat::Toml))
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn full_settings() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            bind = "0.0.0.0"
            port = 8080
            database = { sqlite = "fund.db" }

            [first_superuser]
            username = "root"
            password = "toor"
            "#,
        );

        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert_eq!(server.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.port, 8080);
        assert_eq!(server.database, Database::Sqlite("fund.db".to_string()));
        assert_eq!(settings.first_superuser.unwrap().username, "root");
    }

    #[test]
    fn defaults_and_memory_database() {
        let settings = parse(
            r#"
            [server]
            port = 3000
            database = "memory"
            "#,
        );

        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.unwrap().database, Database::Memory);
        assert!(settings.first_superuser.is_none());
    }
}
