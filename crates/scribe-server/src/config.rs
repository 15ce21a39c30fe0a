use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::info;

/// Session secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "scribe-secret-key",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            read_timeout_secs: 60,
            write_timeout_secs: 60,
            static_dir: PathBuf::from("./public"),
        }
    }
}

/// SQLite only needs a file path.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("scribe.db"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub secret: String,
    pub secure_cookies: bool,
}

impl Config {
    /// Defaults, then the optional JSON file, then `SCRIBE_*` environment
    /// variables.
    pub fn load() -> Result<Self> {
        let path = std::env::var("SCRIBE_CONFIG").unwrap_or_else(|_| "scribe.json".into());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// A missing file is not an error; a broken one is.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SCRIBE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("SCRIBE_PORT") {
            self.server.port = v.parse().context("SCRIBE_PORT must be a port number")?;
        }
        if let Some(v) = lookup("SCRIBE_READ_TIMEOUT_SECS") {
            self.server.read_timeout_secs =
                v.parse().context("SCRIBE_READ_TIMEOUT_SECS must be whole seconds")?;
        }
        if let Some(v) = lookup("SCRIBE_WRITE_TIMEOUT_SECS") {
            self.server.write_timeout_secs =
                v.parse().context("SCRIBE_WRITE_TIMEOUT_SECS must be whole seconds")?;
        }
        if let Some(v) = lookup("SCRIBE_STATIC_DIR") {
            self.server.static_dir = v.into();
        }
        if let Some(v) = lookup("SCRIBE_DB_PATH") {
            self.database.path = v.into();
        }
        if let Some(v) = lookup("SCRIBE_SESSION_SECRET") {
            self.session.secret = v;
        }
        if let Some(v) = lookup("SCRIBE_COOKIE_SECURE") {
            self.session.secure_cookies = matches!(v.as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let secret = self.session.secret.trim();
        if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret) {
            bail!(
                "session secret is unset or still a placeholder; set SCRIBE_SESSION_SECRET \
                 (changing it later signs every user out)"
            );
        }
        if self.server.read_timeout_secs == 0 || self.server.write_timeout_secs == 0 {
            bail!("timeouts must be at least one second");
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.server.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.server.write_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    /// Write `contents` to `scribe.json` inside a fresh temporary directory.
    fn config_file(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scribe.json");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.read_timeout_secs, 60);
        assert_eq!(config.database.path, PathBuf::from("scribe.db"));
        assert!(config.session.secret.is_empty());
    }

    #[test]
    fn file_values_fill_in_over_defaults() {
        let (_dir, path) = config_file(
            r#"{ "server": { "port": 9000 }, "database": { "path": "/var/lib/scribe/blog.db" } }"#,
        );
        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.write_timeout_secs, 60);
        assert_eq!(config.database.path, PathBuf::from("/var/lib/scribe/blog.db"));
    }

    #[test]
    fn unknown_database_fields_are_rejected() {
        let (_dir, path) = config_file(r#"{ "database": { "host": "localhost", "port": 3306 } }"#);

        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn broken_file_is_an_error() {
        let (_dir, path) = config_file("{ not json");

        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("SCRIBE_PORT", "3000"),
                ("SCRIBE_DB_PATH", "/tmp/x.db"),
                ("SCRIBE_SESSION_SECRET", "s3cret-from-env"),
                ("SCRIBE_COOKIE_SECURE", "true"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.session.secret, "s3cret-from-env");
        assert!(config.session.secure_cookies);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("SCRIBE_PORT", "eighty")])).is_err());
    }

    #[test]
    fn placeholder_secret_is_refused() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.session.secret = "dev-secret-change-me".into();
        assert!(config.validate().is_err());

        config.session.secret = "a-real-secret".into();
        assert!(config.validate().is_ok());
    }
}
