//! Configuration loading: TOML file, environment variables, then CLI flags.
//!
//! Looks for `relayhub.toml` in the working directory unless `--config`
//! names another file. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values and
//! command-line flags take precedence over both.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "relayhub.toml";

/// Command-line flags.
#[derive(Debug, Default, Parser)]
#[command(name = "relayhubd")]
#[command(about = "Relay hub between IoT devices and browser UIs")]
#[command(version)]
pub struct Cli {
    /// Listen address, `host:port` or `:port`.
    #[arg(long, value_name = "ADDR")]
    pub addr: Option<String>,

    /// Directory holding the built UI bundle.
    #[arg(long = "static", value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// UI bundle settings.
    pub static_files: StaticFilesConfig,
    /// Connection hub settings.
    pub hub: HubConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Static UI bundle configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory containing `index.html` and the built assets.
    pub dir: PathBuf,
    /// URL prefix of the asset directory.
    pub mount: String,
}

/// Connection hub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Unwritten frames per connection before the peer is disconnected.
    pub max_backlog: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from the file named by `cli` (or
    /// `relayhub.toml` if present), apply environment-variable overrides,
    /// then the command-line flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed, if an explicitly given
    /// file cannot be read, or if the result fails validation.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::read(path)?,
            None => Self::from_file(DEFAULT_CONFIG_PATH)?,
        };
        config.apply_env_overrides();
        config.apply_cli(cli)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(ConfigError::Parse)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match Self::read(Path::new(path)) {
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("RELAYHUB_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("RELAYHUB_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Some(val) = var("RELAYHUB_BIND")
            && let Some((host, port)) = split_addr(&val)
        {
            self.server.host = host;
            self.server.port = port;
        }
        if let Some(val) = var("RELAYHUB_STATIC_DIR") {
            self.static_files.dir = PathBuf::from(val);
        }
        if let Some(val) = var("RELAYHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn apply_cli(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if let Some(addr) = &cli.addr {
            let (host, port) = split_addr(addr)
                .ok_or_else(|| ConfigError::Validation(format!("invalid listen address {addr:?}")))?;
            self.server.host = host;
            self.server.port = port;
        }
        if let Some(dir) = &cli.static_dir {
            self.static_files.dir.clone_from(dir);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.hub.max_backlog == 0 {
            return Err(ConfigError::Validation(
                "max backlog must be non-zero".to_string(),
            ));
        }
        if !self.static_files.mount.starts_with('/') || self.static_files.mount == "/" {
            return Err(ConfigError::Validation(format!(
                "static mount must be a non-root path starting with '/', got {:?}",
                self.static_files.mount
            )));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Split `host:port`; an empty host (`:8080`) means all interfaces.
fn split_addr(addr: &str) -> Option<(String, u16)> {
    let (host, port) = addr.rsplit_once(':')?;
    let port = port.parse().ok()?;
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Some((host.to_string(), port))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("client/dist"),
            mount: "/static".to_string(),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self { max_backlog: 4096 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "relayhubd=info,relayhub=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 80);
        assert_eq!(config.static_files.dir, PathBuf::from("client/dist"));
        assert_eq!(config.static_files.mount, "/static");
        assert_eq!(config.hub.max_backlog, 4096);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 80);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [static_files]
            dir = 'ui/build'
            mount = '/assets'

            [hub]
            max_backlog = 8

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.static_files.dir, PathBuf::from("ui/build"));
        assert_eq!(config.static_files.mount, "/assets");
        assert_eq!(config.hub.max_backlog, 8);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 80);
    }

    #[test]
    fn should_fail_when_explicit_file_missing() {
        let cli = Cli {
            config: Some(PathBuf::from("nonexistent-relayhub.toml")),
            ..Cli::default()
        };
        assert!(matches!(Config::load(&cli), Err(ConfigError::Io(_))));
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_max_backlog() {
        let mut config = Config::default();
        config.hub.max_backlog = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_root_static_mount() {
        let mut config = Config::default();
        config.static_files.mount = "/".to_string();
        assert!(config.validate().is_err());
        config.static_files.mount = "static".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_format_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("RELAYHUB_BIND", "127.0.0.1:8081"),
            ("RELAYHUB_STATIC_DIR", "/srv/ui"),
            ("RELAYHUB_LOG", "warn"),
        ]));
        assert_eq!(config.bind_addr(), "127.0.0.1:8081");
        assert_eq!(config.static_files.dir, PathBuf::from("/srv/ui"));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_prefer_rust_log_over_relayhub_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("RELAYHUB_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparseable_env_port() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("RELAYHUB_PORT", "eighty")]));
        assert_eq!(config.server.port, 80);
    }

    #[test]
    fn should_let_cli_flags_win_over_env() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("RELAYHUB_BIND", "127.0.0.1:8081")]));
        let cli = Cli::parse_from(["relayhubd", "--addr", ":9000", "--static", "dist"]);

        config.apply_cli(&cli).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.static_files.dir, PathBuf::from("dist"));
    }

    #[test]
    fn should_reject_invalid_cli_addr() {
        let mut config = Config::default();
        let cli = Cli::parse_from(["relayhubd", "--addr", "localhost"]);
        assert!(matches!(
            config.apply_cli(&cli),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
