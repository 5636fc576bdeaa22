use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths::resolve_home_dir;

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Core server configuration.
    pub server: ServerConfig,
    /// Database configuration (optional).
    pub database: Option<DatabaseConfig>,
    /// Session credential settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Directory containing per-module YAML files (optional).
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub home_dir: String, // normalized to an absolute path on load
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub timeout_sec: u64,
    #[serde(default)]
    pub environment: Environment,
}

/// Deployment flavour. Production hides internal error detail from clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database connection URL (e.g., "sqlite://./db.sqlite", "sqlite::memory:").
    pub url: String,
    /// Maximum number of connections in the pool (optional, defaults to 10).
    pub max_conns: Option<u32>,
    /// SQLite busy timeout in milliseconds (optional, defaults to 5000).
    pub busy_timeout_ms: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthConfig {
    /// HMAC secret for session tokens. Required in production.
    pub jwt_secret: Option<String>,
    /// Lifetime of an issued session token.
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    pub file: String,          // "logs/api.log", empty disables the file sink
    #[serde(default)]
    pub file_level: String,
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Empty => $HOME/.internease
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            timeout_sec: 0,
            environment: Environment::Development,
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/internease.log".to_string(),
            file_level: "debug".to_string(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: Some(DatabaseConfig {
                url: "sqlite://database/internease.db".to_string(),
                max_conns: Some(10),
                busy_timeout_ms: Some(5000),
            }),
            auth: AuthConfig::default(),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Layered loading: defaults → YAML file → `APP__*` environment variables.
    /// Normalizes `server.home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let path = config_path.as_ref();
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }

        // Optional sections stay None unless YAML/ENV provide them.
        let base = AppConfig {
            server: ServerConfig::default(),
            database: None,
            auth: AuthConfig::default(),
            logging: None,
            modules_dir: None,
            modules: HashMap::new(),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(path))
            // APP__SERVER__PORT=8087 maps to server.port
            .merge(Env::prefixed("APP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .context("Failed to extract config from figment")?;

        normalize_home_dir_inplace(&mut config.server)
            .context("Failed to resolve server.home_dir")?;

        if let Some(dir) = config.modules_dir.clone() {
            merge_module_files(&mut config.modules, dir)?;
        }

        Ok(config)
    }

    /// Load configuration from file or fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_home_dir_inplace(&mut c.server)
                    .context("Failed to resolve server.home_dir (defaults)")?;
                Ok(c)
            }
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        if args.mock {
            let db = self.database.get_or_insert_with(|| DatabaseConfig {
                url: String::new(),
                max_conns: None,
                busy_timeout_ms: None,
            });
            db.url = "sqlite::memory:".to_string();
        }

        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            match args.verbose {
                0 => {}
                1 => default_section.console_level = "debug".to_string(),
                _ => default_section.console_level = "trace".to_string(),
            }
        }
    }

    /// Startup checks that cannot be expressed by serde alone.
    pub fn validate(&self) -> Result<()> {
        if self.server.environment.is_production() {
            match self.auth.jwt_secret.as_deref() {
                Some(s) if s.len() >= 32 => {}
                Some(_) => bail!("auth.jwt_secret must be at least 32 bytes in production"),
                None => bail!("auth.jwt_secret is required in production"),
            }
        }
        Ok(())
    }
}

/// Command line arguments structure.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
    pub mock: bool,
}

const DEFAULT_SUBDIR: &str = ".internease";

fn normalize_home_dir_inplace(server: &mut ServerConfig) -> Result<()> {
    let opt = if server.home_dir.trim().is_empty() {
        None
    } else {
        Some(server.home_dir.clone())
    };

    let resolved: PathBuf =
        resolve_home_dir(opt, DEFAULT_SUBDIR, true).context("home_dir normalization failed")?;

    server.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

fn merge_module_files(
    bag: &mut HashMap<String, serde_json::Value>,
    dir: impl AsRef<Path>,
) -> Result<()> {
    use std::fs;
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_yaml = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"))
            .unwrap_or(false);
        if !is_yaml {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
            continue;
        };
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read module config {}", path.display()))?;
        let val: serde_yaml::Value = serde_yaml::from_str(&raw)?;
        bag.insert(name, serde_json::to_value(val)?);
    }
    Ok(())
}

/// Read-only view over the per-module configuration bag.
#[derive(Debug, Clone)]
pub struct AppConfigProvider {
    config: AppConfig,
}

impl AppConfigProvider {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn app_config(&self) -> &AppConfig {
        &self.config
    }

    pub fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.config.modules.get(module_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_cfg(dir: &Path, body: &str) -> PathBuf {
        let p = dir.join("cfg.yaml");
        fs::write(&p, body).unwrap();
        p
    }

    fn home_line(dir: &Path) -> String {
        format!(
            "  home_dir: \"{}\"",
            dir.join("home").to_string_lossy().replace('\\', "/")
        )
    }

    #[test]
    fn default_config_structure() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.home_dir, "");
        assert_eq!(config.server.environment, Environment::Development);

        let db = config.database.as_ref().unwrap();
        assert_eq!(db.url, "sqlite://database/internease.db");
        assert_eq!(db.max_conns, Some(10));

        assert_eq!(config.auth.token_ttl, Duration::from_secs(2_592_000));
        assert!(config.auth.jwt_secret.is_none());

        let logging = config.logging.as_ref().unwrap();
        assert_eq!(logging["default"].file, "logs/internease.log");
        assert!(config.modules.is_empty());
    }

    #[test]
    fn load_layered_parses_all_sections() {
        let tmp = tempdir().unwrap();
        let yaml = format!(
            r#"
server:
{}
  host: "0.0.0.0"
  port: 9090
  timeout_sec: 30
  environment: production

database:
  url: "sqlite://data/app.db"
  max_conns: 4

auth:
  jwt_secret: "0123456789abcdef0123456789abcdef"
  token_ttl: "12h"

logging:
  default:
    console_level: debug
    file: "logs/default.log"
"#,
            home_line(tmp.path())
        );
        let cfg_path = write_cfg(tmp.path(), &yaml);

        let config = AppConfig::load_layered(&cfg_path).unwrap();

        assert!(PathBuf::from(&config.server.home_dir).is_absolute());
        assert!(config.server.home_dir.ends_with("home"));
        assert_eq!(config.server.port, 9090);
        assert!(config.server.environment.is_production());
        assert_eq!(config.database.as_ref().unwrap().max_conns, Some(4));
        assert_eq!(config.auth.token_ttl, Duration::from_secs(12 * 3600));
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.as_ref().unwrap()["default"].console_level, "debug");
    }

    #[test]
    fn minimal_yaml_leaves_optional_sections_empty() {
        let tmp = tempdir().unwrap();
        let yaml = format!(
            "server:\n{}\n  host: \"localhost\"\n  port: 8080\n",
            home_line(tmp.path())
        );
        let cfg_path = write_cfg(tmp.path(), &yaml);

        let config = AppConfig::load_layered(&cfg_path).unwrap();

        assert!(config.database.is_none());
        assert!(config.logging.is_none());
        assert_eq!(config.auth.token_ttl, Duration::from_secs(2_592_000));
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn production_requires_strong_secret() {
        let mut config = AppConfig::default();
        config.server.environment = Environment::Production;
        assert!(config.validate().is_err());

        config.auth.jwt_secret = Some("short".into());
        assert!(config.validate().is_err());

        config.auth.jwt_secret = Some("x".repeat(32));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn cli_overrides_port_mock_and_verbosity() {
        let mut config = AppConfig::default();
        let args = CliArgs {
            port: Some(3000),
            verbose: 2,
            mock: true,
            ..Default::default()
        };

        config.apply_cli_overrides(&args);

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.as_ref().unwrap().url, "sqlite::memory:");
        assert_eq!(config.logging.as_ref().unwrap()["default"].console_level, "trace");
    }

    #[test]
    fn cli_verbose_levels_matrix() {
        for (verbose, expected) in [(0, "info"), (1, "debug"), (2, "trace"), (3, "trace")] {
            let mut config = AppConfig::default();
            config.apply_cli_overrides(&CliArgs {
                verbose,
                ..Default::default()
            });
            assert_eq!(
                config.logging.as_ref().unwrap()["default"].console_level,
                expected
            );
        }
    }

    #[test]
    fn modules_dir_files_are_merged_into_bag() {
        let tmp = tempdir().unwrap();
        let modules_dir = tmp.path().join("modules");
        fs::create_dir_all(&modules_dir).unwrap();
        fs::write(modules_dir.join("notes.yaml"), "max_tags: 12\n").unwrap();
        fs::write(modules_dir.join("ignored.txt"), "nope").unwrap();

        let yaml = format!(
            r#"
server:
{}
  host: "127.0.0.1"
  port: 8087

modules_dir: "{}"

modules:
  api_ingress:
    bind_addr: "127.0.0.1:5000"
"#,
            home_line(tmp.path()),
            modules_dir.to_string_lossy().replace('\\', "/")
        );
        let cfg_path = write_cfg(tmp.path(), &yaml);

        let config = AppConfig::load_layered(&cfg_path).unwrap();
        let provider = AppConfigProvider::new(config);

        assert!(provider.get_module_config("api_ingress").is_some());
        assert_eq!(provider.get_module_config("notes").unwrap()["max_tags"], 12);
        assert!(provider.get_module_config("ignored").is_none());
    }

    #[test]
    fn to_yaml_roundtrip_basic() {
        let config = AppConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("server:"));
        assert!(yaml.contains("auth:"));

        let back: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.server.port, config.server.port);
        assert_eq!(back.auth.token_ttl, config.auth.token_ttl);
    }

    #[test]
    fn unknown_server_field_is_rejected() {
        let invalid = r#"
server:
  home_dir: "/tmp/x"
  host: "127.0.0.1"
  port: 8087
  colour: blue
"#;
        let result: Result<AppConfig, _> = serde_yaml::from_str(invalid);
        assert!(result.is_err());
    }
}
