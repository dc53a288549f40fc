//! Settings / Configuration.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

/// Names of environments for tiffin-server.
/// Overrides serialization to force lower case in settings and
/// environment variables
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    /// Local environment (local testing).
    Local,
    /// Official Develop environment.
    Dev,
    /// Official environment.
    Staging,
    /// Official Production environment.
    Prod,
}

/// Implement display to force environment to lower case
impl std::fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{self:?}").to_lowercase())
    }
}

/// How log lines are written to stdout
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for terminals
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
}

/// Server settings.
#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    /// Server [AppEnvironment].
    pub environment: AppEnvironment,
    /// Server port.
    pub port: u16,
    /// Server metrics port.
    pub metrics_port: u16,
    /// Server timeout in milliseconds.
    pub timeout_ms: u64,
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Database settings.
#[derive(Clone, Deserialize)]
pub struct Database {
    /// Database URL
    pub url: String,
    /// Connect Timeout
    pub connect_timeout: u64,
}

// The URL may carry credentials
impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

/// Email passcode settings.
#[derive(Clone, Debug, Deserialize)]
pub struct Otp {
    /// How long an issued passcode stays valid, in milliseconds
    pub ttl_ms: u64,
}

impl Otp {
    /// Convert `ttl_ms` to [Duration].
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Session token settings.
#[derive(Clone, Deserialize)]
pub struct Auth {
    /// HMAC secret used to sign session tokens
    pub jwt_secret: String,
    /// Lifetime of a session token in seconds
    pub token_ttl_secs: u64,
}

impl Auth {
    /// Convert `token_ttl_secs` to [Duration].
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish_non_exhaustive()
    }
}

/// [Mailgun] settings.
///
/// [Mailgun]: https://www.mailgun.com/
#[derive(Clone, Deserialize)]
pub struct Mailgun {
    /// Mailgun API key.
    pub api_key: String,
    /// Mailgun domain.
    pub domain: String,
    /// Mailgun Subject
    pub subject: String,
    /// Mailgun From Address
    pub from_address: String,
    /// Mailgun From Name
    pub from_name: String,
    /// Mailgun Template
    pub template: String,
}

impl std::fmt::Debug for Mailgun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailgun")
            .field("domain", &self.domain)
            .field("subject", &self.subject)
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// Background healthcheck settings
#[derive(Clone, Debug, Deserialize)]
pub struct Healthcheck {
    /// Is background healthcheck enabled?
    #[serde(rename = "enabled")]
    pub is_enabled: bool,
    /// Healthcheck interval in milliseconds.
    pub interval_ms: u64,
    /// Healthcheck max retries.
    pub max_retries: u32,
}

#[derive(Clone, Debug, Deserialize)]
/// Application settings.
pub struct Settings {
    /// Server settings
    pub server: Server,
    /// Database settings
    pub database: Database,
    /// Email passcode settings
    pub otp: Otp,
    /// Session token settings
    pub auth: Auth,
    /// Mailgun settings
    pub mailgun: Mailgun,
    /// Healthcheck settings
    pub healthcheck: Healthcheck,
    /// The path where the settings file resides.
    /// This can't actually be configured in the settings file itself, for obvious reasons.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl Settings {
    /// Load settings.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path
            .unwrap_or(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/settings.toml"));
        // inject environment variables naming them properly on the settings
        // e.g. [auth] jwt_secret="foo"
        // would be injected with environment variable TIFFIN_SERVER_AUTH__JWT_SECRET="foo"
        let s = Config::builder()
            .add_source(File::with_name(&path.as_path().display().to_string()))
            .add_source(
                Environment::with_prefix("TIFFIN_SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let mut settings: Self = s.try_deserialize()?;
        settings.path = Some(path);
        Ok(settings)
    }
}
