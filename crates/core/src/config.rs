use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::channels::ChannelDirectory;

/// Default Postfacto API host, used when neither the config file nor the
/// environment names one.
pub const DEFAULT_API_URL: &str = "https://retro-api.cfapps.io";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub slack: SlackConfig,
    pub postfacto: PostfactoConfig,
    pub channels: ChannelDirectory,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub verification_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct PostfactoConfig {
    pub api_url: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

/// Caller-supplied overrides, applied after file and env sources. Used by
/// tests and by anything embedding the server.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub verification_token: Option<String>,
    pub api_url: Option<String>,
    pub channels_json: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("could not parse channel directory payload: {0}")]
    ChannelPayload(#[from] serde_json::Error),
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig { bind_address: "0.0.0.0".to_string(), port: 8080 },
            slack: SlackConfig { verification_token: String::new().into() },
            postfacto: PostfactoConfig { api_url: DEFAULT_API_URL.to_string() },
            channels: ChannelDirectory::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    slack: Option<SlackPatch>,
    postfacto: Option<PostfactoPatch>,
    channels: Option<ChannelDirectory>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    verification_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PostfactoPatch {
    api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Loads configuration in precedence order: defaults, optional TOML
    /// file, `RETROSLASH_*` env vars, then caller overrides.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("retroslash.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(slack) = patch.slack {
            if let Some(token) = slack.verification_token {
                self.slack.verification_token = token.into();
            }
        }

        if let Some(postfacto) = patch.postfacto {
            if let Some(api_url) = postfacto.api_url {
                self.postfacto.api_url = api_url;
            }
        }

        if let Some(channels) = patch.channels {
            self.channels = channels;
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RETROSLASH_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("RETROSLASH_PORT") {
            self.server.port = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "RETROSLASH_PORT".to_string(),
                value,
            })?;
        }
        if let Some(value) = read_env("RETROSLASH_VERIFICATION_TOKEN") {
            self.slack.verification_token = value.into();
        }
        if let Some(value) = read_env("RETROSLASH_API_URL") {
            self.postfacto.api_url = value;
        }
        if let Some(value) = read_env("RETROSLASH_CHANNELS") {
            self.channels = ChannelDirectory::from_json(&value)?;
        }
        if let Some(value) = read_env("RETROSLASH_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("RETROSLASH_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(token) = overrides.verification_token {
            self.slack.verification_token = token.into();
        }
        if let Some(api_url) = overrides.api_url {
            self.postfacto.api_url = api_url;
        }
        if let Some(payload) = overrides.channels_json {
            self.channels = ChannelDirectory::from_json(&payload)?;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.slack.verification_token.expose_secret().is_empty() {
            return Err(ConfigError::Validation(
                "slack.verification_token must be set".to_string(),
            ));
        }
        if self.postfacto.api_url.is_empty() {
            return Err(ConfigError::Validation("postfacto.api_url must be set".to_string()));
        }
        Ok(())
    }
}

fn resolve_config_path(requested: Option<&Path>) -> Option<PathBuf> {
    match requested {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => {
            let default = Path::new("retroslash.toml");
            default.exists().then(|| default.to_path_buf())
        }
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}
