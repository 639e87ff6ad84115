use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permissions::Role;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub embedding: EmbeddingConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub environment: Environment,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub enabled: bool,
    pub api_keys: Vec<ApiKeyConfig>,
    /// Role assumed when authentication is disabled.
    pub anonymous_role: Role,
}

/// One entry in the per-key role table. A key without a role resolves to
/// `guest`, the least-privileged role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub api_key: Option<SecretString>,
    pub model: String,
    /// Dimension of the deterministic fallback vectors.
    pub dimension: usize,
}

#[derive(Clone, Debug)]
pub struct AuditConfig {
    pub capacity: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    OpenAi,
    Hashing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub environment: Option<Environment>,
    pub auth_enabled: Option<bool>,
    pub api_keys: Option<Vec<ApiKeyConfig>>,
    pub anonymous_role: Option<Role>,
    pub embedding_provider: Option<EmbeddingProviderKind>,
    pub embedding_dimension: Option<usize>,
    pub audit_capacity: Option<usize>,
    pub log_level: Option<String>,
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
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_owned(),
                port: 4000,
                environment: Environment::Development,
            },
            auth: AuthConfig {
                enabled: false,
                api_keys: Vec::new(),
                anonymous_role: Role::User,
            },
            embedding: EmbeddingConfig {
                provider: EmbeddingProviderKind::Hashing,
                api_key: None,
                model: "text-embedding-3-small".to_owned(),
                dimension: 256,
            },
            audit: AuditConfig { capacity: crate::audit::DEFAULT_CAPACITY },
            logging: LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::Validation(format!(
                "unsupported environment `{other}` (expected development|production)"
            ))),
        }
    }
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "hashing" => Ok(Self::Hashing),
            other => Err(ConfigError::Validation(format!(
                "unsupported embedding provider `{other}` (expected openai|hashing)"
            ))),
        }
    }
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

impl std::str::FromStr for Role {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "guest" => Ok(Self::Guest),
            other => Err(ConfigError::Validation(format!(
                "unsupported role `{other}` (expected admin|user|guest)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("capstan.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
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
            if let Some(environment) = server.environment {
                self.server.environment = environment;
            }
        }

        if let Some(auth) = patch.auth {
            if let Some(enabled) = auth.enabled {
                self.auth.enabled = enabled;
            }
            if let Some(api_keys) = auth.api_keys {
                self.auth.api_keys = api_keys;
            }
            if let Some(anonymous_role) = auth.anonymous_role {
                self.auth.anonymous_role = anonymous_role;
            }
        }

        if let Some(embedding) = patch.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding.provider = provider;
            }
            if let Some(api_key) = embedding.api_key {
                self.embedding.api_key = Some(api_key.into());
            }
            if let Some(model) = embedding.model {
                self.embedding.model = model;
            }
            if let Some(dimension) = embedding.dimension {
                self.embedding.dimension = dimension;
            }
        }

        if let Some(audit) = patch.audit {
            if let Some(capacity) = audit.capacity {
                self.audit.capacity = capacity;
            }
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
        if let Some(value) = read_env("CAPSTAN_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CAPSTAN_SERVER_PORT") {
            self.server.port = parse_u16("CAPSTAN_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("CAPSTAN_SERVER_ENVIRONMENT") {
            self.server.environment = value.parse()?;
        }

        if let Some(value) = read_env("CAPSTAN_AUTH_ENABLED") {
            self.auth.enabled = parse_bool("CAPSTAN_AUTH_ENABLED", &value)?;
        }
        if let Some(value) = read_env("CAPSTAN_AUTH_API_KEYS") {
            self.auth.api_keys = serde_json::from_str(&value).map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "CAPSTAN_AUTH_API_KEYS".to_owned(),
                    value,
                }
            })?;
        }
        if let Some(value) = read_env("CAPSTAN_AUTH_ANONYMOUS_ROLE") {
            self.auth.anonymous_role = value.parse()?;
        }

        if let Some(value) = read_env("CAPSTAN_EMBEDDING_PROVIDER") {
            self.embedding.provider = value.parse()?;
        }
        if let Some(value) = read_env("CAPSTAN_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(value.into());
        }
        if let Some(value) = read_env("CAPSTAN_EMBEDDING_MODEL") {
            self.embedding.model = value;
        }
        if let Some(value) = read_env("CAPSTAN_EMBEDDING_DIMENSION") {
            self.embedding.dimension = parse_usize("CAPSTAN_EMBEDDING_DIMENSION", &value)?;
        }

        if let Some(value) = read_env("CAPSTAN_AUDIT_CAPACITY") {
            self.audit.capacity = parse_usize("CAPSTAN_AUDIT_CAPACITY", &value)?;
        }

        let log_level = read_env("CAPSTAN_LOGGING_LEVEL").or_else(|| read_env("CAPSTAN_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CAPSTAN_LOGGING_FORMAT").or_else(|| read_env("CAPSTAN_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(environment) = overrides.environment {
            self.server.environment = environment;
        }
        if let Some(auth_enabled) = overrides.auth_enabled {
            self.auth.enabled = auth_enabled;
        }
        if let Some(api_keys) = overrides.api_keys {
            self.auth.api_keys = api_keys;
        }
        if let Some(anonymous_role) = overrides.anonymous_role {
            self.auth.anonymous_role = anonymous_role;
        }
        if let Some(provider) = overrides.embedding_provider {
            self.embedding.provider = provider;
        }
        if let Some(dimension) = overrides.embedding_dimension {
            self.embedding.dimension = dimension;
        }
        if let Some(capacity) = overrides.audit_capacity {
            self.audit.capacity = capacity;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.enabled && self.auth.api_keys.is_empty() {
            return Err(ConfigError::Validation(
                "auth.api_keys must not be empty when auth.enabled is true".to_owned(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &self.auth.api_keys {
            if entry.key.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "auth.api_keys entry `{}` has an empty key",
                    entry.name
                )));
            }
            if !seen.insert(entry.key.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "auth.api_keys entry `{}` duplicates another key",
                    entry.name
                )));
            }
        }

        if self.embedding.provider == EmbeddingProviderKind::OpenAi
            && self.embedding.api_key.is_none()
        {
            return Err(ConfigError::Validation(
                "embedding.api_key is required when embedding.provider is `openai`".to_owned(),
            ));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::Validation(
                "embedding.dimension must be greater than zero".to_owned(),
            ));
        }

        if self.audit.capacity == 0 {
            return Err(ConfigError::Validation(
                "audit.capacity must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    auth: Option<AuthPatch>,
    embedding: Option<EmbeddingPatch>,
    audit: Option<AuditPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    environment: Option<Environment>,
}

#[derive(Debug, Deserialize)]
struct AuthPatch {
    enabled: Option<bool>,
    api_keys: Option<Vec<ApiKeyConfig>>,
    anonymous_role: Option<Role>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingPatch {
    provider: Option<EmbeddingProviderKind>,
    api_key: Option<String>,
    model: Option<String>,
    dimension: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AuditPatch {
    capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("capstan.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_owned(),
            value: value.to_owned(),
        }),
    }
}
