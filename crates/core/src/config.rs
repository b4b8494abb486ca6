use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub oracle: OracleConfig,
    pub store: StoreConfig,
    pub ledger: LedgerConfig,
    pub throttle: ThrottleConfig,
    pub reply: ReplyConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub backup_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub capacity: usize,
}

#[derive(Clone, Debug)]
pub struct ThrottleConfig {
    pub window_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ReplyConfig {
    pub typing_min_ms: u64,
    pub typing_max_ms: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub oracle_base_url: Option<String>,
    pub store_base_url: Option<String>,
    pub backup_path: Option<PathBuf>,
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
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig {
                base_url: "http://localhost:5005".to_string(),
                api_key: None,
                timeout_secs: 15,
            },
            store: StoreConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: 10,
                backup_path: PathBuf::from("cotizaciones_backup.jsonl"),
            },
            ledger: LedgerConfig { capacity: 20 },
            throttle: ThrottleConfig { window_secs: 7200 },
            reply: ReplyConfig { typing_min_ms: 3000, typing_max_ms: 6000 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cotiza.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(oracle) = patch.oracle {
            if let Some(base_url) = oracle.base_url {
                self.oracle.base_url = base_url;
            }
            if let Some(oracle_api_key_value) = oracle.api_key {
                self.oracle.api_key = Some(secret_value(oracle_api_key_value));
            }
            if let Some(timeout_secs) = oracle.timeout_secs {
                self.oracle.timeout_secs = timeout_secs;
            }
        }

        if let Some(store) = patch.store {
            if let Some(base_url) = store.base_url {
                self.store.base_url = base_url;
            }
            if let Some(timeout_secs) = store.timeout_secs {
                self.store.timeout_secs = timeout_secs;
            }
            if let Some(backup_path) = store.backup_path {
                self.store.backup_path = backup_path;
            }
        }

        if let Some(ledger) = patch.ledger {
            if let Some(capacity) = ledger.capacity {
                self.ledger.capacity = capacity;
            }
        }

        if let Some(throttle) = patch.throttle {
            if let Some(window_secs) = throttle.window_secs {
                self.throttle.window_secs = window_secs;
            }
        }

        if let Some(reply) = patch.reply {
            if let Some(typing_min_ms) = reply.typing_min_ms {
                self.reply.typing_min_ms = typing_min_ms;
            }
            if let Some(typing_max_ms) = reply.typing_max_ms {
                self.reply.typing_max_ms = typing_max_ms;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
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
        if let Some(value) = read_env("COTIZA_ORACLE_BASE_URL") {
            self.oracle.base_url = value;
        }
        if let Some(value) = read_env("COTIZA_ORACLE_API_KEY") {
            self.oracle.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("COTIZA_ORACLE_TIMEOUT_SECS") {
            self.oracle.timeout_secs = parse_u64("COTIZA_ORACLE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("COTIZA_STORE_BASE_URL") {
            self.store.base_url = value;
        }
        if let Some(value) = read_env("COTIZA_STORE_TIMEOUT_SECS") {
            self.store.timeout_secs = parse_u64("COTIZA_STORE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("COTIZA_STORE_BACKUP_PATH") {
            self.store.backup_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("COTIZA_LEDGER_CAPACITY") {
            self.ledger.capacity = parse_usize("COTIZA_LEDGER_CAPACITY", &value)?;
        }

        if let Some(value) = read_env("COTIZA_THROTTLE_WINDOW_SECS") {
            self.throttle.window_secs = parse_u64("COTIZA_THROTTLE_WINDOW_SECS", &value)?;
        }

        if let Some(value) = read_env("COTIZA_REPLY_TYPING_MIN_MS") {
            self.reply.typing_min_ms = parse_u64("COTIZA_REPLY_TYPING_MIN_MS", &value)?;
        }
        if let Some(value) = read_env("COTIZA_REPLY_TYPING_MAX_MS") {
            self.reply.typing_max_ms = parse_u64("COTIZA_REPLY_TYPING_MAX_MS", &value)?;
        }

        if let Some(value) = read_env("COTIZA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("COTIZA_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("COTIZA_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("COTIZA_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("COTIZA_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("COTIZA_LOGGING_LEVEL").or_else(|| read_env("COTIZA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("COTIZA_LOGGING_FORMAT").or_else(|| read_env("COTIZA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(oracle_base_url) = overrides.oracle_base_url {
            self.oracle.base_url = oracle_base_url;
        }
        if let Some(store_base_url) = overrides.store_base_url {
            self.store.base_url = store_base_url;
        }
        if let Some(backup_path) = overrides.backup_path {
            self.store.backup_path = backup_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_oracle(&self.oracle)?;
        validate_store(&self.store)?;
        validate_ledger(&self.ledger)?;
        validate_throttle(&self.throttle)?;
        validate_reply(&self.reply)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cotiza.toml"), PathBuf::from("config/cotiza.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_url(section: &str, url: &str) -> Result<(), ConfigError> {
    let trimmed = url.trim();
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{section}.base_url must start with http:// or https://"
        )));
    }
    Ok(())
}

fn validate_oracle(oracle: &OracleConfig) -> Result<(), ConfigError> {
    validate_url("oracle", &oracle.base_url)?;

    if oracle.timeout_secs == 0 || oracle.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "oracle.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if let Some(api_key) = &oracle.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "oracle.api_key must not be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    validate_url("store", &store.base_url)?;

    if store.timeout_secs == 0 || store.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "store.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if store.backup_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("store.backup_path must not be empty".to_string()));
    }

    Ok(())
}

fn validate_ledger(ledger: &LedgerConfig) -> Result<(), ConfigError> {
    if ledger.capacity == 0 {
        return Err(ConfigError::Validation(
            "ledger.capacity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_throttle(throttle: &ThrottleConfig) -> Result<(), ConfigError> {
    if throttle.window_secs == 0 {
        return Err(ConfigError::Validation(
            "throttle.window_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_reply(reply: &ReplyConfig) -> Result<(), ConfigError> {
    if reply.typing_min_ms > reply.typing_max_ms {
        return Err(ConfigError::Validation(
            "reply.typing_min_ms must not exceed reply.typing_max_ms".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    oracle: Option<OraclePatch>,
    store: Option<StorePatch>,
    ledger: Option<LedgerPatch>,
    throttle: Option<ThrottlePatch>,
    reply: Option<ReplyPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct OraclePatch {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    backup_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LedgerPatch {
    capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ThrottlePatch {
    window_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyPatch {
    typing_min_ms: Option<u64>,
    typing_max_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
