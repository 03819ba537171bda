use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Immutable application configuration. Built once at startup from defaults,
/// an optional `quoteforge.toml` patch, `QUOTEFORGE_*` environment
/// overrides, and programmatic overrides, then validated. Components receive
/// the sections they need at construction time; nothing reads ambient state
/// afterwards.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub pricing: PricingConfig,
    pub email: EmailConfig,
    pub audit: AuditConfig,
    pub server: ServerConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub provider: GenerationProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl GenerationConfig {
    /// Explicit base url if configured, otherwise the provider default.
    pub fn effective_base_url(&self) -> &str {
        match (&self.base_url, self.provider) {
            (Some(url), _) => url,
            (None, GenerationProvider::OpenAi) => "https://api.openai.com/v1",
            (None, GenerationProvider::Ollama) => "http://localhost:11434/v1",
        }
    }
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub min_subtotal: i64,
    pub vat_rate: Decimal,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender_email: Option<String>,
    pub sender_password: Option<SecretString>,
    pub sender_name: String,
}

#[derive(Clone, Debug)]
pub struct AuditConfig {
    pub sheet_id: Option<String>,
    pub api_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl OutputConfig {
    pub fn proposals_dir(&self) -> PathBuf {
        self.dir.join("proposals")
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProvider {
    OpenAi,
    Ollama,
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
    pub generation_provider: Option<GenerationProvider>,
    pub generation_model: Option<String>,
    pub pricing_min_subtotal: Option<i64>,
    pub pricing_vat_rate: Option<f64>,
    pub output_dir: Option<PathBuf>,
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
            generation: GenerationConfig {
                provider: GenerationProvider::Ollama,
                api_key: None,
                base_url: None,
                model: "llama3.1".to_owned(),
                timeout_secs: 120,
            },
            pricing: PricingConfig {
                min_subtotal: 500_000,
                vat_rate: Decimal::new(1, 1),
            },
            email: EmailConfig {
                smtp_host: "smtp.gmail.com".to_owned(),
                smtp_port: 587,
                sender_email: None,
                sender_password: None,
                sender_name: "Quoteforge".to_owned(),
            },
            audit: AuditConfig { sheet_id: None, api_token: None },
            server: ServerConfig { bind_address: "0.0.0.0".to_owned(), port: 8000 },
            output: OutputConfig { dir: PathBuf::from("output") },
            logging: LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for GenerationProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported generation provider `{other}` (expected openai|ollama)"
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("quoteforge.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(generation) = patch.generation {
            if let Some(provider) = generation.provider {
                self.generation.provider = provider;
            }
            if let Some(api_key) = generation.api_key {
                self.generation.api_key = Some(api_key.into());
            }
            if let Some(base_url) = generation.base_url {
                self.generation.base_url = Some(base_url);
            }
            if let Some(model) = generation.model {
                self.generation.model = model;
            }
            if let Some(timeout_secs) = generation.timeout_secs {
                self.generation.timeout_secs = timeout_secs;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(min_subtotal) = pricing.min_subtotal {
                self.pricing.min_subtotal = min_subtotal;
            }
            if let Some(vat_rate) = pricing.vat_rate {
                self.pricing.vat_rate = parse_vat_rate(vat_rate)?;
            }
        }

        if let Some(email) = patch.email {
            if let Some(smtp_host) = email.smtp_host {
                self.email.smtp_host = smtp_host;
            }
            if let Some(smtp_port) = email.smtp_port {
                self.email.smtp_port = smtp_port;
            }
            if let Some(sender_email) = email.sender_email {
                self.email.sender_email = Some(sender_email);
            }
            if let Some(sender_password) = email.sender_password {
                self.email.sender_password = Some(sender_password.into());
            }
            if let Some(sender_name) = email.sender_name {
                self.email.sender_name = sender_name;
            }
        }

        if let Some(audit) = patch.audit {
            if let Some(sheet_id) = audit.sheet_id {
                self.audit.sheet_id = Some(sheet_id);
            }
            if let Some(api_token) = audit.api_token {
                self.audit.api_token = Some(api_token.into());
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(output) = patch.output {
            if let Some(dir) = output.dir {
                self.output.dir = dir;
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

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUOTEFORGE_GENERATION_PROVIDER") {
            self.generation.provider = value.parse()?;
        }
        if let Some(value) = read_env("QUOTEFORGE_GENERATION_API_KEY") {
            self.generation.api_key = Some(value.into());
        }
        if let Some(value) = read_env("QUOTEFORGE_GENERATION_BASE_URL") {
            self.generation.base_url = Some(value);
        }
        if let Some(value) = read_env("QUOTEFORGE_GENERATION_MODEL") {
            self.generation.model = value;
        }
        if let Some(value) = read_env("QUOTEFORGE_GENERATION_TIMEOUT_SECS") {
            self.generation.timeout_secs =
                parse_u64("QUOTEFORGE_GENERATION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("QUOTEFORGE_PRICING_MIN_SUBTOTAL") {
            self.pricing.min_subtotal = parse_i64("QUOTEFORGE_PRICING_MIN_SUBTOTAL", &value)?;
        }
        if let Some(value) = read_env("QUOTEFORGE_PRICING_VAT_RATE") {
            let raw = parse_f64("QUOTEFORGE_PRICING_VAT_RATE", &value)?;
            self.pricing.vat_rate = parse_vat_rate(raw)?;
        }

        if let Some(value) = read_env("QUOTEFORGE_EMAIL_SMTP_HOST") {
            self.email.smtp_host = value;
        }
        if let Some(value) = read_env("QUOTEFORGE_EMAIL_SMTP_PORT") {
            self.email.smtp_port = parse_u16("QUOTEFORGE_EMAIL_SMTP_PORT", &value)?;
        }
        if let Some(value) = read_env("QUOTEFORGE_EMAIL_SENDER_EMAIL") {
            self.email.sender_email = Some(value);
        }
        if let Some(value) = read_env("QUOTEFORGE_EMAIL_SENDER_PASSWORD") {
            self.email.sender_password = Some(value.into());
        }
        if let Some(value) = read_env("QUOTEFORGE_EMAIL_SENDER_NAME") {
            self.email.sender_name = value;
        }

        if let Some(value) = read_env("QUOTEFORGE_AUDIT_SHEET_ID") {
            self.audit.sheet_id = Some(value);
        }
        if let Some(value) = read_env("QUOTEFORGE_AUDIT_API_TOKEN") {
            self.audit.api_token = Some(value.into());
        }

        if let Some(value) = read_env("QUOTEFORGE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("QUOTEFORGE_SERVER_PORT") {
            self.server.port = parse_u16("QUOTEFORGE_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("QUOTEFORGE_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(value);
        }

        let log_level =
            read_env("QUOTEFORGE_LOGGING_LEVEL").or_else(|| read_env("QUOTEFORGE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUOTEFORGE_LOGGING_FORMAT").or_else(|| read_env("QUOTEFORGE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(provider) = overrides.generation_provider {
            self.generation.provider = provider;
        }
        if let Some(model) = overrides.generation_model {
            self.generation.model = model;
        }
        if let Some(min_subtotal) = overrides.pricing_min_subtotal {
            self.pricing.min_subtotal = min_subtotal;
        }
        if let Some(vat_rate) = overrides.pricing_vat_rate {
            self.pricing.vat_rate = parse_vat_rate(vat_rate)?;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output.dir = output_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.model.trim().is_empty() {
            return Err(ConfigError::Validation("generation.model must not be empty".into()));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "generation.timeout_secs must be at least 1".into(),
            ));
        }
        if self.pricing.min_subtotal < 0 {
            return Err(ConfigError::Validation(
                "pricing.min_subtotal must not be negative".into(),
            ));
        }
        if self.pricing.vat_rate < Decimal::ZERO || self.pricing.vat_rate >= Decimal::ONE {
            return Err(ConfigError::Validation(
                "pricing.vat_rate must be within [0, 1)".into(),
            ));
        }
        if self.email.smtp_port == 0 {
            return Err(ConfigError::Validation("email.smtp_port must not be zero".into()));
        }
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.bind_address must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn parse_vat_rate(raw: f64) -> Result<Decimal, ConfigError> {
    Decimal::from_f64(raw).ok_or_else(|| {
        ConfigError::Validation(format!("pricing.vat_rate `{raw}` is not a finite number"))
    })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(_) => None,
        None => {
            let default = PathBuf::from("quoteforge.toml");
            default.exists().then_some(default)
        }
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let contents = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&contents)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    generation: Option<GenerationPatch>,
    pricing: Option<PricingPatch>,
    email: Option<EmailPatch>,
    audit: Option<AuditPatch>,
    server: Option<ServerPatch>,
    output: Option<OutputPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerationPatch {
    provider: Option<GenerationProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    min_subtotal: Option<i64>,
    vat_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailPatch {
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
    sender_email: Option<String>,
    sender_password: Option<String>,
    sender_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuditPatch {
    sheet_id: Option<String>,
    api_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputPatch {
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
