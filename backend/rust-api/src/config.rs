use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::staging::default_upload_dir;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = config::ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(config::ConfigError::Message(format!(
                "unknown storage backend '{}', expected mongo or memory",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(2000),
            poll_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_bytes: 100 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub idle_ttl: Duration,
    pub max_entries: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(3600),
            max_entries: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub storage_backend: StorageBackend,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub gemini: GeminiConfig,
    pub uploads: UploadConfig,
    pub chat: ChatConfig,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            storage_backend: StorageBackend::Mongo,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_database: "neuralsync".to_string(),
            gemini: GeminiConfig::default(),
            uploads: UploadConfig::default(),
            chat: ChatConfig::default(),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/<env>.toml is optional; APP__SECTION__KEY overrides it
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_settings(&settings)
    }

    pub fn from_settings(settings: &config::Config) -> Result<Self, config::ConfigError> {
        let defaults = Config::default();
        let lookup = |key: &str, vars: &[&str]| -> Option<String> {
            settings
                .get_string(key)
                .ok()
                .or_else(|| vars.iter().find_map(|var| env::var(var).ok()))
                .filter(|value| !value.trim().is_empty())
        };

        let storage_backend = match lookup("storage.backend", &["STORAGE_BACKEND"]) {
            Some(value) => value.parse()?,
            None => defaults.storage_backend,
        };

        let gemini = GeminiConfig {
            api_key: lookup("gemini.api_key", &["GEMINI_API_KEY", "GOOGLE_API_KEY"]),
            model: lookup("gemini.model", &["GEMINI_MODEL"]).unwrap_or(defaults.gemini.model),
            base_url: lookup("gemini.base_url", &["GEMINI_BASE_URL"])
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini.base_url),
            request_timeout: Duration::from_secs(parse_number(
                lookup("gemini.request_timeout_secs", &[]),
                "gemini.request_timeout_secs",
                defaults.gemini.request_timeout.as_secs(),
            )?),
            poll_interval: Duration::from_millis(parse_number(
                lookup("gemini.poll_interval_ms", &[]),
                "gemini.poll_interval_ms",
                defaults.gemini.poll_interval.as_millis() as u64,
            )?),
            poll_timeout: Duration::from_secs(parse_number(
                lookup("gemini.poll_timeout_secs", &[]),
                "gemini.poll_timeout_secs",
                defaults.gemini.poll_timeout.as_secs(),
            )?),
        };

        let uploads = UploadConfig {
            dir: lookup("uploads.dir", &["UPLOAD_DIR"])
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads.dir),
            max_bytes: parse_number(
                lookup("uploads.max_bytes", &[]),
                "uploads.max_bytes",
                defaults.uploads.max_bytes as u64,
            )? as usize,
        };

        let chat = ChatConfig {
            idle_ttl: Duration::from_secs(parse_number(
                lookup("chat.idle_ttl_secs", &[]),
                "chat.idle_ttl_secs",
                defaults.chat.idle_ttl.as_secs(),
            )?),
            max_entries: parse_number(
                lookup("chat.max_entries", &[]),
                "chat.max_entries",
                defaults.chat.max_entries as u64,
            )? as usize,
        };

        let cors_allowed_origins = lookup("cors.allowed_origins", &["CORS_ALLOWED_ORIGINS"])
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_allowed_origins);

        if gemini.api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set; AI operations will fail until configured");
        }

        Ok(Config {
            bind_addr: lookup("server.bind_addr", &["BIND_ADDR"]).unwrap_or(defaults.bind_addr),
            storage_backend,
            mongo_uri: lookup("database.mongo_uri", &["MONGO_URI"]).unwrap_or(defaults.mongo_uri),
            mongo_database: lookup("database.mongo_database", &["MONGO_DATABASE"])
                .unwrap_or(defaults.mongo_database),
            gemini,
            uploads,
            chat,
            cors_allowed_origins,
        })
    }
}

fn parse_number(value: Option<String>, key: &str, default: u64) -> Result<u64, config::ConfigError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| {
            config::ConfigError::Message(format!("{} must be a non-negative integer, got '{}'", key, raw))
        }),
        None => Ok(default),
    }
}
