use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Placeholder values that mean "no credential has been deployed"
pub const PLACEHOLDER_KEYS: &[&str] = &[
    "PLACEHOLDER_GEMINI_API_KEY",
    "PLACEHOLDER_GOOGLE_API_KEY",
    "your_gemini_api_key_here",
];

/// True when a provider key is present and not a placeholder
pub fn is_configured_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !PLACEHOLDER_KEYS.contains(&key)
}

/// Main configuration structure for the advisory service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub gemini: GeminiConfig,
    pub speech: SpeechConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub bind: String,
    /// Base used when rendering signed blob URLs
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub database: u8,
    pub pool: PoolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_size: usize,
    pub timeout_seconds: u64,
    pub create_timeout_seconds: u64,
    pub recycle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub api_key: String,
    pub recognize_url: String,
    pub synthesize_url: String,
    /// Encoding of uploaded recordings (browser MediaRecorder default)
    pub encoding: String,
    pub sample_rate_hertz: u32,
    pub speaking_rate: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub blob_ttl_seconds: i64,
    pub signed_url_ttl_seconds: u64,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "agri-advisor".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            bind: "127.0.0.1:8080".to_string(),
            public_base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            database: 0,
            pool: PoolConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 16,
            timeout_seconds: 5,
            create_timeout_seconds: 5,
            recycle_timeout_seconds: 5,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("GEMINI_API_KEY").unwrap_or_else(|_| {
                tracing::warn!("GEMINI_API_KEY not set, using placeholder");
                "PLACEHOLDER_GEMINI_API_KEY".to_string()
            }),
            model: "gemini-1.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            max_output_tokens: 1024,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("GOOGLE_SPEECH_API_KEY")
                .or_else(|_| env::var("GOOGLE_API_KEY"))
                .unwrap_or_else(|_| "PLACEHOLDER_GOOGLE_API_KEY".to_string()),
            recognize_url: "https://speech.googleapis.com/v1/speech:recognize".to_string(),
            synthesize_url: "https://texttospeech.googleapis.com/v1/text:synthesize".to_string(),
            encoding: "WEBM_OPUS".to_string(),
            sample_rate_hertz: 48000,
            speaking_rate: 0.9,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            blob_ttl_seconds: 604800,
            signed_url_ttl_seconds: 3600,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        let env_paths = ["../.env", ".env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::warn!("No .env file found - continuing with env vars only");
        }

        let config_path =
            env::var("ADVISOR_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => Self::from_yaml(&contents).unwrap_or_else(|e| {
                    tracing::error!(
                        "Failed to parse config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }),
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::warn!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();

        // Validate configuration - log warnings but don't fail
        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        let config = serde_yaml::from_str::<Config>(contents)?;
        tracing::info!("Parsed configuration for {}", config.server.name);
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(bind) = env::var("ADVISOR_HTTP_BIND") {
            self.server.bind = bind;
        }
        if let Ok(url) = env::var("ADVISOR_PUBLIC_URL") {
            self.server.public_base_url = url;
        }

        // Redis overrides
        if let Ok(host) = env::var("REDIS_HOST") {
            self.redis.host = host;
        }
        if let Ok(port) = env::var("REDIS_PORT") {
            if let Ok(port_num) = port.parse() {
                self.redis.port = port_num;
            }
        }
        if let Ok(db) = env::var("REDIS_DB") {
            if let Ok(db_num) = db.parse() {
                self.redis.database = db_num;
            }
        }
        if let Ok(pool_size) = env::var("ADVISOR_REDIS_POOL_SIZE") {
            if let Ok(size) = pool_size.parse() {
                self.redis.pool.max_size = size;
            }
        }

        // Gemini overrides
        if let Ok(api_key) = env::var("GEMINI_API_KEY") {
            self.gemini.api_key = api_key;
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            self.gemini.model = model;
        }

        // Speech overrides
        if let Ok(api_key) = env::var("GOOGLE_SPEECH_API_KEY").or_else(|_| env::var("GOOGLE_API_KEY"))
        {
            self.speech.api_key = api_key;
        }

        // Storage overrides
        if let Ok(ttl) = env::var("ADVISOR_SIGNED_URL_TTL_SECONDS") {
            if let Ok(secs) = ttl.parse() {
                self.storage.signed_url_ttl_seconds = secs;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.redis.port == 0 {
            return Err("Redis port cannot be 0".into());
        }
        if self.storage.signed_url_ttl_seconds == 0 {
            return Err("storage.signed_url_ttl_seconds cannot be 0".into());
        }
        if self.storage.blob_ttl_seconds <= 0 {
            return Err("storage.blob_ttl_seconds must be positive".into());
        }
        if !is_configured_key(&self.gemini.api_key) {
            return Err("GEMINI_API_KEY environment variable must be set".into());
        }
        if !is_configured_key(&self.speech.api_key) {
            return Err("GOOGLE_SPEECH_API_KEY environment variable must be set".into());
        }
        Ok(())
    }

    /// Get Redis URL with password from environment
    pub fn get_redis_url(&self) -> String {
        let password = env::var("REDIS_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!("REDIS_PASSWORD not set, assuming no password for local development.");
            "".to_string()
        });

        if password.is_empty() {
            format!(
                "redis://{}:{}/{}",
                self.redis.host, self.redis.port, self.redis.database
            )
        } else {
            format!(
                "redis://:{}@{}:{}/{}",
                password, self.redis.host, self.redis.port, self.redis.database
            )
        }
    }

    pub fn get_pool_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.timeout_seconds)
    }

    pub fn get_pool_create_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.create_timeout_seconds)
    }

    pub fn get_pool_recycle_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.recycle_timeout_seconds)
    }
}

impl StorageConfig {
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_seconds)
    }
}
