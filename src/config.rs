use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "MediVan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum accepted upload size (10 MB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Top score below which the single-prompt router pass is re-scored with the prompt ensemble.
pub const DEFAULT_ENSEMBLE_THRESHOLD: f32 = 0.5;
/// Top score below which an image is routed to `unknown`.
pub const DEFAULT_REJECT_THRESHOLD: f32 = 0.35;

const DEFAULT_NIM_ENDPOINT: &str = "http://localhost:8080/v1";
const DEFAULT_NIM_MODEL: &str = "meta/llama-3.1-8b-instruct";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medivan_lib=info,medivan=info,tower_http=info"
}

/// Get the application data directory
/// ~/MediVan/ on all platforms
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Get the models directory (ONNX router, classifiers, embeddings)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Router thresholds out of order: reject {reject} must not exceed ensemble {ensemble}")]
    ThresholdOrder { reject: f32, ensemble: f32 },
}

/// Confidence gates for the modality router.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterThresholds {
    pub ensemble: f32,
    pub reject: f32,
}

impl Default for RouterThresholds {
    fn default() -> Self {
        Self {
            ensemble: DEFAULT_ENSEMBLE_THRESHOLD,
            reject: DEFAULT_REJECT_THRESHOLD,
        }
    }
}

impl RouterThresholds {
    pub fn new(ensemble: f32, reject: f32) -> Result<Self, ConfigError> {
        for (var, value) in [
            ("ROUTER_ENSEMBLE_THRESHOLD", ensemble),
            ("ROUTER_REJECT_THRESHOLD", reject),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    var,
                    value: value.to_string(),
                });
            }
        }
        if reject > ensemble {
            return Err(ConfigError::ThresholdOrder { reject, ensemble });
        }
        Ok(Self { ensemble, reject })
    }
}

/// External text-generation service (OpenAI-compatible chat completions).
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_NIM_ENDPOINT.to_string(),
            model: DEFAULT_NIM_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Mock classifiers, heuristic routing, keyword retrieval and template reports.
    pub mock_mode: bool,
    pub host: IpAddr,
    pub port: u16,
    pub generation: GenerationConfig,
    pub knowledge_dir: PathBuf,
    pub models_dir: PathBuf,
    pub frontend_dir: PathBuf,
    pub thresholds: RouterThresholds,
    /// Idle sessions older than this are evicted. `None` keeps sessions for the process lifetime.
    pub session_ttl: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mock_mode: true,
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
            generation: GenerationConfig::default(),
            knowledge_dir: PathBuf::from("knowledge"),
            models_dir: models_dir(),
            frontend_dir: PathBuf::from("frontend").join("out"),
            thresholds: RouterThresholds::default(),
            session_ttl: None,
        }
    }
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (env, test maps).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mock_mode = match lookup("MOCK_MODE") {
            Some(v) => parse_bool("MOCK_MODE", &v)?,
            None => defaults.mock_mode,
        };
        let host = parse_or("HOST", lookup("HOST"), defaults.host)?;
        let port = parse_or("PORT", lookup("PORT"), defaults.port)?;

        let timeout_secs = parse_or(
            "GENERATION_TIMEOUT_SECS",
            lookup("GENERATION_TIMEOUT_SECS"),
            DEFAULT_GENERATION_TIMEOUT_SECS,
        )?;
        let generation = GenerationConfig {
            endpoint: lookup("NIM_ENDPOINT")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.generation.endpoint),
            model: lookup("NIM_MODEL").unwrap_or(defaults.generation.model),
            timeout: Duration::from_secs(timeout_secs),
        };

        let thresholds = RouterThresholds::new(
            parse_or(
                "ROUTER_ENSEMBLE_THRESHOLD",
                lookup("ROUTER_ENSEMBLE_THRESHOLD"),
                DEFAULT_ENSEMBLE_THRESHOLD,
            )?,
            parse_or(
                "ROUTER_REJECT_THRESHOLD",
                lookup("ROUTER_REJECT_THRESHOLD"),
                DEFAULT_REJECT_THRESHOLD,
            )?,
        )?;

        let session_ttl = match lookup("SESSION_TTL_SECS") {
            Some(v) => Some(Duration::from_secs(parse_value("SESSION_TTL_SECS", &v)?)),
            None => None,
        };

        Ok(Self {
            mock_mode,
            host,
            port,
            generation,
            knowledge_dir: lookup("KNOWLEDGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.knowledge_dir),
            models_dir: lookup("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            frontend_dir: lookup("FRONTEND_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.frontend_dir),
            thresholds,
            session_ttl,
        })
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}

fn parse_value<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}

fn parse_or<T: FromStr>(
    var: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => parse_value(var, &v),
        None => Ok(default),
    }
}
