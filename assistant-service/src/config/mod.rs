use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

/// Default base URL for the hosted assistants API.
const ASSISTANT_API_BASE: &str = "https://api.openai.com/v1";

/// Default cap on uploaded contract files (20MB).
const DEFAULT_MAX_UPLOAD_BYTES: i64 = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub common: core_config::Config,
    pub api: ApiConfig,
    pub run: RunConfig,
    pub limits: LimitConfig,
    pub quota: QuotaConfig,
}

/// Credentials and endpoint for the remote assistants service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: Secret<String>,
    pub assistant_id: String,
    pub base_url: String,
}

/// Run polling knobs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Fixed interval between run status queries.
    pub poll_interval_ms: u64,
    /// Deadline after which an unfinished run is reported as timed out.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LimitConfig {
    pub max_upload_bytes: i64,
}

/// Session budget for the usage gate. `None` means unlimited.
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    pub max_sessions: Option<u32>,
}

impl AssistantConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(AssistantConfig {
            common: common_config,
            api: ApiConfig {
                // Both credentials are required in every environment; a missing
                // value is a fatal configuration error before any listener binds.
                api_key: Secret::new(get_env("OPENAI_API_KEY", None, is_prod)?),
                assistant_id: get_env("ASSISTANT_ID", None, is_prod)?,
                base_url: get_env("ASSISTANT_BASE_URL", Some(ASSISTANT_API_BASE), is_prod)?,
            },
            run: RunConfig {
                poll_interval_ms: get_env("RUN_POLL_INTERVAL_MS", Some("1000"), is_prod)?
                    .parse()
                    .unwrap_or(1000),
                timeout_secs: get_env("RUN_TIMEOUT_SECS", Some("120"), is_prod)?
                    .parse()
                    .unwrap_or(120),
            },
            limits: LimitConfig {
                max_upload_bytes: get_env(
                    "MAX_UPLOAD_BYTES",
                    Some(&DEFAULT_MAX_UPLOAD_BYTES.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
            quota: QuotaConfig {
                max_sessions: env::var("QUOTA_MAX_SESSIONS")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            },
        })
    }
}

impl RunConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
