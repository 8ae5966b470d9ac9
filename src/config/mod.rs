use std::env;
use std::path::PathBuf;

use anyhow::Context;

use crate::accounting::HashCost;

const DEFAULT_MODEL_SERVER_URL: &str = "http://localhost:8501";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Unset means the process-local store is used.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,

    // Refill authorisation
    pub admin_secret: String,
    pub allow_negative_refill: bool,

    // Mirror error codes onto the HTTP status line
    pub strict_http_status: bool,

    // Classifier
    pub model_server_url: String,
    pub model_name: String,
    pub labels_path: PathBuf,
    pub fetch_timeout_secs: u64,
    pub inference_timeout_secs: u64,
    pub max_image_bytes: usize,

    // Password hashing cost
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let admin_secret = env::var("ADMIN_SECRET")
            .map_err(|_| anyhow::anyhow!("ADMIN_SECRET must be set"))?;
        if admin_secret.is_empty() {
            anyhow::bail!("ADMIN_SECRET must not be empty");
        }

        let defaults = HashCost::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5004".into())
                .parse()?,

            admin_secret,
            allow_negative_refill: parse_flag(
                "ALLOW_NEGATIVE_REFILL",
                env::var("ALLOW_NEGATIVE_REFILL").ok(),
                true,
            )?,

            strict_http_status: parse_flag(
                "STRICT_HTTP_STATUS",
                env::var("STRICT_HTTP_STATUS").ok(),
                false,
            )?,

            model_server_url: env::var("MODEL_SERVER_URL")
                .unwrap_or_else(|_| DEFAULT_MODEL_SERVER_URL.into()),
            model_name: env::var("MODEL_NAME").unwrap_or_else(|_| "inception_v3".into()),
            labels_path: env::var("LABELS_PATH")
                .unwrap_or_else(|_| "imagenet_class_index.json".into())
                .into(),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            inference_timeout_secs: env::var("INFERENCE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
            max_image_bytes: env::var("MAX_IMAGE_BYTES")
                .unwrap_or_else(|_| "10485760".into())
                .parse()
                .unwrap_or(10 * 1024 * 1024),

            hash_memory_kib: env::var("HASH_MEMORY_KIB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.memory_kib),
            hash_iterations: env::var("HASH_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.iterations),
        })
    }

    pub fn hash_cost(&self) -> HashCost {
        HashCost {
            memory_kib: self.hash_memory_kib,
            iterations: self.hash_iterations,
        }
    }
}

/// Policy switches accept only `true` or `false`; anything else is a
/// startup error. Unset or empty takes `default`.
fn parse_flag(name: &str, raw: Option<String>, default: bool) -> anyhow::Result<bool> {
    match raw {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v
            .parse()
            .with_context(|| format!("{name} must be `true` or `false`, got {v:?}")),
    }
}
