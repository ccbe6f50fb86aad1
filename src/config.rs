use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::{info, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_PHOTO_BUCKET: &str = "wildlife-photos";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub storage_url: Option<String>,
    pub storage_key: Option<String>,
    pub photo_bucket: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_url: None,
            storage_key: None,
            photo_bucket: DEFAULT_PHOTO_BUCKET.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self {
            api_url: trim_slash(try_load("WILDLIFE_API_URL", DEFAULT_API_URL.to_string())),
            storage_url: optional("WILDLIFE_STORAGE_URL").map(trim_slash),
            storage_key: optional("WILDLIFE_STORAGE_KEY"),
            photo_bucket: try_load(
                "WILDLIFE_PHOTO_BUCKET",
                DEFAULT_PHOTO_BUCKET.to_string(),
            ),
            timeout: Duration::from_secs(try_load(
                "WILDLIFE_HTTP_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
        }
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = trim_slash(url.to_string());
        self
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
