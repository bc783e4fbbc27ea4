use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::errors::{NewsError, NewsResult};
use crate::services::aggregate_service::{AggregateOptions, DEFAULT_CONCURRENCY, DEFAULT_RESULT_CAP};
use crate::services::cache_service::DEFAULT_TTL_MINUTES;
use crate::util::TimeLocale;

pub const DEFAULT_TIMEOUT_SECS: u64 = 7;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub relay_url: Option<Url>,
    pub feeds_opml: Option<String>,
    pub result_cap: usize,
    pub per_feed_limit: Option<usize>,
    pub concurrency: usize,
    pub timeout: Duration,
    pub cache_ttl: chrono::Duration,
    pub locale: TimeLocale,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> NewsResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        // Default db_path is relative to executable directory
        let db_path = std::env::var("NEWS_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("newswire.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./newswire.db".to_string())
        });

        let relay_url = match non_empty_var("NEWS_RELAY_URL") {
            Some(raw) => Some(
                Url::parse(&raw).map_err(|e| NewsError::Config(format!("NEWS_RELAY_URL: {}", e)))?,
            ),
            None => None,
        };

        let result_cap: usize = parse_var("NEWS_RESULT_CAP", non_empty_var("NEWS_RESULT_CAP"))?
            .unwrap_or(DEFAULT_RESULT_CAP);
        let per_feed_limit = parse_var("NEWS_PER_FEED_LIMIT", non_empty_var("NEWS_PER_FEED_LIMIT"))?;
        let concurrency: usize = parse_var("NEWS_CONCURRENCY", non_empty_var("NEWS_CONCURRENCY"))?
            .unwrap_or(DEFAULT_CONCURRENCY);
        let timeout_secs: u64 = parse_var("NEWS_TIMEOUT_SECS", non_empty_var("NEWS_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let ttl_minutes: i64 =
            parse_var("NEWS_CACHE_TTL_MINUTES", non_empty_var("NEWS_CACHE_TTL_MINUTES"))?
                .unwrap_or(DEFAULT_TTL_MINUTES);
        let locale = parse_var("NEWS_LOCALE", non_empty_var("NEWS_LOCALE"))?.unwrap_or_default();

        if concurrency == 0 {
            return Err(NewsError::Config("NEWS_CONCURRENCY must be at least 1".to_string()));
        }
        if timeout_secs == 0 {
            return Err(NewsError::Config("NEWS_TIMEOUT_SECS must be at least 1".to_string()));
        }

        Ok(Self {
            db_path,
            relay_url,
            feeds_opml: non_empty_var("NEWS_FEEDS_OPML"),
            result_cap,
            per_feed_limit,
            concurrency,
            timeout: Duration::from_secs(timeout_secs),
            cache_ttl: chrono::Duration::minutes(ttl_minutes),
            locale,
        })
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            result_cap: self.result_cap,
            per_feed_limit: self.per_feed_limit,
            concurrency: self.concurrency,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<V>(name: &str, raw: Option<String>) -> NewsResult<Option<V>>
where
    V: FromStr,
    V::Err: std::fmt::Display,
{
    raw.map(|raw| {
        raw.parse::<V>()
            .map_err(|e| NewsError::Config(format!("{}={}: {}", name, raw, e)))
    })
    .transpose()
}
