use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Process-wide configuration, constructed once at startup and passed
/// explicitly to each component.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub restriction: RestrictionConfig,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1/".to_string()
}

/// Tunables for the admission layer.
#[derive(Debug, Deserialize, Clone)]
pub struct RestrictionConfig {
    /// Token prepended (with `_`) to a source queue name to derive its
    /// restriction queue.
    #[serde(default = "default_queue_prefix")]
    pub restriction_queue_prefix: String,

    /// Upper bound on pop/admit cycles per reserve call. Without it a fully
    /// restricted queue would be rescanned to exhaustion on every call.
    #[serde(default = "default_batch_size")]
    pub restriction_queue_batch_size: u64,

    /// Safety TTL for `Concurrent` counters. None means held capacity never
    /// self-expires and a crashed worker leaks it permanently.
    #[serde(default)]
    pub concurrent_key_expire_seconds: Option<u64>,

    /// How many workers may drain restriction queues at the same time.
    #[serde(default = "default_scan_admission_max")]
    pub scan_admission_max: i64,

    /// TTL on the scan-admission counter so slots held by crashed workers
    /// free themselves.
    #[serde(default = "default_scan_admission_expire")]
    pub scan_admission_expire_seconds: u64,
}

impl Default for RestrictionConfig {
    fn default() -> Self {
        Self {
            restriction_queue_prefix: default_queue_prefix(),
            restriction_queue_batch_size: default_batch_size(),
            concurrent_key_expire_seconds: None,
            scan_admission_max: default_scan_admission_max(),
            scan_admission_expire_seconds: default_scan_admission_expire(),
        }
    }
}

fn default_queue_prefix() -> String {
    "restriction".to_string()
}

fn default_batch_size() -> u64 {
    1000
}

fn default_scan_admission_max() -> i64 {
    5
}

fn default_scan_admission_expire() -> u64 {
    60
}

/// Log output format for the tracing fmt layer.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let data = fs::read_to_string(p)?;
                let cfg: Self = toml::from_str(&data)?;
                Ok(cfg)
            }
            None => Ok(Self::default()),
        }
    }
}
