use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ModelError, ModelResult, Selector};

/// Env var holding the background rescan interval.
pub const ENV_BACKGROUND_INTERVAL: &str = "BACKGROUND_REFLECTION_INTERVAL";

/// Env var holding the global parent selector.
pub const ENV_PARENT_SELECTOR: &str = "DEPLOYMENT_SELECTOR";

/// Env var holding the periodic re-check interval after a successful reconcile.
pub const ENV_RECHECK_INTERVAL: &str = "RECHECK_INTERVAL";

/// Env var holding the requeue delay applied to retryable errors.
pub const ENV_ERROR_BACKOFF: &str = "ERROR_BACKOFF";

const DEFAULT_BACKGROUND_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(30);

/// Values consumed by the reflection engine.
///
/// How they are loaded is up to the embedding process; [`ReflectorConfig::from_env`]
/// covers the common case. Durations serialize in humantime form (`5m`, `30s`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReflectorConfig {
    /// Interval between background rescans. Zero disables the rescan.
    #[serde(with = "humantime_serde")]
    pub background_interval: Duration,
    /// Global parent selector used by the rescan, in label selector syntax.
    ///
    /// Empty means "parents without labels" (see [`ReflectorConfig::parent_selector`]).
    pub parent_selector: String,
    /// Re-check interval requested after a successful reconcile. Zero means none.
    #[serde(with = "humantime_serde")]
    pub recheck_interval: Duration,
    /// Requeue delay requested after a retryable error.
    #[serde(with = "humantime_serde")]
    pub error_backoff: Duration,
}

impl Default for ReflectorConfig {
    fn default() -> Self {
        Self {
            background_interval: DEFAULT_BACKGROUND_INTERVAL,
            parent_selector: String::new(),
            recheck_interval: Duration::ZERO,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

impl ReflectorConfig {
    /// Background rescan interval, `None` if disabled.
    pub fn rescan_interval(&self) -> Option<Duration> {
        (!self.background_interval.is_zero()).then_some(self.background_interval)
    }

    /// Periodic re-check interval, `None` if disabled.
    pub fn recheck_after(&self) -> Option<Duration> {
        (!self.recheck_interval.is_zero()).then_some(self.recheck_interval)
    }

    /// Parse the global parent selector.
    ///
    /// An empty string yields [`Selector::unlabeled`].
    pub fn parent_selector(&self) -> ModelResult<Selector> {
        if self.parent_selector.trim().is_empty() {
            return Ok(Selector::unlabeled());
        }
        Selector::parse(&self.parent_selector)
    }

    /// Load from process environment, falling back to defaults for unset variables.
    pub fn from_env() -> ModelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> ModelResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(ENV_BACKGROUND_INTERVAL) {
            cfg.background_interval = duration_var(ENV_BACKGROUND_INTERVAL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PARENT_SELECTOR) {
            Selector::parse(&raw).map_err(|e| ModelError::InvalidConfig {
                key: ENV_PARENT_SELECTOR.to_string(),
                reason: e.to_string(),
            })?;
            cfg.parent_selector = raw;
        }
        if let Some(raw) = lookup(ENV_RECHECK_INTERVAL) {
            cfg.recheck_interval = duration_var(ENV_RECHECK_INTERVAL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ERROR_BACKOFF) {
            cfg.error_backoff = duration_var(ENV_ERROR_BACKOFF, &raw)?;
        }
        Ok(cfg)
    }
}

fn duration_var(key: &str, raw: &str) -> ModelResult<Duration> {
    parse_duration(raw).map_err(|e| ModelError::InvalidConfig {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a duration from the environment.
///
/// A bare number is seconds (`300`); anything else goes through humantime
/// (`30s`, `5m`, `1m 30s`, `250ms`).
pub fn parse_duration(raw: &str) -> ModelResult<Duration> {
    let s = raw.trim();
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse()
            .map(Duration::from_secs)
            .map_err(|e: std::num::ParseIntError| ModelError::InvalidDuration {
                value: raw.to_string(),
                reason: e.to_string(),
            });
    }
    humantime::parse_duration(s).map_err(|e| ModelError::InvalidDuration {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
