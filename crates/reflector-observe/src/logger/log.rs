use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::Layered, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::logger::{
    config::LoggerConfig,
    error::{LoggerError, LoggerResult},
    object::LoggerRfc3339,
};

type Base = Layered<EnvFilter, Registry>;

/// Text logger with RFC 3339 UTC timestamps.
pub fn logger_text(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer = fmt::layer()
        .with_ansi(cfg.should_use_color())
        .with_target(cfg.with_targets)
        .with_timer(LoggerRfc3339);
    install(cfg, layer)
}

/// JSON logger, one object per event.
pub fn logger_json(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_timer(LoggerRfc3339);
    install(cfg, layer)
}

/// journald logger (Linux only).
#[cfg(target_os = "linux")]
pub fn logger_journald(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer =
        tracing_journald::layer().map_err(|e| LoggerError::JournaldInitFailed(e.to_string()))?;
    install(cfg, layer)
}

#[cfg(not(target_os = "linux"))]
pub fn logger_journald(_cfg: &LoggerConfig) -> LoggerResult<()> {
    Err(LoggerError::JournaldNotSupported)
}

/// Stack `layer` on the level filter and install it as the global default.
fn install<L>(cfg: &LoggerConfig, layer: L) -> LoggerResult<()>
where
    L: Layer<Base> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(cfg.level.to_env_filter())
        .with(layer)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}
