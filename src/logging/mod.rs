//! Настройка `tracing` для бинарника и встраивающих приложений.
//!
//! Библиотечный код только порождает события; подписчик ставит
//! [`init_logging`].

pub mod config;
pub mod filters;
pub mod handle;
pub mod sinks;

use std::path::PathBuf;

pub use config::{FileSinkConfig, LogFormat, LoggingConfig};
pub use handle::LoggingHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Событие `tracing` на уровне [`probus_error::LogLevel`], обычно взятом
/// из `status_code().log_level()` ошибки.
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            ::probus_error::LogLevel::Trace => ::tracing::trace!($($arg)+),
            ::probus_error::LogLevel::Debug => ::tracing::debug!($($arg)+),
            ::probus_error::LogLevel::Info => ::tracing::info!($($arg)+),
            ::probus_error::LogLevel::Warn => ::tracing::warn!($($arg)+),
            ::probus_error::LogLevel::Error => ::tracing::error!($($arg)+),
        }
    };
}

pub(crate) use event_at;

/// Ошибки настройки логирования.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log level '{0}', expected one of trace, debug, info, warn, error")]
    InvalidLevel(String),
    #[error("Invalid logging configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Global tracing subscriber is already set: {0}")]
    AlreadyInitialized(String),
}

/// Ставит глобальный подписчик по конфигурации.
///
/// Конфигурация берётся как есть: `PROBUS_LOG_*` уже учтены в
/// [`crate::config::Settings::load`]. Порядок: проверка, фильтр (`RUST_LOG`
/// важнее конфигурации), консольный и файловый sink.
pub fn init_logging(mut config: LoggingConfig) -> Result<LoggingHandle, LoggingError> {
    config.validate()?;

    let env_filter = filters::build_filter_from_config(&config);
    let mut layers: Vec<sinks::BoxedLayer> = Vec::new();

    if config.console_enabled {
        layers.push(sinks::console::layer_with_config(&config));
    }

    let file_guard = match &config.file {
        Some(file) => {
            let (layer, guard) = sinks::file::layer_with_config(file, config.format)?;
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = %config.format,
        console_enabled = config.console_enabled,
        file_enabled = file_guard.is_some(),
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use probus_error::{ErrorExt, LookupError, StatusCode};
    use serial_test::serial;
    use tracing::Level;
    use tracing_subscriber::{layer::Context, Layer, Registry};

    use super::*;

    struct LevelRecorder(Arc<Mutex<Vec<Level>>>);

    impl<S: tracing::Subscriber> Layer<S> for LevelRecorder {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: Context<'_, S>,
        ) {
            self.0.lock().push(*event.metadata().level());
        }
    }

    /// Тест проверяет, что уровень события берётся из статус-кода ошибки.
    #[test]
    fn test_event_at_uses_status_level() {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let subscriber = Registry::default().with(LevelRecorder(levels.clone()));

        let timeout = LookupError::Timeout {
            endpoint: "outstream".to_string(),
        };
        let failed = LookupError::Status {
            endpoint: "outstream".to_string(),
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        tracing::subscriber::with_default(subscriber, || {
            event_at!(timeout.status_code().log_level(), error = %timeout, "lookup");
            event_at!(failed.status_code().log_level(), error = %failed, "lookup");
            event_at!(StatusCode::NotFound.log_level(), "missing");
        });

        assert_eq!(*levels.lock(), vec![Level::WARN, Level::ERROR, Level::DEBUG]);
    }

    #[test]
    #[serial]
    fn test_init_rejects_invalid_level() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        let err = init_logging(config).unwrap_err();
        assert!(matches!(err, LoggingError::InvalidLevel(_)));
        assert!(err.to_string().contains("loud"));
    }

    /// Тест проверяет, что `PROBUS_LOG_LEVEL` не перекрывает уровень,
    /// переданный в `init_logging` (например, из флага `--verbose`).
    #[test]
    #[serial]
    fn test_init_does_not_reapply_env_level() {
        std::env::set_var("PROBUS_LOG_LEVEL", "error");
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        let result = init_logging(config);
        std::env::remove_var("PROBUS_LOG_LEVEL");

        assert!(matches!(result, Err(LoggingError::InvalidLevel(level)) if level == "loud"));
    }
}
