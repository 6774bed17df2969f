use std::{path::Path, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    logging::LoggingConfig,
    pubsub::{TopicNamespace, DEFAULT_TOPIC_PREFIX},
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
pub const DEFAULT_OUTPUT_ENDPOINT: &str = "outstream";
pub const DEFAULT_PUBLISHER_ENDPOINT: &str = "pubstream";
pub const DEFAULT_OUTPUT_TOPIC: &str = "outstream";

/// Полная конфигурация процесса `probus`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Базовый URL удалённого процесса: справочный сервис и запросы
    pub base_url: Url,
    pub output_endpoint: String,
    pub publisher_endpoint: String,
    pub output_topic: String,
    /// Префикс тем канала публикаций; пустая строка отключает переписывание
    pub topic_prefix: String,
    /// Таймаут поиска адреса канала; без значения поиск не ограничен
    #[serde(default)]
    pub lookup_timeout_ms: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Собирает настройки: значения по умолчанию, затем необязательный
    /// файл (TOML/YAML/JSON по расширению), затем переменные окружения
    /// `PROBUS_*` (вложенные ключи через `__`, например
    /// `PROBUS_LOGGING__LEVEL`). Последними применяются `PROBUS_LOG_LEVEL` и
    /// `PROBUS_LOG_FORMAT`; флаги командной строки вызывающая сторона
    /// накладывает уже поверх результата.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("output_endpoint", DEFAULT_OUTPUT_ENDPOINT)?
            .set_default("publisher_endpoint", DEFAULT_PUBLISHER_ENDPOINT)?
            .set_default("output_topic", DEFAULT_OUTPUT_TOPIC)?
            .set_default("topic_prefix", DEFAULT_TOPIC_PREFIX)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let mut settings: Settings = builder
            .add_source(
                Environment::with_prefix("PROBUS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.logging.apply_env_overrides();
        Ok(settings)
    }

    /// Часть настроек, нужная диспетчеру.
    pub fn dispatch(&self) -> DispatchSettings {
        DispatchSettings {
            base_url: self.base_url.clone(),
            output_endpoint: self.output_endpoint.clone(),
            publisher_endpoint: self.publisher_endpoint.clone(),
            output_topic: self.output_topic.clone(),
            topic_prefix: self.topic_prefix.clone(),
            lookup_timeout: self.lookup_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Настройки диспетчера без слоя файлов и окружения.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub base_url: Url,
    pub output_endpoint: String,
    pub publisher_endpoint: String,
    pub output_topic: String,
    pub topic_prefix: String,
    pub lookup_timeout: Option<Duration>,
}

impl DispatchSettings {
    /// Значения по умолчанию для удалённого процесса по адресу `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            output_endpoint: DEFAULT_OUTPUT_ENDPOINT.to_string(),
            publisher_endpoint: DEFAULT_PUBLISHER_ENDPOINT.to_string(),
            output_topic: DEFAULT_OUTPUT_TOPIC.to_string(),
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            lookup_timeout: None,
        }
    }

    pub fn namespace(&self) -> TopicNamespace {
        TopicNamespace::with_prefix(&self.topic_prefix)
    }
}

#[cfg(test)]
mod tests {
    use std::{env, io::Write};

    use serial_test::serial;

    use super::*;
    use crate::logging::LogFormat;

    fn clear_env() {
        for (key, _) in env::vars() {
            if key.starts_with("PROBUS_") {
                env::remove_var(key);
            }
        }
    }

    /// Тест проверяет значения по умолчанию.
    #[test]
    #[serial]
    fn test_load_defaults() {
        clear_env();
        let settings = Settings::load(None).unwrap();

        assert_eq!(settings.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(settings.output_endpoint, "outstream");
        assert_eq!(settings.publisher_endpoint, "pubstream");
        assert_eq!(settings.output_topic, "outstream");
        assert_eq!(settings.topic_prefix, "prob.");
        assert_eq!(settings.lookup_timeout_ms, None);
        assert_eq!(settings.logging, LoggingConfig::default());
    }

    /// Тест проверяет загрузку из TOML-файла.
    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
base_url = "http://10.0.0.5:9000/workspace/"
topic_prefix = ""
lookup_timeout_ms = 2500

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.base_url.as_str(), "http://10.0.0.5:9000/workspace/");
        assert_eq!(settings.topic_prefix, "");
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);

        let dispatch = settings.dispatch();
        assert_eq!(dispatch.lookup_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(dispatch.namespace(), TopicNamespace::identity());
    }

    /// Тест проверяет, что окружение важнее файла и значений по умолчанию.
    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("PROBUS_BASE_URL", "http://192.168.1.2:8000/");
        env::set_var("PROBUS_LOOKUP_TIMEOUT_MS", "750");
        env::set_var("PROBUS_LOGGING__LEVEL", "warn");

        let settings = Settings::load(None);
        clear_env();
        let settings = settings.unwrap();

        assert_eq!(settings.base_url.as_str(), "http://192.168.1.2:8000/");
        assert_eq!(settings.lookup_timeout_ms, Some(750));
        assert_eq!(settings.logging.level, "warn");
    }

    /// Тест проверяет, что `PROBUS_LOG_LEVEL` применяется при загрузке, а
    /// уровень, выставленный после загрузки, остаётся в силе.
    #[test]
    #[serial]
    fn test_log_level_env_applied_at_load() {
        clear_env();
        env::set_var("PROBUS_LOGGING__LEVEL", "info");
        env::set_var("PROBUS_LOG_LEVEL", "ERROR");

        let settings = Settings::load(None);
        clear_env();
        let mut settings = settings.unwrap();
        assert_eq!(settings.logging.level, "error");

        settings.logging.level = "debug".to_string();
        assert!(settings.logging.validate().is_ok());
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    #[serial]
    fn test_missing_file_is_an_error() {
        clear_env();
        assert!(Settings::load(Some(Path::new("/nonexistent/probus.toml"))).is_err());
    }

    #[test]
    fn test_dispatch_settings_defaults() {
        let dispatch = DispatchSettings::new(Url::parse(DEFAULT_BASE_URL).unwrap());
        assert_eq!(dispatch.namespace().to_internal_topic("status"), "prob.status");
        assert_eq!(dispatch.lookup_timeout, None);
    }
}
