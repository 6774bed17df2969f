use std::{env, fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use super::LoggingError;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Формат строк лога.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

/// Файловый sink с ежедневной ротацией.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FileSinkConfig {
    pub dir: PathBuf,
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            filename: default_filename(),
        }
    }
}

fn default_filename() -> String {
    "probus.log".to_string()
}

fn default_true() -> bool {
    true
}

/// Конфигурация логирования.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Уровень для crate `probus` (trace, debug, info, warn, error)
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub console_enabled: bool,
    #[serde(default = "default_true")]
    pub with_ansi: bool,
    /// Дополнительные директивы `EnvFilter`, например `reqwest=warn`
    #[serde(default)]
    pub directives: Vec<String>,
    #[serde(default)]
    pub file: Option<FileSinkConfig>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            console_enabled: true,
            with_ansi: true,
            directives: Vec::new(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// `PROBUS_LOG_LEVEL` и `PROBUS_LOG_FORMAT` перекрывают значения из
    /// конфигурации. Нераспознанный формат игнорируется.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("PROBUS_LOG_LEVEL") {
            self.level = level.trim().to_ascii_lowercase();
        }
        if let Some(format) = env::var("PROBUS_LOG_FORMAT")
            .ok()
            .and_then(|f| LogFormat::parse(&f))
        {
            self.format = format;
        }
    }

    /// Приводит уровень к нижнему регистру без пробелов и проверяет
    /// конфигурацию.
    pub fn validate(&mut self) -> Result<(), LoggingError> {
        self.level = self.level.trim().to_ascii_lowercase();
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }
        if let Some(file) = &self.file {
            if file.filename.trim().is_empty() {
                return Err(LoggingError::InvalidConfig(
                    "file sink filename must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Директива для `EnvFilter`: внешние crate на `warn`, `probus` на
    /// заданном уровне, затем дополнительные директивы.
    pub fn build_filter_directive(&self) -> String {
        let mut parts = vec![
            "warn".to_string(),
            format!("probus={}", self.level),
        ];
        parts.extend(self.directives.iter().cloned());
        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.build_filter_directive(), "warn,probus=info");
    }

    #[test]
    fn test_directive_includes_extra_directives() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            directives: vec!["tokio_tungstenite=info".to_string()],
            ..Default::default()
        };
        assert_eq!(
            config.build_filter_directive(),
            "warn,probus=debug,tokio_tungstenite=info"
        );
    }

    /// Тест проверяет, что уровень из файла нормализуется так же, как из
    /// переменной окружения.
    #[rstest]
    #[case("INFO", "info")]
    #[case(" Debug ", "debug")]
    #[case("warn", "warn")]
    fn test_level_is_normalized(
        #[case] level: &str,
        #[case] expected: &str,
    ) {
        let mut config = LoggingConfig {
            level: level.to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.level, expected);
        assert_eq!(config.build_filter_directive(), format!("warn,probus={expected}"));
    }

    #[rstest]
    #[case("verbose")]
    #[case("")]
    fn test_invalid_level(#[case] level: &str) {
        let mut config = LoggingConfig {
            level: level.to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LoggingError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_empty_filename_rejected() {
        let mut config = LoggingConfig {
            file: Some(FileSinkConfig {
                dir: PathBuf::from("logs"),
                filename: " ".to_string(),
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LoggingError::InvalidConfig(_))
        ));
    }

    /// Тест проверяет, что переменные окружения перекрывают конфигурацию.
    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var("PROBUS_LOG_LEVEL", "DEBUG");
        env::set_var("PROBUS_LOG_FORMAT", "json");

        let mut config = LoggingConfig::default();
        config.apply_env_overrides();

        env::remove_var("PROBUS_LOG_LEVEL");
        env::remove_var("PROBUS_LOG_FORMAT");

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_unknown_format_override_is_ignored() {
        env::set_var("PROBUS_LOG_FORMAT", "xml");
        let mut config = LoggingConfig::default();
        config.apply_env_overrides();
        env::remove_var("PROBUS_LOG_FORMAT");

        assert_eq!(config.format, LogFormat::Compact);
    }
}
