use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки поиска адреса канала через справочный сервис.
///
/// Поиск выполняется один раз; ни один из вариантов не повторяется
/// автоматически.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Справочный сервис ответил неуспешным статусом
    Status {
        endpoint: String,
        status: u16,
        reason: String,
    },
    /// Запрос не дошёл до сервиса или ответ не прочитан
    Transport { endpoint: String, reason: String },
    /// Истёк необязательный таймаут поиска
    Timeout { endpoint: String },
    /// Ответ получен, но не является адресом канала
    InvalidAddress { endpoint: String, address: String },
}

impl LookupError {
    /// Имя endpoint, для которого выполнялся поиск.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Status { endpoint, .. }
            | Self::Transport { endpoint, .. }
            | Self::Timeout { endpoint }
            | Self::InvalidAddress { endpoint, .. } => endpoint,
        }
    }
}

impl std::fmt::Display for LookupError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Status {
                endpoint,
                status,
                reason,
            } => write!(f, "Lookup of '{endpoint}' failed: {status} {reason}"),
            Self::Transport { endpoint, reason } => {
                write!(f, "Lookup of '{endpoint}' failed: {reason}")
            }
            Self::Timeout { endpoint } => write!(f, "Lookup of '{endpoint}' timed out"),
            Self::InvalidAddress { endpoint, address } => {
                write!(f, "Lookup of '{endpoint}' returned an invalid address: '{address}'")
            }
        }
    }
}

impl std::error::Error for LookupError {}

impl ErrorExt for LookupError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Status { .. } | Self::Transport { .. } => StatusCode::LookupFailed,
            Self::Timeout { .. } => StatusCode::Timeout,
            Self::InvalidAddress { .. } => StatusCode::InvalidAddress,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что статус и причина попадают в текст ошибки.
    #[test]
    fn test_status_display() {
        let err = LookupError::Status {
            endpoint: "outstream".to_string(),
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Lookup of 'outstream' failed: 503 Service Unavailable"
        );
        assert_eq!(err.status_code(), StatusCode::LookupFailed);
        assert_eq!(err.endpoint(), "outstream");
    }

    /// Тест проверяет, что неверный адрес не считается повторяемым, а
    /// таймаут считается.
    #[test]
    fn test_retryable_by_variant() {
        let invalid = LookupError::InvalidAddress {
            endpoint: "pubstream".to_string(),
            address: "http://127.0.0.1:9001/pub".to_string(),
        };
        assert_eq!(invalid.status_code(), StatusCode::InvalidAddress);
        assert!(!invalid.status_code().is_retryable());

        let timeout = LookupError::Timeout {
            endpoint: "pubstream".to_string(),
        };
        assert!(timeout.status_code().is_retryable());
    }
}
