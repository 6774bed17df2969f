use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки одноразовых запросов request/response к удалённому процессу.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Сервер ответил неуспешным статусом
    Status {
        path: String,
        status: u16,
        reason: String,
    },
    /// Запрос не выполнен (сеть, чтение тела)
    Transport { path: String, reason: String },
    /// Путь не удалось присоединить к базовому URL
    InvalidUrl { path: String, reason: String },
    /// Тело ответа не удалось разобрать как JSON
    InvalidBody { path: String, reason: String },
}

impl std::fmt::Display for RequestError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Status {
                path,
                status,
                reason,
            } => write!(f, "Request to '{path}' failed: {status} {reason}"),
            Self::Transport { path, reason } => write!(f, "Request to '{path}' failed: {reason}"),
            Self::InvalidUrl { path, reason } => write!(f, "Invalid request path '{path}': {reason}"),
            Self::InvalidBody { path, reason } => {
                write!(f, "Response from '{path}' is not valid JSON: {reason}")
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl ErrorExt for RequestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Status { status: 404, .. } => StatusCode::NotFound,
            Self::Status { .. } | Self::Transport { .. } => StatusCode::RequestFailed,
            Self::InvalidUrl { .. } => StatusCode::InvalidArgs,
            Self::InvalidBody { .. } => StatusCode::ParseError,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err = RequestError::Status {
            path: "file/missing.py".to_string(),
            status: 404,
            reason: "Not Found".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::NotFound);
    }

    #[test]
    fn test_server_error_maps_to_request_failed() {
        let err = RequestError::Status {
            path: "command".to_string(),
            status: 500,
            reason: "Internal Server Error".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::RequestFailed);
        assert_eq!(
            err.to_string(),
            "Request to 'command' failed: 500 Internal Server Error"
        );
    }
}
