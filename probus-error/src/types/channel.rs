use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки дуплексного канала (установка соединения и приём кадров).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Не удалось установить соединение с адресом канала
    ConnectFailed { address: String, reason: String },
    /// Ошибка транспорта на уже открытом канале
    Transport { reason: String },
    /// Бинарный кадр не является UTF-8 текстом
    InvalidUtf8 { reason: String },
    /// Нет tokio runtime для запуска фоновых задач канала
    RuntimeUnavailable,
}

impl std::fmt::Display for ChannelError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::ConnectFailed { address, reason } => {
                write!(f, "Failed to open channel to {address}: {reason}")
            }
            Self::Transport { reason } => write!(f, "Channel transport error: {reason}"),
            Self::InvalidUtf8 { reason } => write!(f, "Channel frame is not UTF-8: {reason}"),
            Self::RuntimeUnavailable => write!(f, "No tokio runtime available for channel tasks"),
        }
    }
}

impl std::error::Error for ChannelError {}

impl ErrorExt for ChannelError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ConnectFailed { .. } => StatusCode::ConnectionFailed,
            Self::Transport { .. } => StatusCode::ChannelError,
            Self::InvalidUtf8 { .. } => StatusCode::InvalidUtf8,
            Self::RuntimeUnavailable => StatusCode::RuntimeUnavailable,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
