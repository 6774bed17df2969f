use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки декодирования конверта с канала публикаций.
///
/// Сообщение с такой ошибкой логируется и отбрасывается; диспетчер
/// продолжает работу.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Кадр не является JSON
    InvalidJson { reason: String },
    /// JSON корректен, но это не массив
    NotAnArray,
    /// Пустой массив: нет элемента с темой
    EmptyEnvelope,
    /// Первый элемент массива не строка
    TopicNotString { found: String },
}

impl std::fmt::Display for DecodeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::InvalidJson { reason } => write!(f, "Envelope is not valid JSON: {reason}"),
            Self::NotAnArray => write!(f, "Envelope is not a JSON array"),
            Self::EmptyEnvelope => write!(f, "Envelope is empty, topic element is missing"),
            Self::TopicNotString { found } => {
                write!(f, "Envelope topic must be a string, found {found}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl ErrorExt for DecodeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson { .. } => StatusCode::ParseError,
            Self::NotAnArray | Self::EmptyEnvelope | Self::TopicNotString { .. } => {
                StatusCode::DecodingError
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
