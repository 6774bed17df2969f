use std::fmt;

/// Коды статуса для категоризации ошибок диспетчера.
///
/// # Диапазоны:
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки данных
/// - 6xxx: Сеть / каналы
/// - 8xxx: Протокольные ошибки (декодирование конвертов)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 1xxx: Общие ошибки ===
    Internal = 1003,
    InvalidArgs = 1004,
    RuntimeUnavailable = 1005,

    // === 2xxx: Ошибки данных ===
    NotFound = 2000,

    // === 6xxx: Сеть/каналы ===
    Timeout = 6002,
    ConnectionFailed = 6004,
    LookupFailed = 6005,
    ChannelError = 6006,
    RequestFailed = 6007,
    InvalidAddress = 6008,

    // === 8xxx: Протокол ===
    InvalidUtf8 = 8001,
    ParseError = 8002,
    DecodingError = 8003,
}

/// Рекомендуемый уровень логирования для ошибки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Возвращает `true`, если операцию с этим кодом имеет смысл повторить
    /// вручную (например, через `reopen_*` у диспетчера).
    ///
    /// Сам диспетчер ничего не повторяет автоматически.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout
                | Self::ConnectionFailed
                | Self::LookupFailed
                | Self::ChannelError
                | Self::RequestFailed
        )
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::NotFound => LogLevel::Debug,
            Self::InvalidUtf8
            | Self::ParseError
            | Self::DecodingError
            | Self::ChannelError
            | Self::InvalidAddress
            | Self::Timeout => LogLevel::Warn,
            Self::Internal
            | Self::InvalidArgs
            | Self::RuntimeUnavailable
            | Self::LookupFailed
            | Self::ConnectionFailed
            | Self::RequestFailed => LogLevel::Error,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
