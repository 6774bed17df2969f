use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок диспетчера (object-safe): статус-код и downcast.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки. По умолчанию [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`](std::any::Any) для downcast.
    fn as_any(&self) -> &dyn Any;
}
