use std::fs;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};

use super::{fmt_layer, BoxedLayer};
use crate::logging::{FileSinkConfig, LogFormat, LoggingError};

/// Файловый слой с ежедневной ротацией и неблокирующей записью.
///
/// Записи сбрасываются на диск, пока жив возвращённый `WorkerGuard`.
pub fn layer_with_config(
    config: &FileSinkConfig,
    format: LogFormat,
) -> Result<(BoxedLayer, WorkerGuard), LoggingError> {
    fs::create_dir_all(&config.dir).map_err(|source| LoggingError::LogDir {
        path: config.dir.clone(),
        source,
    })?;

    let appender = rolling::daily(&config.dir, &config.filename);
    let (writer, guard) = non_blocking(appender);

    Ok((fmt_layer(format, false, writer), guard))
}
