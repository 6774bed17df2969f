use std::time::Instant;

use tracing_appender::non_blocking::WorkerGuard;

/// Управляет жизненным циклом логирования.
///
/// Пока handle жив, файловый sink продолжает писать. `shutdown` сбрасывает
/// буферы явно; простое удаление handle делает то же самое молча.
#[derive(Default)]
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
}

impl LoggingHandle {
    pub fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self { file_guard }
    }

    pub fn has_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Сбрасывает буферы файлового sink.
    pub fn shutdown(mut self) {
        let Some(guard) = self.file_guard.take() else {
            return;
        };

        tracing::info!("Flushing file log sink");
        let start = Instant::now();
        drop(guard);
        tracing::debug!(
            shutdown_duration_ms = start.elapsed().as_millis() as u64,
            "Logging shutdown completed"
        );
    }
}

impl std::fmt::Debug for LoggingHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LoggingHandle")
            .field("file_sink", &self.has_file_sink())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_without_file_sink() {
        let handle = LoggingHandle::default();
        assert!(!handle.has_file_sink());
        handle.shutdown();
    }

    #[test]
    fn test_shutdown_flushes_guard() {
        let dir = tempfile::tempdir().unwrap();
        let (_writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir.path(), "x.log"));
        let handle = LoggingHandle::new(Some(guard));
        assert!(handle.has_file_sink());
        assert_eq!(format!("{handle:?}"), "LoggingHandle { file_sink: true }");
        handle.shutdown();
    }
}
