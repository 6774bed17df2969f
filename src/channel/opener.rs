use std::sync::Arc;

use probus_error::{ChannelError, ErrorExt, LookupError};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::info;

use super::{
    ChannelConnector, ChannelEvent, ChannelSnapshot, ChannelStatus, DirectoryResolver,
    FrameSource,
};
use crate::logging::event_at;

/// Обработчик сырых кадров канала.
pub type MessageHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Открывает каналы: поиск адреса, подключение, чтение кадров.
///
/// Каждое открытие выполняется фоновой задачей на сохранённом `Handle`.
/// Задачи не отслеживаются и не отменяются: вызывающая сторона получает
/// `JoinHandle`, но может его просто отбросить.
#[derive(Clone)]
pub struct ChannelOpener {
    directory: Arc<dyn DirectoryResolver>,
    connector: Arc<dyn ChannelConnector>,
    runtime: Handle,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ChannelOpener {
    pub fn new(
        directory: Arc<dyn DirectoryResolver>,
        connector: Arc<dyn ChannelConnector>,
        runtime: Handle,
    ) -> Self {
        Self {
            directory,
            connector,
            runtime,
        }
    }

    /// Открыватель на текущем tokio runtime.
    pub fn from_current(
        directory: Arc<dyn DirectoryResolver>,
        connector: Arc<dyn ChannelConnector>,
    ) -> Result<Self, ChannelError> {
        let runtime = Handle::try_current().map_err(|_| ChannelError::RuntimeUnavailable)?;
        Ok(Self::new(directory, connector, runtime))
    }

    /// Запускает открытие канала `endpoint`.
    ///
    /// `status` уже должен быть переведён в `Opening`; задача сама выставит
    /// `Open`, `Closed`, `Errored` или `Failed`. Каждый принятый кадр
    /// передаётся в `on_message` без изменений.
    pub fn open(
        &self,
        endpoint: &str,
        status: Arc<ChannelStatus>,
        on_message: MessageHandler,
    ) -> JoinHandle<()> {
        let directory = Arc::clone(&self.directory);
        let connector = Arc::clone(&self.connector);
        let endpoint = endpoint.to_string();

        self.runtime.spawn(async move {
            let address = match directory.resolve(&endpoint).await {
                Ok(address) => address,
                Err(err) => {
                    log_lookup_failure(&err);
                    status.mark_failed(err.to_string());
                    return;
                }
            };

            let source = match connector.connect(&address).await {
                Ok(source) => source,
                Err(err) => {
                    let code = err.status_code();
                    event_at!(
                        code.log_level(),
                        %endpoint,
                        %address,
                        error = %err,
                        retryable = code.is_retryable(),
                        "Failed to open channel"
                    );
                    status.mark_failed(err.to_string());
                    return;
                }
            };

            status.mark_open();
            info!(%endpoint, %address, "Channel opened");
            pump(&endpoint, source, &status, &on_message).await;
        })
    }
}

/// Читает кадры до закрытия или ошибки транспорта.
async fn pump(
    endpoint: &str,
    mut source: Box<dyn FrameSource>,
    status: &ChannelStatus,
    on_message: &MessageHandler,
) {
    loop {
        match source.next_event().await {
            Some(ChannelEvent::Frame(text)) => on_message(text),
            Some(ChannelEvent::Error(err @ ChannelError::InvalidUtf8 { .. })) => {
                event_at!(
                    err.status_code().log_level(),
                    endpoint,
                    error = %err,
                    "Dropping undecodable frame"
                );
            }
            Some(ChannelEvent::Error(err)) => {
                let code = err.status_code();
                event_at!(
                    code.log_level(),
                    endpoint,
                    error = %err,
                    retryable = code.is_retryable(),
                    "Channel error"
                );
                status.mark_errored(err.to_string());
                return;
            }
            None => {
                info!(endpoint, "Channel closed");
                status.mark_closed();
                return;
            }
        }
    }
}

fn log_lookup_failure(err: &LookupError) {
    let code = err.status_code();
    match err {
        LookupError::Status {
            endpoint,
            status,
            reason,
        } => event_at!(
            code.log_level(),
            %endpoint,
            status = *status,
            %reason,
            retryable = code.is_retryable(),
            "Channel address lookup failed"
        ),
        other => event_at!(
            code.log_level(),
            endpoint = other.endpoint(),
            error = %other,
            retryable = code.is_retryable(),
            "Channel address lookup failed"
        ),
    }
}

/// Канал, который открывается лениво и не более одного раза.
///
/// Общая часть менеджеров канала вывода и канала публикаций: имя endpoint,
/// разделяемое состояние и обработчик кадров.
pub struct LazyChannel {
    endpoint: Arc<str>,
    status: Arc<ChannelStatus>,
    opener: ChannelOpener,
    handler: MessageHandler,
}

impl LazyChannel {
    pub fn new(
        endpoint: impl AsRef<str>,
        opener: ChannelOpener,
        handler: MessageHandler,
    ) -> Self {
        Self {
            endpoint: Arc::from(endpoint.as_ref()),
            status: Arc::new(ChannelStatus::new()),
            opener,
            handler,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Запускает первое открытие. Флаг «установлен» выставляется до начала
    /// поиска адреса, поэтому повторные вызовы ничего не делают, даже если
    /// открытие в итоге не удалось.
    pub fn ensure_open(&self) -> bool {
        if !self.status.begin_first_open() {
            return false;
        }
        info!(endpoint = %self.endpoint, "Opening channel");
        self.spawn();
        true
    }

    /// Повторное открытие вручную; возможно только из конечного состояния.
    pub fn reopen(&self) -> bool {
        if !self.status.begin_reopen() {
            return false;
        }
        info!(endpoint = %self.endpoint, "Reopening channel");
        self.spawn();
        true
    }

    pub fn is_established(&self) -> bool {
        self.status.state().is_established()
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        self.status.snapshot()
    }

    fn spawn(&self) {
        // задача не отслеживается
        let _ = self.opener.open(
            &self.endpoint,
            Arc::clone(&self.status),
            Arc::clone(&self.handler),
        );
    }
}
