use std::sync::Arc;

use probus_error::{ProbusResult, ResultExt};
use tracing::debug;

use crate::{
    channel::{
        ChannelOpener, ChannelSnapshot, HttpDirectory, OutputChannel, PublisherChannel,
        WebSocketConnector,
    },
    config::DispatchSettings,
    pubsub::{
        broadcast_all, Callback, FanOutReport, Listener, Notification, Registration,
        SubscriptionRegistry, Topic,
    },
};

/// Диспетчер: реестр подписок и два лениво открываемых канала.
///
/// Первая подписка на тему вывода открывает канал вывода; первая подписка
/// на любую тему открывает канал публикаций. Каналы открываются не более
/// одного раза и автоматически не переоткрываются.
pub struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
    output: OutputChannel,
    publisher: PublisherChannel,
    output_topic: Topic,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Dispatcher {
    pub fn new(
        settings: &DispatchSettings,
        opener: ChannelOpener,
    ) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let output_topic = Topic::new(&settings.output_topic);

        let output = OutputChannel::new(
            &settings.output_endpoint,
            output_topic.clone(),
            opener.clone(),
            Arc::clone(&registry),
        );
        let publisher = PublisherChannel::new(
            &settings.publisher_endpoint,
            settings.namespace(),
            opener,
            Arc::clone(&registry),
        );

        Self {
            registry,
            output,
            publisher,
            output_topic,
        }
    }

    /// Диспетчер поверх HTTP-справочника и WebSocket на текущем tokio
    /// runtime.
    pub fn connect(settings: &DispatchSettings) -> ProbusResult<Self> {
        let directory =
            HttpDirectory::new(settings.base_url.clone()).with_timeout(settings.lookup_timeout);
        let opener = ChannelOpener::from_current(Arc::new(directory), Arc::new(WebSocketConnector))
            .context("Failed to create channel opener")?;
        Ok(Self::new(settings, opener))
    }

    /// Подписывает `callback` на `topic`.
    pub fn add_listener<F>(
        &self,
        topic: impl Into<Topic>,
        callback: F,
    ) -> Registration
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.subscribe(topic, Listener::new(callback))
    }

    /// Подписка, не продлевающая жизнь `callback`. После удаления владельца
    /// запись остаётся в списке и пропускается при рассылке.
    pub fn add_weak_listener(
        &self,
        topic: impl Into<Topic>,
        callback: &Callback,
    ) -> Registration {
        self.subscribe(topic, Listener::weak(callback))
    }

    /// Регистрирует запись и, если тема новая, лениво открывает каналы.
    ///
    /// Ошибки открытия сюда не возвращаются: они логируются и видны через
    /// [`Dispatcher::output_state`] и [`Dispatcher::publisher_state`].
    pub fn subscribe(
        &self,
        topic: impl Into<Topic>,
        listener: Listener,
    ) -> Registration {
        let topic = topic.into();
        if !listener.is_callable() {
            debug!(%topic, "Registering a listener that is already not callable");
        }

        let registration = self.registry.register(topic.clone(), listener);
        if registration.is_new_topic() {
            if topic == self.output_topic {
                self.output.ensure_open();
            }
            self.publisher.ensure_open();
        }
        registration
    }

    /// Устаревшая рассылка «обновитесь» по всем темам, кроме темы вывода.
    pub fn update_listeners(&self) -> FanOutReport {
        broadcast_all(&self.registry, self.output_topic.as_str())
    }

    pub fn output_state(&self) -> ChannelSnapshot {
        self.output.snapshot()
    }

    pub fn publisher_state(&self) -> ChannelSnapshot {
        self.publisher.snapshot()
    }

    /// Ручное переоткрытие канала вывода после закрытия или ошибки.
    pub fn reopen_output(&self) -> bool {
        self.output.reopen()
    }

    /// Ручное переоткрытие канала публикаций после закрытия или ошибки.
    pub fn reopen_publisher(&self) -> bool {
        self.publisher.reopen()
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn output_topic(&self) -> &Topic {
        &self.output_topic
    }
}
