use std::sync::Arc;

use probus_error::{DecodeError, ErrorExt};
use tracing::trace;

use super::{ChannelOpener, ChannelSnapshot, LazyChannel, MessageHandler};
use crate::{
    logging::event_at,
    pubsub::{Envelope, FanOutReport, Notification, SubscriptionRegistry, TopicNamespace},
};

/// Чем закончилась маршрутизация одного кадра канала публикаций.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Конверт разослан слушателям переписанной темы.
    Delivered(FanOutReport),
    /// Для переписанной темы нет слушателей; кадр отброшен.
    Unrouted,
    /// Кадр не является конвертом; отброшен с предупреждением.
    Malformed(DecodeError),
}

/// Менеджер канала публикаций.
///
/// Кадр разбирается как конверт, тема переписывается по `TopicNamespace`,
/// конверт рассылается слушателям переписанной темы.
pub struct PublisherChannel {
    channel: LazyChannel,
    namespace: TopicNamespace,
}

impl PublisherChannel {
    pub fn new(
        endpoint: impl AsRef<str>,
        namespace: TopicNamespace,
        opener: ChannelOpener,
        registry: Arc<SubscriptionRegistry>,
    ) -> Self {
        let route_namespace = namespace.clone();
        let handler: MessageHandler = Arc::new(move |text: String| {
            route_published(&registry, &route_namespace, &text);
        });

        Self {
            channel: LazyChannel::new(endpoint, opener, handler),
            namespace,
        }
    }

    pub fn namespace(&self) -> &TopicNamespace {
        &self.namespace
    }

    pub fn ensure_open(&self) -> bool {
        self.channel.ensure_open()
    }

    pub fn reopen(&self) -> bool {
        self.channel.reopen()
    }

    pub fn is_established(&self) -> bool {
        self.channel.is_established()
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        self.channel.snapshot()
    }
}

/// Разбирает кадр, переписывает тему и рассылает конверт.
///
/// Ни один исход не является ошибкой для вызывающей стороны: некорректный
/// кадр логируется, кадр без слушателей тихо отбрасывается.
pub fn route_published(
    registry: &SubscriptionRegistry,
    namespace: &TopicNamespace,
    raw: &str,
) -> RouteOutcome {
    let mut envelope = match Envelope::decode(raw) {
        Ok(envelope) => envelope,
        Err(err) => {
            event_at!(
                err.status_code().log_level(),
                error = %err,
                code = %err.status_code(),
                "Dropping malformed publisher message"
            );
            return RouteOutcome::Malformed(err);
        }
    };

    let topic = envelope.rewrite_topic(namespace).clone();
    if !registry.contains(topic.as_str()) {
        trace!(%topic, "No listeners for publisher topic, dropping");
        return RouteOutcome::Unrouted;
    }

    RouteOutcome::Delivered(registry.fan_out(topic.as_str(), &Notification::Published(envelope)))
}
