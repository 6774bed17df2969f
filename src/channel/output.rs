use std::sync::Arc;

use super::{ChannelOpener, ChannelSnapshot, LazyChannel, MessageHandler};
use crate::pubsub::{FanOutReport, Notification, SubscriptionRegistry, Topic};

/// Менеджер канала вывода.
///
/// Каждый кадр без изменений рассылается слушателям одной фиксированной
/// темы вывода.
pub struct OutputChannel {
    channel: LazyChannel,
    topic: Topic,
}

impl OutputChannel {
    pub fn new(
        endpoint: impl AsRef<str>,
        topic: Topic,
        opener: ChannelOpener,
        registry: Arc<SubscriptionRegistry>,
    ) -> Self {
        let route_topic = topic.clone();
        let handler: MessageHandler = Arc::new(move |text: String| {
            deliver_output(&registry, &route_topic, text);
        });

        Self {
            channel: LazyChannel::new(endpoint, opener, handler),
            topic,
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
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

/// Рассылает текст слушателям темы вывода. Пустой список не ошибка.
pub fn deliver_output(
    registry: &SubscriptionRegistry,
    topic: &Topic,
    text: String,
) -> FanOutReport {
    registry.fan_out(topic.as_str(), &Notification::Output(Arc::from(text)))
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::pubsub::Listener;

    /// Тест проверяет, что текст приходит без изменений.
    #[test]
    fn test_deliver_output_verbatim() {
        let registry = SubscriptionRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.register(
            "outstream".into(),
            Listener::new(move |n| {
                sink.lock().push(n.output_text().map(str::to_string));
            }),
        );

        let text = "  [\"not\", \"decoded\"]\n".to_string();
        let report = deliver_output(&registry, &Topic::from("outstream"), text.clone());

        assert_eq!(report.delivered, 1);
        assert_eq!(*seen.lock(), vec![Some(text)]);
    }

    #[test]
    fn test_deliver_output_without_listeners() {
        let registry = SubscriptionRegistry::new();
        let report = deliver_output(&registry, &Topic::from("outstream"), "x".into());
        assert_eq!(report.attempted(), 0);
    }
}
