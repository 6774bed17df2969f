use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::Mutex;
use tracing::{error, trace, warn};

use super::{Listener, Notification, Topic};

/// Результат регистрации слушателя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Тема встретилась впервые, список создан.
    NewTopic,
    /// Слушатель дописан в конец существующего списка.
    Appended,
}

impl Registration {
    pub fn is_new_topic(self) -> bool {
        matches!(self, Self::NewTopic)
    }
}

/// Итоги одной рассылки.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Слушатели, отработавшие без паники
    pub delivered: usize,
    /// Невызываемые записи, пропущенные с предупреждением
    pub skipped: usize,
    /// Слушатели, завершившиеся паникой
    pub failed: usize,
}

impl FanOutReport {
    pub fn merge(
        &mut self,
        other: FanOutReport,
    ) {
        self.delivered += other.delivered;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    pub fn attempted(&self) -> usize {
        self.delivered + self.skipped + self.failed
    }
}

/// Реестр подписок: тема → упорядоченный список слушателей.
///
/// - Порядок вставки равен порядку вызова.
/// - Дубликаты допустимы.
/// - Списки только растут: отписки нет.
///
/// Темы перечисляются в порядке первой регистрации.
///
/// Рассылка идёт по снимку списка, поэтому слушатель может вызвать
/// [`SubscriptionRegistry::register`] изнутри рассылки: новая запись не
/// повредит текущий обход и получит уже следующее сообщение.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    topics: DashMap<Topic, Vec<Listener>>,
    order: Mutex<Vec<Topic>>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Дописывает `listener` в список темы, создавая список при
    /// необходимости.
    pub fn register(
        &self,
        topic: Topic,
        listener: Listener,
    ) -> Registration {
        match self.topics.entry(topic) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().push(listener);
                Registration::Appended
            }
            Entry::Vacant(entry) => {
                // под блокировкой шарда, чтобы порядок совпадал с вставкой
                self.order.lock().push(entry.key().clone());
                entry.insert(vec![listener]);
                Registration::NewTopic
            }
        }
    }

    /// Копия списка слушателей темы.
    pub fn snapshot(
        &self,
        topic: &str,
    ) -> Option<Vec<Listener>> {
        self.topics.get(topic).map(|entry| entry.value().clone())
    }

    pub fn contains(
        &self,
        topic: &str,
    ) -> bool {
        self.topics.contains_key(topic)
    }

    pub fn listener_count(
        &self,
        topic: &str,
    ) -> usize {
        self.topics.get(topic).map_or(0, |entry| entry.len())
    }

    /// Все известные темы в порядке первой регистрации.
    pub fn topics(&self) -> Vec<Topic> {
        self.order.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Вызывает по порядку всех слушателей `topic`.
    ///
    /// Невызываемые записи пропускаются с предупреждением. Паника в одном
    /// слушателе перехватывается и не мешает остальным.
    pub fn fan_out(
        &self,
        topic: &str,
        notification: &Notification,
    ) -> FanOutReport {
        let mut report = FanOutReport::default();
        let Some(listeners) = self.snapshot(topic) else {
            trace!(topic, "No listeners registered, nothing to deliver");
            return report;
        };

        for (index, listener) in listeners.iter().enumerate() {
            let Some(callback) = listener.resolve() else {
                warn!(topic, index, "Listener is not callable, skipping");
                report.skipped += 1;
                continue;
            };

            match panic::catch_unwind(AssertUnwindSafe(|| callback(notification))) {
                Ok(()) => report.delivered += 1,
                Err(payload) => {
                    error!(
                        topic,
                        index,
                        panic = %panic_message(payload.as_ref()),
                        "Listener panicked during fan-out"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
