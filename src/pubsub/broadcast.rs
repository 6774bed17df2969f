use tracing::debug;

use super::{FanOutReport, Notification, SubscriptionRegistry};

/// Рассылает [`Notification::Refresh`] по всем темам, кроме `output_topic`,
/// в порядке их первой регистрации.
///
/// Слушатели канала вывода ждут текст и не должны вызываться без нагрузки.
pub fn broadcast_all(
    registry: &SubscriptionRegistry,
    output_topic: &str,
) -> FanOutReport {
    let mut report = FanOutReport::default();
    let mut topics = 0usize;

    for topic in registry.topics() {
        if topic == output_topic {
            continue;
        }
        topics += 1;
        report.merge(registry.fan_out(topic.as_str(), &Notification::Refresh));
    }

    debug!(
        topics,
        delivered = report.delivered,
        skipped = report.skipped,
        failed = report.failed,
        "Legacy broadcast finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::pubsub::Listener;

    fn counter(hits: &Arc<AtomicUsize>) -> Listener {
        let hits = hits.clone();
        Listener::new(move |n: &Notification| {
            assert!(n.is_refresh());
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    /// Тест проверяет, что слушатели канала вывода не вызываются, а все
    /// остальные получают `Refresh`.
    #[test]
    fn test_broadcast_skips_output_topic() {
        let registry = SubscriptionRegistry::new();
        let refreshed = Arc::new(AtomicUsize::new(0));
        let output_hits = Arc::new(AtomicUsize::new(0));

        let out = output_hits.clone();
        registry.register(
            "outstream".into(),
            Listener::new(move |_| {
                out.fetch_add(1, Ordering::SeqCst);
            }),
        );
        registry.register("prob.status".into(), counter(&refreshed));
        registry.register("prob.status".into(), counter(&refreshed));
        registry.register("prob.files".into(), counter(&refreshed));

        let report = broadcast_all(&registry, "outstream");

        assert_eq!(report.delivered, 3);
        assert_eq!(refreshed.load(Ordering::SeqCst), 3);
        assert_eq!(output_hits.load(Ordering::SeqCst), 0);
    }

    /// Тест проверяет, что темы обходятся в порядке первой регистрации, а не
    /// по алфавиту.
    #[test]
    fn test_broadcast_follows_registration_order() {
        let registry = SubscriptionRegistry::new();
        let visited = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for topic in ["prob.zeta", "outstream", "prob.alpha", "prob.mid"] {
            let visited = visited.clone();
            registry.register(
                topic.into(),
                Listener::new(move |_| visited.lock().push(topic)),
            );
        }

        broadcast_all(&registry, "outstream");
        assert_eq!(*visited.lock(), vec!["prob.zeta", "prob.alpha", "prob.mid"]);
    }

    #[test]
    fn test_broadcast_on_empty_registry() {
        let registry = SubscriptionRegistry::new();
        assert_eq!(broadcast_all(&registry, "outstream").attempted(), 0);
    }
}
