use std::{
    fmt,
    sync::{Arc, Weak},
};

use super::Notification;

/// Функция обратного вызова слушателя.
pub type Callback = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Слабая ссылка на функцию обратного вызова.
pub type WeakCallback = Weak<dyn Fn(&Notification) + Send + Sync>;

/// Запись в списке подписчиков темы.
///
/// Сильная запись вызываема всегда. Слабая, пока жив владелец функции;
/// после этого запись остаётся в списке, но при рассылке пропускается с
/// предупреждением.
#[derive(Clone)]
pub enum Listener {
    Strong(Callback),
    Weak(WeakCallback),
}

impl Listener {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        Self::Strong(Arc::new(callback))
    }

    /// Слушатель, не продлевающий жизнь `callback`.
    pub fn weak(callback: &Callback) -> Self {
        Self::Weak(Arc::downgrade(callback))
    }

    /// Возвращает вызываемую функцию или `None`, если запись больше не
    /// вызываема.
    pub fn resolve(&self) -> Option<Callback> {
        match self {
            Self::Strong(callback) => Some(Arc::clone(callback)),
            Self::Weak(callback) => callback.upgrade(),
        }
    }

    pub fn is_callable(&self) -> bool {
        match self {
            Self::Strong(_) => true,
            Self::Weak(callback) => callback.strong_count() > 0,
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Strong(_) => f.write_str("Listener::Strong"),
            Self::Weak(_) if self.is_callable() => f.write_str("Listener::Weak"),
            Self::Weak(_) => f.write_str("Listener::Weak(dropped)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_strong_listener_resolves() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let listener = Listener::new(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let callback = listener.resolve().expect("strong listener must resolve");
        callback(&Notification::Refresh);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    /// Тест проверяет, что слабая запись перестаёт быть вызываемой после
    /// удаления владельца.
    #[test]
    fn test_weak_listener_stops_resolving_after_drop() {
        let callback: Callback = Arc::new(|_: &Notification| {});
        let listener = Listener::weak(&callback);

        assert!(listener.is_callable());
        assert!(listener.resolve().is_some());

        drop(callback);
        assert!(!listener.is_callable());
        assert!(listener.resolve().is_none());
        assert_eq!(format!("{listener:?}"), "Listener::Weak(dropped)");
    }
}
