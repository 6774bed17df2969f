use std::{borrow::Borrow, fmt, sync::Arc};

/// Префикс пространства имён, который получает каждая тема, пришедшая по
/// каналу публикаций.
pub const DEFAULT_TOPIC_PREFIX: &str = "prob.";

/// Тема, на которую подписываются слушатели.
///
/// Дешёво клонируется (`Arc<str>` внутри) и сравнивается по содержимому.
/// `Borrow<str>` позволяет искать в реестре по `&str` без аллокации.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(Arc<str>);

impl Topic {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Topic {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Topic {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Topic {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&String> for Topic {
    fn from(s: &String) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for Topic {
    fn eq(
        &self,
        other: &str,
    ) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Topic {
    fn eq(
        &self,
        other: &&str,
    ) -> bool {
        &*self.0 == *other
    }
}

/// Правило перевода «сырых» тем канала публикаций во внутренние темы
/// реестра.
///
/// Сейчас правило одно: приписать префикс. `TopicNamespace::identity()`
/// отключает переписывание, не затрагивая логику маршрутизации.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicNamespace {
    prefix: Option<Arc<str>>,
}

impl TopicNamespace {
    /// Пространство имён с заданным префиксом. Пустой префикс равносилен
    /// [`TopicNamespace::identity`].
    pub fn with_prefix(prefix: impl AsRef<str>) -> Self {
        let prefix = prefix.as_ref();
        Self {
            prefix: (!prefix.is_empty()).then(|| Arc::from(prefix)),
        }
    }

    /// Темы проходят без изменений.
    pub fn identity() -> Self {
        Self { prefix: None }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Переводит сырую тему с канала публикаций в ключ реестра.
    ///
    /// Префикс приписывается всегда, даже если тема уже начинается с него:
    /// удалённый процесс присылает темы без префикса.
    pub fn to_internal_topic(
        &self,
        raw: &str,
    ) -> Topic {
        match &self.prefix {
            Some(prefix) => Topic::from(format!("{prefix}{raw}")),
            None => Topic::new(raw),
        }
    }
}

impl Default for TopicNamespace {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_TOPIC_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    /// Тест проверяет правило переписывания для разных префиксов.
    #[rstest]
    #[case::default_prefix(TopicNamespace::default(), "status", "prob.status")]
    #[case::nested_topic(TopicNamespace::default(), "driver.top", "prob.driver.top")]
    #[case::already_prefixed(TopicNamespace::default(), "prob.x", "prob.prob.x")]
    #[case::custom_prefix(TopicNamespace::with_prefix("ns/"), "a", "ns/a")]
    #[case::identity(TopicNamespace::identity(), "status", "status")]
    #[case::empty_prefix(TopicNamespace::with_prefix(""), "status", "status")]
    fn test_to_internal_topic(
        #[case] ns: TopicNamespace,
        #[case] raw: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(ns.to_internal_topic(raw), expected);
    }

    /// Тест проверяет, что `Topic` можно искать в `HashMap` по `&str`.
    #[test]
    fn test_topic_borrow_lookup() {
        let mut map = HashMap::new();
        map.insert(Topic::from("outstream"), 1);
        assert_eq!(map.get("outstream"), Some(&1));
        assert_eq!(map.get("prob.outstream"), None);
    }

    /// Тест проверяет равенство тем, созданных из разных строковых типов.
    #[test]
    fn test_topic_equality_across_sources() {
        let a = Topic::from("prob.status");
        let b = Topic::from(String::from("prob.status"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "prob.status");
    }
}
