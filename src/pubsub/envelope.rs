use std::sync::Arc;

use probus_error::DecodeError;
use serde_json::Value;

use super::{Topic, TopicNamespace};

/// Конверт с канала публикаций: тема и поля полезной нагрузки.
///
/// На проводе это JSON-массив `[topic, field1, field2, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    topic: Topic,
    payload: Vec<Value>,
}

impl Envelope {
    pub fn new(
        topic: impl Into<Topic>,
        payload: Vec<Value>,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Разбирает текстовый кадр канала публикаций.
    ///
    /// Первый элемент массива обязан быть строкой; остальные элементы
    /// сохраняются как есть.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| DecodeError::InvalidJson {
            reason: e.to_string(),
        })?;

        let Value::Array(mut items) = value else {
            return Err(DecodeError::NotAnArray);
        };
        if items.is_empty() {
            return Err(DecodeError::EmptyEnvelope);
        }

        let payload = items.split_off(1);
        match items.pop() {
            Some(Value::String(topic)) => Ok(Self::new(topic, payload)),
            Some(other) => Err(DecodeError::TopicNotString {
                found: json_kind(&other).to_string(),
            }),
            None => Err(DecodeError::EmptyEnvelope),
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn payload(&self) -> &[Value] {
        &self.payload
    }

    /// Переписывает тему на месте по правилу `namespace` и возвращает новую
    /// тему.
    pub fn rewrite_topic(
        &mut self,
        namespace: &TopicNamespace,
    ) -> &Topic {
        self.topic = namespace.to_internal_topic(self.topic.as_str());
        &self.topic
    }

    /// Обратное преобразование в JSON-массив.
    pub fn to_value(&self) -> Value {
        let mut items = Vec::with_capacity(self.payload.len() + 1);
        items.push(Value::String(self.topic.to_string()));
        items.extend(self.payload.iter().cloned());
        Value::Array(items)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// То, что получает слушатель при рассылке.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Сырой текст с канала вывода, без изменений.
    Output(Arc<str>),
    /// Конверт с канала публикаций, тема уже переписана.
    Published(Envelope),
    /// Рассылка без нагрузки: «что-то изменилось, обновитесь».
    Refresh,
}

impl Notification {
    pub fn output_text(&self) -> Option<&str> {
        match self {
            Self::Output(text) => Some(text),
            _ => None,
        }
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            Self::Published(envelope) => Some(envelope),
            _ => None,
        }
    }

    pub fn is_refresh(&self) -> bool {
        matches!(self, Self::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    /// Тест проверяет разбор конверта с объектом в нагрузке.
    #[test]
    fn test_decode_status_message() {
        let envelope = Envelope::decode(r#"["status", {"value": 42}]"#).unwrap();
        assert_eq!(envelope.topic(), &Topic::from("status"));
        assert_eq!(envelope.payload(), &[json!({"value": 42})]);
    }

    /// Тест проверяет, что конверт только с темой допустим.
    #[test]
    fn test_decode_topic_only() {
        let envelope = Envelope::decode(r#"["ping"]"#).unwrap();
        assert_eq!(envelope.topic(), &Topic::from("ping"));
        assert!(envelope.payload().is_empty());
    }

    /// Тест проверяет все виды некорректных кадров.
    #[rstest]
    #[case::not_json("status 42", "InvalidJson")]
    #[case::object(r#"{"topic": "status"}"#, "NotAnArray")]
    #[case::empty("[]", "EmptyEnvelope")]
    #[case::numeric_topic("[1, 2]", "TopicNotString")]
    #[case::null_topic("[null]", "TopicNotString")]
    fn test_decode_rejects_malformed(
        #[case] raw: &str,
        #[case] expected: &str,
    ) {
        let err = Envelope::decode(raw).unwrap_err();
        assert!(
            format!("{err:?}").starts_with(expected),
            "expected {expected}, got {err:?}"
        );
    }

    /// Тест проверяет, что переписывание темы не трогает нагрузку.
    #[test]
    fn test_rewrite_topic_keeps_payload() {
        let mut envelope = Envelope::decode(r#"["status", 1, "two"]"#).unwrap();
        let topic = envelope.rewrite_topic(&TopicNamespace::default()).clone();

        assert_eq!(topic, "prob.status");
        assert_eq!(envelope.to_value(), json!(["prob.status", 1, "two"]));
    }

    #[test]
    fn test_notification_accessors() {
        let out = Notification::Output(Arc::from("line\n"));
        assert_eq!(out.output_text(), Some("line\n"));
        assert!(out.envelope().is_none());
        assert!(Notification::Refresh.is_refresh());
    }
}
