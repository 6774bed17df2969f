use std::time::Duration;

use async_trait::async_trait;
use probus_error::LookupError;
use tracing::{debug, trace};
use url::Url;

/// Справочный сервис: переводит имя endpoint в адрес дуплексного канала.
#[async_trait]
pub trait DirectoryResolver: Send + Sync {
    /// Выполняет один поиск. Повторов нет.
    async fn resolve(
        &self,
        endpoint: &str,
    ) -> Result<String, LookupError>;
}

/// Справочный сервис поверх HTTP: `GET <base_url>/<endpoint>` возвращает
/// адрес канала текстом в теле ответа.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl HttpDirectory {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: Url,
    ) -> Self {
        Self {
            client,
            base_url: with_trailing_slash(base_url),
            timeout: None,
        }
    }

    /// Ограничивает время одного поиска. По умолчанию таймаута нет.
    pub fn with_timeout(
        mut self,
        timeout: Option<Duration>,
    ) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn lookup(
        &self,
        endpoint: &str,
    ) -> Result<String, LookupError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| LookupError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        trace!(endpoint, %url, "Resolving channel address");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| LookupError::Transport {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let address = parse_address(endpoint, &body)?;
        debug!(endpoint, address, "Channel address resolved");
        Ok(address)
    }
}

#[async_trait]
impl DirectoryResolver for HttpDirectory {
    async fn resolve(
        &self,
        endpoint: &str,
    ) -> Result<String, LookupError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.lookup(endpoint))
                .await
                .map_err(|_| LookupError::Timeout {
                    endpoint: endpoint.to_string(),
                })?,
            None => self.lookup(endpoint).await,
        }
    }
}

/// Тело ответа должно быть абсолютным `ws://` или `wss://` URL (пробелы по
/// краям допустимы).
fn parse_address(
    endpoint: &str,
    body: &str,
) -> Result<String, LookupError> {
    let address = body.trim();
    let valid = Url::parse(address).is_ok_and(|url| matches!(url.scheme(), "ws" | "wss"));
    if !valid {
        return Err(LookupError::InvalidAddress {
            endpoint: endpoint.to_string(),
            address: address.to_string(),
        });
    }
    Ok(address.to_string())
}

/// `Url::join` заменяет последний сегмент пути, если он не оканчивается на
/// `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let dir = HttpDirectory::new(Url::parse("http://127.0.0.1:8000/workspace").unwrap());
        assert_eq!(dir.base_url().as_str(), "http://127.0.0.1:8000/workspace/");
        assert_eq!(
            dir.base_url().join("outstream").unwrap().as_str(),
            "http://127.0.0.1:8000/workspace/outstream"
        );
    }

    #[test]
    fn test_parse_address_trims_body() {
        assert_eq!(
            parse_address("outstream", "  ws://127.0.0.1:9001/out\n").unwrap(),
            "ws://127.0.0.1:9001/out"
        );
    }

    #[test]
    fn test_parse_address_accepts_wss() {
        assert_eq!(
            parse_address("pubstream", "wss://model.example.com/pub").unwrap(),
            "wss://model.example.com/pub"
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("  \n")]
    #[case::not_a_url("port 9001")]
    #[case::http("http://127.0.0.1:9001/pub")]
    #[case::mailto("mailto:model@example.com")]
    fn test_parse_address_rejects(#[case] body: &str) {
        let err = parse_address("pubstream", body).unwrap_err();
        assert!(matches!(err, LookupError::InvalidAddress { .. }));
        assert_eq!(err.endpoint(), "pubstream");
    }
}
