use async_trait::async_trait;
use futures::StreamExt;
use probus_error::ChannelError;
use tokio::net::TcpStream;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::trace;

/// Событие открытого канала.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Один логический кадр текста.
    Frame(String),
    /// Ошибка транспорта; после неё канал больше не читается.
    Error(ChannelError),
}

/// Источник кадров открытого канала. `None` означает, что канал закрыт.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_event(&mut self) -> Option<ChannelEvent>;
}

/// Устанавливает дуплексный канал по адресу, полученному от справочного
/// сервиса.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn connect(
        &self,
        address: &str,
    ) -> Result<Box<dyn FrameSource>, ChannelError>;
}

/// Канал поверх WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl ChannelConnector for WebSocketConnector {
    async fn connect(
        &self,
        address: &str,
    ) -> Result<Box<dyn FrameSource>, ChannelError> {
        let (stream, response) = tokio_tungstenite::connect_async(address)
            .await
            .map_err(|e| ChannelError::ConnectFailed {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        trace!(address, status = %response.status(), "WebSocket handshake finished");
        Ok(Box::new(WebSocketSource { stream }))
    }
}

/// Принимающая сторона WebSocket-канала.
///
/// Текстовые кадры передаются как есть, бинарные принимаются, если это
/// UTF-8. Служебные кадры (ping/pong) пропускаются.
pub struct WebSocketSource {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameSource for WebSocketSource {
    async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => {
                    return Some(ChannelEvent::Error(ChannelError::Transport {
                        reason: e.to_string(),
                    }))
                }
            };

            match message {
                Message::Text(text) => return Some(ChannelEvent::Frame(text)),
                Message::Binary(bytes) => {
                    return Some(match String::from_utf8(bytes) {
                        Ok(text) => ChannelEvent::Frame(text),
                        Err(e) => ChannelEvent::Error(ChannelError::InvalidUtf8 {
                            reason: e.to_string(),
                        }),
                    })
                }
                Message::Close(frame) => {
                    trace!(?frame, "WebSocket close frame received");
                    return None;
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }
}
