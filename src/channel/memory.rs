//! Транспорт в памяти: справочник и каналы без сети.
//!
//! Используется тестами и подходит для встраивания диспетчера туда, где
//! удалённый процесс живёт в том же адресном пространстве.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use probus_error::{ChannelError, LookupError};
use tokio::sync::mpsc;

use super::{ChannelConnector, ChannelEvent, DirectoryResolver, FrameSource};

/// Справочник с фиксированными адресами.
///
/// Запоминает каждый поиск. Endpoint без явного адреса разрешается в
/// `memory://<endpoint>`.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    addresses: Mutex<HashMap<String, String>>,
    failures: Mutex<HashMap<String, (u16, String)>>,
    lookups: Mutex<Vec<String>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_address(endpoint: &str) -> String {
        format!("memory://{endpoint}")
    }

    pub fn with_address(
        self,
        endpoint: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        self.addresses.lock().insert(endpoint.into(), address.into());
        self
    }

    /// Все следующие поиски `endpoint` завершатся неуспешным статусом.
    pub fn fail_endpoint(
        &self,
        endpoint: impl Into<String>,
        status: u16,
        reason: impl Into<String>,
    ) {
        self.failures
            .lock()
            .insert(endpoint.into(), (status, reason.into()));
    }

    pub fn clear_failure(
        &self,
        endpoint: &str,
    ) {
        self.failures.lock().remove(endpoint);
    }

    /// Все выполненные поиски по порядку.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }

    pub fn lookup_count(
        &self,
        endpoint: &str,
    ) -> usize {
        self.lookups.lock().iter().filter(|e| *e == endpoint).count()
    }
}

#[async_trait]
impl DirectoryResolver for StaticDirectory {
    async fn resolve(
        &self,
        endpoint: &str,
    ) -> Result<String, LookupError> {
        self.lookups.lock().push(endpoint.to_string());

        if let Some((status, reason)) = self.failures.lock().get(endpoint) {
            return Err(LookupError::Status {
                endpoint: endpoint.to_string(),
                status: *status,
                reason: reason.clone(),
            });
        }

        Ok(self
            .addresses
            .lock()
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| Self::default_address(endpoint)))
    }
}

/// Удалённая сторона канала в памяти: через неё тест подаёт кадры.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    tx: mpsc::UnboundedSender<Option<ChannelEvent>>,
}

impl MemoryChannel {
    /// Возвращает `false`, если принимающая сторона уже завершилась.
    pub fn send_text(
        &self,
        text: impl Into<String>,
    ) -> bool {
        self.tx
            .send(Some(ChannelEvent::Frame(text.into())))
            .is_ok()
    }

    pub fn send_error(
        &self,
        reason: impl Into<String>,
    ) -> bool {
        self.tx
            .send(Some(ChannelEvent::Error(ChannelError::Transport {
                reason: reason.into(),
            })))
            .is_ok()
    }

    pub fn close(&self) -> bool {
        self.tx.send(None).is_ok()
    }
}

struct MemorySource {
    rx: mpsc::UnboundedReceiver<Option<ChannelEvent>>,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.rx.recv().await.flatten()
    }
}

#[derive(Debug, Default)]
struct Connections {
    latest: HashMap<String, MemoryChannel>,
    counts: HashMap<String, usize>,
    refused: HashMap<String, String>,
}

/// Подключатель, создающий каналы в памяти.
///
/// На каждый адрес хранится удалённая сторона последнего подключения.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    connections: Mutex<Connections>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Подключения к `address` будут отклонены с `reason`.
    pub fn refuse(
        &self,
        address: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.connections
            .lock()
            .refused
            .insert(address.into(), reason.into());
    }

    pub fn channel(
        &self,
        address: &str,
    ) -> Option<MemoryChannel> {
        self.connections.lock().latest.get(address).cloned()
    }

    pub fn connection_count(
        &self,
        address: &str,
    ) -> usize {
        self.connections
            .lock()
            .counts
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_connections(&self) -> usize {
        self.connections.lock().counts.values().sum()
    }

    /// Ждёт первого подключения к `address`.
    pub async fn wait_for(
        &self,
        address: &str,
        limit: Duration,
    ) -> Option<MemoryChannel> {
        self.wait_for_connections(address, 1, limit).await
    }

    /// Ждёт, пока к `address` не подключатся `count` раз, и возвращает
    /// удалённую сторону последнего подключения.
    pub async fn wait_for_connections(
        &self,
        address: &str,
        count: usize,
        limit: Duration,
    ) -> Option<MemoryChannel> {
        tokio::time::timeout(limit, async {
            loop {
                if self.connection_count(address) >= count {
                    if let Some(channel) = self.channel(address) {
                        return channel;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .ok()
    }
}

#[async_trait]
impl ChannelConnector for MemoryConnector {
    async fn connect(
        &self,
        address: &str,
    ) -> Result<Box<dyn FrameSource>, ChannelError> {
        let mut connections = self.connections.lock();
        if let Some(reason) = connections.refused.get(address) {
            return Err(ChannelError::ConnectFailed {
                address: address.to_string(),
                reason: reason.clone(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        connections
            .latest
            .insert(address.to_string(), MemoryChannel { tx });
        *connections.counts.entry(address.to_string()).or_default() += 1;
        Ok(Box::new(MemorySource { rx }))
    }
}
