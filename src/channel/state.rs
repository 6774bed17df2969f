use std::fmt;

use parking_lot::Mutex;

/// Состояние канала, которым владеет менеджер.
///
/// ```text
/// Absent ─► Opening ─► Open ─► Closed | Errored
///              └──────────────► Failed (поиск адреса или подключение)
/// ```
///
/// Все состояния, кроме `Absent`, считаются «установленными»: повторный
/// `ensure_open` ничего не делает. `Closed`, `Errored` и `Failed` конечны и
/// автоматически не покидаются.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    Absent,
    Opening,
    Open,
    Closed,
    Errored,
    Failed,
}

impl ChannelState {
    /// Был ли уже запущен хотя бы один цикл открытия.
    pub fn is_established(self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Конечное состояние: сообщения больше не придут без ручного
    /// переоткрытия.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Снимок состояния канала для внешнего наблюдения.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub state: ChannelState,
    /// Причина последнего перехода в `Errored`/`Failed`
    pub last_error: Option<String>,
    /// Сколько раз запускался цикл открытия
    pub attempts: u32,
}

#[derive(Debug)]
struct Inner {
    state: ChannelState,
    last_error: Option<String>,
    attempts: u32,
}

/// Разделяемое состояние канала: менеджер и фоновая задача канала.
#[derive(Debug)]
pub struct ChannelStatus {
    inner: Mutex<Inner>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ChannelStatus {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ChannelState::Absent,
                last_error: None,
                attempts: 0,
            }),
        }
    }

    pub fn state(&self) -> ChannelState {
        self.inner.lock().state
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        let inner = self.inner.lock();
        ChannelSnapshot {
            state: inner.state,
            last_error: inner.last_error.clone(),
            attempts: inner.attempts,
        }
    }

    /// Атомарно переводит `Absent → Opening`. Возвращает `true`, если
    /// переход выполнил именно этот вызов.
    pub fn begin_first_open(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != ChannelState::Absent {
            return false;
        }
        inner.state = ChannelState::Opening;
        inner.attempts += 1;
        true
    }

    /// Атомарно переводит конечное состояние в `Opening` (ручное
    /// переоткрытие).
    pub fn begin_reopen(&self) -> bool {
        let mut inner = self.inner.lock();
        if !inner.state.is_terminal() {
            return false;
        }
        inner.state = ChannelState::Opening;
        inner.attempts += 1;
        true
    }

    pub fn mark_open(&self) {
        let mut inner = self.inner.lock();
        inner.state = ChannelState::Open;
        inner.last_error = None;
    }

    pub fn mark_closed(&self) {
        self.inner.lock().state = ChannelState::Closed;
    }

    pub fn mark_errored(
        &self,
        reason: impl Into<String>,
    ) {
        let mut inner = self.inner.lock();
        inner.state = ChannelState::Errored;
        inner.last_error = Some(reason.into());
    }

    pub fn mark_failed(
        &self,
        reason: impl Into<String>,
    ) {
        let mut inner = self.inner.lock();
        inner.state = ChannelState::Failed;
        inner.last_error = Some(reason.into());
    }
}

impl Default for ChannelStatus {
    fn default() -> Self {
        Self::new()
    }
}
