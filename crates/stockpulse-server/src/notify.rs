//! Live-update fan-out to connected dashboard clients.
//!
//! The registry is owned by app state and torn down with it; handlers reach
//! it only through `subscribe`/`broadcast`. Delivery is at-most-once and
//! best-effort: a channel whose client has gone away is detected lazily, on
//! the next failed write, and silently dropped.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// One event on the live-update stream, tagged the way the dashboard's SSE
/// client expects (`{"type": "update", ...}`).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UpdateEvent {
    Connected { message: &'static str },
    Keepalive { timestamp: DateTime<Utc> },
    Update { timestamp: DateTime<Utc> },
}

impl UpdateEvent {
    #[must_use]
    pub fn connected() -> Self {
        UpdateEvent::Connected {
            message: "connection established; live updates will follow",
        }
    }

    #[must_use]
    pub fn keepalive() -> Self {
        UpdateEvent::Keepalive {
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn update() -> Self {
        UpdateEvent::Update {
            timestamp: Utc::now(),
        }
    }
}

type ChannelMap = HashMap<Uuid, mpsc::UnboundedSender<UpdateEvent>>;

/// Handle to the registry of currently-connected client channels.
///
/// Clones share one registry; the registry lives exactly as long as its last
/// handle.
#[derive(Debug, Clone, Default)]
pub struct UpdateNotifier {
    channels: Arc<Mutex<ChannelMap>>,
}

impl UpdateNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client channel.
    ///
    /// The returned subscription yields events as a `Stream` and removes
    /// itself from the registry when dropped. A `connected` event is already
    /// queued on it.
    #[must_use]
    pub fn subscribe(&self) -> UpdateSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        // The receiver is alive in this scope, so the send cannot fail.
        let _ = tx.send(UpdateEvent::connected());

        self.lock_channels().insert(id, tx);
        tracing::debug!(client = %id, "update channel registered");

        UpdateSubscription {
            id,
            rx,
            notifier: self.clone(),
        }
    }

    /// Write `event` to every registered channel.
    ///
    /// Channels that error on write belong to disconnected clients; they are
    /// removed and discarded, which is not an error for the broadcast. With
    /// zero subscribers this is a no-op. Returns the number of channels the
    /// event was delivered to.
    pub fn broadcast(&self, event: &UpdateEvent) -> usize {
        let mut channels = self.lock_channels();
        channels.retain(|id, tx| {
            if tx.send(event.clone()).is_ok() {
                true
            } else {
                tracing::debug!(client = %id, "removing disconnected update channel");
                false
            }
        });
        channels.len()
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.lock_channels().len()
    }

    /// Spawn the periodic keepalive task.
    ///
    /// Heartbeats flow through [`Self::broadcast`], so a failed keepalive
    /// write removes the dead channel exactly like a failed update write.
    pub fn spawn_heartbeat(&self, interval: Duration) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so heartbeats start
            // one full interval after startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                notifier.broadcast(&UpdateEvent::keepalive());
            }
        })
    }

    fn unsubscribe(&self, id: Uuid) {
        if self.lock_channels().remove(&id).is_some() {
            tracing::debug!(client = %id, "update channel unregistered");
        }
    }

    fn lock_channels(&self) -> MutexGuard<'_, ChannelMap> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A registered client channel; unsubscribes itself on drop.
pub struct UpdateSubscription {
    id: Uuid,
    rx: mpsc::UnboundedReceiver<UpdateEvent>,
    notifier: UpdateNotifier,
}

impl Stream for UpdateSubscription {
    type Item = UpdateEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for UpdateSubscription {
    fn drop(&mut self) {
        self.notifier.unsubscribe(self.id);
    }
}
