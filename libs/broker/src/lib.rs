//! Thin `async-nats` wrapper shared by the Ingestion Dispatcher and the
//! Runtime Worker, so both sides of the broker use one implementation of the
//! subject grammar (`subject`) and one subscription-cleanup discipline
//! (`Subscription`).
//!
//! Plain core-NATS publish/subscribe only (no JetStream): durability is left
//! as an implementation choice the broker backend may add transparently,
//! per the normative design.

pub mod subject;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_nats::{Client, Subscriber};
use bytes::Bytes;
use futures::StreamExt;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("broker connection failed: {0}")]
    Connect(#[from] async_nats::ConnectError),
    #[error("broker publish failed: {0}")]
    Publish(#[from] async_nats::PublishError),
    #[error("broker subscribe failed: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),
    #[error(transparent)]
    Subject(#[from] subject::SubjectError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Process-wide broker connection, constructed once at binary startup and
/// shared (cloned, which is cheap: `async_nats::Client` is a handle) by every
/// request handler. Never rebuilt per request.
#[derive(Clone)]
pub struct Broker {
    client: Client,
}

impl Broker {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = async_nats::connect(url).await?;
        Ok(Self { client })
    }

    pub async fn publish(&self, subject: impl Into<String>, payload: Bytes) -> Result<()> {
        self.client.publish(subject.into(), payload).await?;
        Ok(())
    }

    /// Subscribes to `subject`, returning a guard that unsubscribes exactly
    /// once when dropped or explicitly closed (invariant I2).
    pub async fn subscribe(&self, subject: impl Into<String>) -> Result<Subscription> {
        let inner = self.client.subscribe(subject.into()).await?;
        Ok(Subscription {
            inner: Some(inner),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// A subscription bound to a once-guard: whichever code path exits the
/// handler first (normal completion, client disconnect, broker error, panic
/// unwind via `Drop`) unsubscribes exactly once.
pub struct Subscription {
    inner: Option<Subscriber>,
    closed: Arc<AtomicBool>,
}

impl Subscription {
    /// Pulls the next message, or `None` once the subscription is closed.
    pub async fn next(&mut self) -> Option<async_nats::Message> {
        match &mut self.inner {
            Some(s) => s.next().await,
            None => None,
        }
    }

    /// Unsubscribes and releases the underlying stream. Idempotent: a second
    /// call is a no-op.
    pub async fn close(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(mut sub) = self.inner.take() {
            let _ = sub.unsubscribe().await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            // best-effort: unsubscribe() here would need async; async-nats drops the
            // subscriber's sender on Drop, which is sufficient to stop delivery.
            self.inner.take();
        }
    }
}

/// Bridges a broker subscription into a bounded `tokio::sync::mpsc` channel
/// with drop-on-full backpressure: the callback/forwarding task never blocks
/// the broker dispatcher, and overflow is logged but not signalled to the
/// client, per the dispatcher's backpressure policy. `on_drop` is invoked
/// once per dropped message, letting callers count overflow without this
/// module needing to know about their metrics registry.
pub fn bridge_bounded(
    mut sub: Subscription,
    capacity: usize,
    on_drop: impl Fn() + Send + 'static,
) -> tokio::sync::mpsc::Receiver<Bytes> {
    let (tx, rx) = tokio::sync::mpsc::channel(capacity);
    tokio::spawn(async move {
        while let Some(msg) = sub.next().await {
            if tx.try_send(msg.payload).is_err() {
                warn!("dropping message: per-request channel is full");
                on_drop();
            }
        }
        sub.close().await;
    });
    rx
}
