//! Message Bus Client: publish/subscribe over named channels.
//!
//! Delivery is whatever the broker gives us (at-least-once at best). This layer
//! does not buffer or replay: while the connection is down, publishes fail and
//! subscribers simply receive nothing.
//!
//! Services hold an `Arc<dyn MessageBus>`; the Redis backend runs in
//! production, the in-memory backend in tests and single-process runs.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{Channel, ChannelEvent};

pub mod memory;
pub mod redis_bus;
pub mod subscriber;

pub use memory::InMemoryBus;
pub use redis_bus::RedisBus;
pub use subscriber::{subscribe, HandlerError, MessageHandler};

/// Capacity of the queue between a subscription and its dispatch loop.
pub const SUBSCRIPTION_BUFFER: usize = 1024;

/// A raw message as delivered by the broker, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub channel: String,
    pub payload: String,
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus connection is not ready: {0}")]
    NotReady(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to encode {channel} payload: {source}")]
    Encode {
        channel: Channel,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Sends an already-encoded payload. Best-effort: callers log and continue.
    async fn publish_raw(&self, channel: Channel, payload: String) -> Result<(), BusError>;

    /// Opens a subscription to `channels`. Messages published before this
    /// returns are not delivered.
    async fn subscribe_raw(
        &self,
        channels: &[Channel],
    ) -> Result<mpsc::Receiver<BusMessage>, BusError>;
}

/// Encodes `event` as JSON and publishes it on its channel.
pub async fn publish_event<E: ChannelEvent>(
    bus: &dyn MessageBus,
    event: &E,
) -> Result<(), BusError> {
    let payload = serde_json::to_string(event).map_err(|source| BusError::Encode {
        channel: E::CHANNEL,
        source,
    })?;
    bus.publish_raw(E::CHANNEL, payload).await
}
