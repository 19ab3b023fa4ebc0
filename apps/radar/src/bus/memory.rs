use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::bus::{BusError, BusMessage, MessageBus, SUBSCRIPTION_BUFFER};
use crate::models::Channel;

const DEFAULT_CAPACITY: usize = 1024;

/// In-process bus backed by a tokio broadcast channel.
///
/// Same semantics as the broker: no replay for late subscribers, slow
/// subscribers may lag and lose messages, and publishing while disconnected
/// fails with `BusError::NotReady`.
pub struct InMemoryBus {
    sender: broadcast::Sender<BusMessage>,
    connected: AtomicBool,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            connected: AtomicBool::new(true),
        }
    }

    /// Simulates the broker connection dropping or coming back.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish_raw(&self, channel: Channel, payload: String) -> Result<(), BusError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(BusError::NotReady("in-memory bus is disconnected".to_string()));
        }
        // Zero receivers is not an error, same as PUBLISH returning 0.
        let receivers = self
            .sender
            .send(BusMessage {
                channel: channel.name().to_string(),
                payload,
            })
            .unwrap_or(0);
        debug!(%channel, receivers, "Published message");
        Ok(())
    }

    async fn subscribe_raw(
        &self,
        channels: &[Channel],
    ) -> Result<mpsc::Receiver<BusMessage>, BusError> {
        let mut source = self.sender.subscribe();
        let wanted: Vec<&'static str> = channels.iter().map(|c| c.name()).collect();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

        tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(message) => {
                        if !wanted.contains(&message.channel.as_str()) {
                            continue;
                        }
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "In-memory subscriber lagged; messages lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(rx)
    }
}
