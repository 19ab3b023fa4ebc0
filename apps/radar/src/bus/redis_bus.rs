use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::{MultiplexedConnection, PubSub};
use redis::AsyncCommands;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::bus::{BusError, BusMessage, MessageBus, SUBSCRIPTION_BUFFER};
use crate::models::Channel;

/// Redis pub/sub backend.
///
/// Publishing goes through one shared multiplexed connection. When a publish
/// hits a dropped connection the connection is discarded and the next publish
/// reconnects. Each subscription owns a dedicated pub/sub connection that is
/// re-established after `reconnect_delay` whenever it drops.
pub struct RedisBus {
    client: redis::Client,
    publisher: Mutex<Option<MultiplexedConnection>>,
    reconnect_delay: Duration,
}

impl RedisBus {
    /// Connects eagerly so an unreachable broker fails service startup.
    pub async fn connect(url: &str, reconnect_delay: Duration) -> Result<Self, BusError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        info!("Connected to Redis");

        Ok(Self {
            client,
            publisher: Mutex::new(Some(connection)),
            reconnect_delay,
        })
    }

    async fn publisher(&self) -> Result<MultiplexedConnection, BusError> {
        let mut slot = self.publisher.lock().await;
        if let Some(connection) = slot.as_ref() {
            return Ok(connection.clone());
        }

        match self.client.get_multiplexed_async_connection().await {
            Ok(connection) => {
                info!("Redis publisher reconnected");
                *slot = Some(connection.clone());
                Ok(connection)
            }
            Err(e) => Err(BusError::NotReady(e.to_string())),
        }
    }
}

#[async_trait]
impl MessageBus for RedisBus {
    async fn publish_raw(&self, channel: Channel, payload: String) -> Result<(), BusError> {
        let mut connection = self.publisher().await?;

        match connection
            .publish::<_, _, i64>(channel.name(), payload)
            .await
        {
            Ok(receivers) => {
                debug!(%channel, receivers, "Published message");
                Ok(())
            }
            Err(e) => {
                if e.is_connection_dropped() || e.is_io_error() {
                    warn!(%channel, "Redis publisher connection dropped: {e}");
                    *self.publisher.lock().await = None;
                }
                Err(e.into())
            }
        }
    }

    async fn subscribe_raw(
        &self,
        channels: &[Channel],
    ) -> Result<mpsc::Receiver<BusMessage>, BusError> {
        let names: Vec<&'static str> = channels.iter().map(|c| c.name()).collect();
        let pubsub = open_pubsub(&self.client, &names).await?;
        info!("Subscribed to {} channels: {}", names.len(), names.join(", "));

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        tokio::spawn(pump_messages(
            self.client.clone(),
            names,
            pubsub,
            tx,
            self.reconnect_delay,
        ));
        Ok(rx)
    }
}

async fn open_pubsub(client: &redis::Client, names: &[&'static str]) -> redis::RedisResult<PubSub> {
    let mut pubsub = client.get_async_pubsub().await?;
    for name in names {
        pubsub.subscribe(*name).await?;
    }
    Ok(pubsub)
}

/// Forwards pub/sub messages until the receiving side is dropped,
/// reconnecting whenever the Redis stream ends.
async fn pump_messages(
    client: redis::Client,
    names: Vec<&'static str>,
    mut pubsub: PubSub,
    tx: mpsc::Sender<BusMessage>,
    reconnect_delay: Duration,
) {
    loop {
        {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(
                            channel = msg.get_channel_name(),
                            "Dropping non-text payload: {e}"
                        );
                        continue;
                    }
                };
                let message = BusMessage {
                    channel: msg.get_channel_name().to_string(),
                    payload,
                };
                if tx.send(message).await.is_err() {
                    return;
                }
            }
        }

        warn!("Redis subscription dropped, reconnecting...");
        loop {
            if tx.is_closed() {
                return;
            }
            tokio::time::sleep(reconnect_delay).await;
            match open_pubsub(&client, &names).await {
                Ok(fresh) => {
                    info!("Redis subscription re-established");
                    pubsub = fresh;
                    break;
                }
                Err(e) => warn!(
                    "Redis reconnect failed, retrying after {}ms: {e}",
                    reconnect_delay.as_millis()
                ),
            }
        }
    }
}
