use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::bus::{BusError, BusMessage, MessageBus};
use crate::models::{Channel, DecodeError};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("dropping message: {0}")]
    Decode(#[from] DecodeError),
}

/// Invoked once per delivered message.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, message: BusMessage) -> Result<(), HandlerError>;
}

/// Subscribes `handler` to `channels` and returns the dispatch loop's handle.
///
/// Each message is handled in its own task. Handler errors and panics are
/// logged per message; neither ends the loop. The loop ends only when the
/// underlying subscription closes.
pub async fn subscribe(
    bus: &dyn MessageBus,
    channels: &[Channel],
    handler: Arc<dyn MessageHandler>,
) -> Result<JoinHandle<()>, BusError> {
    let mut messages = bus.subscribe_raw(channels).await?;

    Ok(tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            dispatch(handler.clone(), message);
        }
        info!("Subscription closed");
    }))
}

fn dispatch(handler: Arc<dyn MessageHandler>, message: BusMessage) {
    let channel = message.channel.clone();
    let task = tokio::spawn(async move { handler.handle(message).await });

    tokio::spawn(async move {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(%channel, "{e}"),
            Err(e) if e.is_panic() => error!(%channel, "Message handler panicked"),
            Err(e) => warn!(%channel, "Message handler cancelled: {e}"),
        }
    });
}
