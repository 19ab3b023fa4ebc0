use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use resume_radar::bus::{subscribe, MessageBus, RedisBus};
use resume_radar::config::{Config, MatcherConfig};
use resume_radar::llm_client::{self, LlmClient};
use resume_radar::matching::{
    CoordinatorHandler, CoordinatorSettings, LlmMatchScorer, MatchCoordinator, RequeuePolicy,
};
use resume_radar::models::Channel;
use resume_radar::routes::{health_router, serve};
use resume_radar::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env(3003)?;
    let matcher_config = MatcherConfig::from_env()?;

    init_tracing(env!("CARGO_CRATE_NAME"), &config.rust_log);
    info!("Starting matching engine v{}", env!("CARGO_PKG_VERSION"));

    let bus: Arc<dyn MessageBus> = Arc::new(
        RedisBus::connect(&config.redis_url, config.bus_reconnect_delay)
            .await
            .context("Failed to connect to Redis")?,
    );

    // Scoring calls are bounded by the coordinator, not the HTTP client.
    let llm = LlmClient::new(matcher_config.anthropic_api_key, None)
        .context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let settings = CoordinatorSettings {
        requeue: if matcher_config.requeue_unmatched {
            RequeuePolicy::RequeueUnmatched
        } else {
            RequeuePolicy::DropAll
        },
        scoring_timeout: config.collaborator_timeout,
    };
    info!(requeue = ?settings.requeue, timeout = ?settings.scoring_timeout, "Coordinator settings");

    let coordinator = Arc::new(MatchCoordinator::new(
        Arc::new(LlmMatchScorer::new(llm)),
        bus.clone(),
        settings,
    ));

    let subscription = subscribe(
        bus.as_ref(),
        &[Channel::Job, Channel::Resume],
        Arc::new(CoordinatorHandler::new(coordinator)),
    )
    .await
    .context("Failed to subscribe to job and resume channels")?;
    info!("Subscribed to {} and {}", Channel::Job, Channel::Resume);

    tokio::select! {
        result = serve(health_router("matching-engine"), config.port) => result,
        ended = subscription => Err(anyhow!("Subscription loop ended: {ended:?}")),
    }
}
