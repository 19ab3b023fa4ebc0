use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use resume_radar::bus::{MessageBus, RedisBus};
use resume_radar::config::{Config, JobFetcherConfig};
use resume_radar::embedding::{Embedder, HttpEmbedder};
use resume_radar::jobs::{JobFetcher, JobQuery, RapidApiJobSource};
use resume_radar::routes::{job_fetcher_router, serve};
use resume_radar::state::JobFetcherState;
use resume_radar::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env(3001)?;
    let fetcher_config = JobFetcherConfig::from_env()?;

    init_tracing(env!("CARGO_CRATE_NAME"), &config.rust_log);
    info!("Starting job fetcher v{}", env!("CARGO_PKG_VERSION"));

    let bus: Arc<dyn MessageBus> = Arc::new(
        RedisBus::connect(&config.redis_url, config.bus_reconnect_delay)
            .await
            .context("Failed to connect to Redis")?,
    );

    let source = RapidApiJobSource::new(fetcher_config.rapidapi_key, config.collaborator_timeout)
        .context("Failed to build job search client")?;

    let embedder: Option<Arc<dyn Embedder>> = match &fetcher_config.embedding_api_url {
        Some(url) => {
            info!("Embedding service at {url}");
            Some(Arc::new(
                HttpEmbedder::new(url, config.collaborator_timeout)
                    .context("Failed to build embedding client")?,
            ))
        }
        None => {
            info!("EMBEDDING_API_URL not set, jobs will be published without embeddings");
            None
        }
    };

    let fetcher = Arc::new(JobFetcher::new(Arc::new(source), embedder, bus));
    let default_query = JobQuery::new(
        fetcher_config.search_keywords,
        fetcher_config.search_location_id,
    );

    if let Some(interval) = fetcher_config.fetch_interval {
        info!("Fetching jobs every {}s", interval.as_secs());
        tokio::spawn(fetcher.clone().run_every(interval, default_query.clone()));
    }

    let app = job_fetcher_router(JobFetcherState {
        fetcher,
        default_query,
    });
    serve(app, config.port).await
}
