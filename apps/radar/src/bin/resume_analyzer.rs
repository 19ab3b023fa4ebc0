use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use resume_radar::bus::{MessageBus, RedisBus};
use resume_radar::config::{Config, ResumeAnalyzerConfig};
use resume_radar::embedding::{Embedder, HttpEmbedder};
use resume_radar::llm_client::{self, LlmClient};
use resume_radar::resumes::{
    LlmSectionExtractor, RegexSectionExtractor, ResumeAnalyzer, SectionExtractor,
};
use resume_radar::routes::{resume_analyzer_router, serve};
use resume_radar::state::ResumeAnalyzerState;
use resume_radar::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env(3002)?;
    let analyzer_config = ResumeAnalyzerConfig::from_env()?;

    init_tracing(env!("CARGO_CRATE_NAME"), &config.rust_log);
    info!("Starting resume analyzer v{}", env!("CARGO_PKG_VERSION"));

    let bus: Arc<dyn MessageBus> = Arc::new(
        RedisBus::connect(&config.redis_url, config.bus_reconnect_delay)
            .await
            .context("Failed to connect to Redis")?,
    );

    let extractor: Arc<dyn SectionExtractor> = match analyzer_config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key, config.collaborator_timeout)
                .context("Failed to build LLM client")?;
            info!("LLM extraction enabled (model: {})", llm_client::MODEL);
            Arc::new(LlmSectionExtractor::new(llm))
        }
        None => {
            info!("ANTHROPIC_API_KEY not set, using regex-only extraction");
            Arc::new(RegexSectionExtractor)
        }
    };

    let embedder: Option<Arc<dyn Embedder>> = match &analyzer_config.embedding_api_url {
        Some(url) => Some(Arc::new(
            HttpEmbedder::new(url, config.collaborator_timeout)
                .context("Failed to build embedding client")?,
        )),
        None => {
            info!("EMBEDDING_API_URL not set, resumes will be published without embeddings");
            None
        }
    };

    let analyzer = Arc::new(ResumeAnalyzer::new(extractor, embedder, bus));
    let app = resume_analyzer_router(ResumeAnalyzerState { analyzer });
    serve(app, config.port).await
}
