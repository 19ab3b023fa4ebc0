use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::bus::{publish_event, MessageBus};
use crate::embedding::{embed_best_effort, Embedder, EntityType};
use crate::jobs::source::{JobQuery, JobSource, JobSourceError, RawJobPosting};
use crate::models::JobAvailable;

/// Outcome of one fetch run, returned by `POST /fetch-jobs`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchSummary {
    pub fetched_at: DateTime<Utc>,
    pub fetched: usize,
    pub published: usize,
    pub embedding_failures: usize,
    pub publish_failures: usize,
    /// Jobs that made it onto the bus.
    pub jobs: Vec<JobAvailable>,
}

pub struct JobFetcher {
    source: Arc<dyn JobSource>,
    embedder: Option<Arc<dyn Embedder>>,
    bus: Arc<dyn MessageBus>,
}

impl JobFetcher {
    pub fn new(
        source: Arc<dyn JobSource>,
        embedder: Option<Arc<dyn Embedder>>,
        bus: Arc<dyn MessageBus>,
    ) -> Self {
        Self {
            source,
            embedder,
            bus,
        }
    }

    /// Fetches postings and publishes one `JobAvailable` per posting. Only a
    /// failed search is an error; embedding and publish failures are counted
    /// and the run continues.
    pub async fn run_once(&self, query: &JobQuery) -> Result<FetchSummary, JobSourceError> {
        let postings = self.source.search(query).await?;
        info!(
            keywords = %query.keywords,
            location_id = %query.location_id,
            "Fetched {} jobs",
            postings.len()
        );

        let mut summary = FetchSummary {
            fetched_at: Utc::now(),
            fetched: postings.len(),
            published: 0,
            embedding_failures: 0,
            publish_failures: 0,
            jobs: Vec::with_capacity(postings.len()),
        };

        for posting in postings {
            let mut job = to_event(posting);

            let sections = embed_sections(&job);
            let metadata = json!({
                "job_id": job.id,
                "title": job.title,
                "company": job.company,
                "location": job.location,
            });
            job.embeddings =
                embed_best_effort(self.embedder.as_deref(), EntityType::Job, &sections, &metadata)
                    .await;
            if self.embedder.is_some() && !sections.is_empty() && job.embeddings.is_none() {
                summary.embedding_failures += 1;
            }

            match publish_event(self.bus.as_ref(), &job).await {
                Ok(()) => {
                    debug!(job_id = %job.id, title = %job.title, "Job published");
                    summary.published += 1;
                    summary.jobs.push(job);
                }
                Err(e) => {
                    error!(job_id = %job.id, "Failed to publish job: {e}");
                    summary.publish_failures += 1;
                }
            }
        }

        info!(
            published = summary.published,
            embedding_failures = summary.embedding_failures,
            publish_failures = summary.publish_failures,
            "Fetch run complete"
        );
        Ok(summary)
    }

    /// Runs `query` immediately and then every `interval`, forever. A zero
    /// interval is refused.
    pub async fn run_every(self: Arc<Self>, interval: Duration, query: JobQuery) {
        if interval.is_zero() {
            error!("Job fetch interval must be greater than zero, scheduling disabled");
            return;
        }
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once(&query).await {
                warn!("Scheduled job fetch failed: {e}");
            }
        }
    }
}

fn to_event(posting: RawJobPosting) -> JobAvailable {
    JobAvailable {
        id: Uuid::new_v4().to_string(),
        job_source_id: Some(posting.id).filter(|id| !id.is_empty()),
        title: posting.title,
        company: posting.company,
        location: posting.location,
        description: posting.description,
        date_posted: posting.date_posted,
        embeddings: None,
    }
}

fn embed_sections(job: &JobAvailable) -> BTreeMap<String, String> {
    [("title", &job.title), ("description", &job.description)]
        .into_iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(name, text)| (name.to_string(), text.clone()))
        .collect()
}
