//! Match Coordinator: accumulates jobs and resumes and runs cross-product passes.
//!
//! Two locks, two jobs:
//! - `buffers` (std mutex) guards append and snapshot-and-clear. It is never
//!   held across an `.await`, so ingestion keeps flowing during a pass.
//! - `pass_gate` (tokio mutex) serializes passes. A trigger that arrives while
//!   a pass runs waits, then consumes whatever accumulated in the meantime.
//!
//! A pass takes both buffers in one critical section, so every buffered item
//! lands in exactly one pass: nothing is scored twice and nothing appended
//! between snapshot and clear is lost.

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::bus::{publish_event, MessageBus};
use crate::matching::scoring::{MatchScorer, MatchVerdict, ScoringError};
use crate::models::{JobAvailable, MatchResult, ResumeAvailable};

/// What happens to items whose every pairing failed scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequeuePolicy {
    /// Clear everything after a pass, whatever the per-pair outcome.
    #[default]
    DropAll,
    /// Put back jobs and resumes that did not score against anything.
    RequeueUnmatched,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinatorSettings {
    pub requeue: RequeuePolicy,
    /// Bound on one scoring call. `None` waits as long as the scorer does.
    pub scoring_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub jobs: usize,
    pub resumes: usize,
    pub pairs_attempted: usize,
    pub published: usize,
    pub scoring_failures: usize,
    pub publish_failures: usize,
    pub requeued_jobs: usize,
    pub requeued_resumes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchAttempt {
    /// One side is empty; nothing to pair yet.
    Waiting {
        pending_jobs: usize,
        pending_resumes: usize,
    },
    Completed(PassReport),
}

#[derive(Default)]
struct Buffers {
    jobs: Vec<JobAvailable>,
    resumes: Vec<ResumeAvailable>,
}

pub struct MatchCoordinator {
    buffers: Mutex<Buffers>,
    pass_gate: tokio::sync::Mutex<()>,
    scorer: Arc<dyn MatchScorer>,
    bus: Arc<dyn MessageBus>,
    settings: CoordinatorSettings,
}

impl MatchCoordinator {
    pub fn new(
        scorer: Arc<dyn MatchScorer>,
        bus: Arc<dyn MessageBus>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            buffers: Mutex::new(Buffers::default()),
            pass_gate: tokio::sync::Mutex::new(()),
            scorer,
            bus,
            settings,
        }
    }

    pub async fn on_job_available(&self, job: JobAvailable) -> MatchAttempt {
        {
            let mut buffers = self.lock_buffers();
            buffers.jobs.push(job);
            info!("Received job. Total jobs: {}", buffers.jobs.len());
        }
        self.attempt_match().await
    }

    pub async fn on_resume_available(&self, resume: ResumeAvailable) -> MatchAttempt {
        {
            let mut buffers = self.lock_buffers();
            buffers.resumes.push(resume);
            info!("Received resume. Total resumes: {}", buffers.resumes.len());
        }
        self.attempt_match().await
    }

    /// `(pending_jobs, pending_resumes)` at this instant.
    pub fn pending(&self) -> (usize, usize) {
        let buffers = self.lock_buffers();
        (buffers.jobs.len(), buffers.resumes.len())
    }

    /// Runs one pass over everything buffered, if both sides have something.
    pub async fn attempt_match(&self) -> MatchAttempt {
        let _gate = self.pass_gate.lock().await;

        let (jobs, resumes) = {
            let mut buffers = self.lock_buffers();
            if buffers.jobs.is_empty() || buffers.resumes.is_empty() {
                debug!(
                    pending_jobs = buffers.jobs.len(),
                    pending_resumes = buffers.resumes.len(),
                    "Waiting for both jobs and resumes to be available"
                );
                return MatchAttempt::Waiting {
                    pending_jobs: buffers.jobs.len(),
                    pending_resumes: buffers.resumes.len(),
                };
            }
            (
                mem::take(&mut buffers.jobs),
                mem::take(&mut buffers.resumes),
            )
        };

        info!(
            "Starting matching pass: {} jobs x {} resumes",
            jobs.len(),
            resumes.len()
        );
        let report = self.run_pass(jobs, resumes).await;
        info!(
            published = report.published,
            scoring_failures = report.scoring_failures,
            publish_failures = report.publish_failures,
            "Matching pass completed"
        );
        MatchAttempt::Completed(report)
    }

    async fn run_pass(
        &self,
        jobs: Vec<JobAvailable>,
        resumes: Vec<ResumeAvailable>,
    ) -> PassReport {
        let mut report = PassReport {
            jobs: jobs.len(),
            resumes: resumes.len(),
            ..PassReport::default()
        };
        let mut job_scored = vec![false; jobs.len()];
        let mut resume_scored = vec![false; resumes.len()];

        for (ji, job) in jobs.iter().enumerate() {
            for (ri, resume) in resumes.iter().enumerate() {
                report.pairs_attempted += 1;
                debug!(job_id = %job.id, resume_id = %resume.id, "Matching job and resume");

                let verdict = match self.score_pair(job, resume).await {
                    Ok(verdict) => verdict,
                    Err(e) => {
                        warn!(
                            job_id = %job.id,
                            resume_id = %resume.id,
                            "Skipping pair: {e}"
                        );
                        report.scoring_failures += 1;
                        continue;
                    }
                };
                job_scored[ji] = true;
                resume_scored[ri] = true;

                let result = MatchResult {
                    job_id: job.id.clone(),
                    resume_id: resume.id.clone(),
                    score: verdict.score,
                    reasoning: verdict.reasoning,
                };
                match publish_event(self.bus.as_ref(), &result).await {
                    Ok(()) => {
                        debug!(
                            job_id = %job.id,
                            resume_id = %resume.id,
                            score = result.score,
                            "Published match result"
                        );
                        report.published += 1;
                    }
                    Err(e) => {
                        error!(
                            job_id = %job.id,
                            resume_id = %resume.id,
                            "Error publishing match result: {e}"
                        );
                        report.publish_failures += 1;
                    }
                }
            }
        }

        if self.settings.requeue == RequeuePolicy::RequeueUnmatched {
            let stale_jobs = unscored(jobs, &job_scored);
            let stale_resumes = unscored(resumes, &resume_scored);
            report.requeued_jobs = stale_jobs.len();
            report.requeued_resumes = stale_resumes.len();

            if !stale_jobs.is_empty() || !stale_resumes.is_empty() {
                info!(
                    "Requeueing {} jobs and {} resumes with no scored pairing",
                    stale_jobs.len(),
                    stale_resumes.len()
                );
                let mut buffers = self.lock_buffers();
                // Ahead of anything that arrived during the pass.
                buffers.jobs.splice(0..0, stale_jobs);
                buffers.resumes.splice(0..0, stale_resumes);
            }
        }

        report
    }

    async fn score_pair(
        &self,
        job: &JobAvailable,
        resume: &ResumeAvailable,
    ) -> Result<MatchVerdict, ScoringError> {
        match self.settings.scoring_timeout {
            Some(limit) => tokio::time::timeout(limit, self.scorer.score(job, resume))
                .await
                .map_err(|_| ScoringError::TimedOut(limit.as_secs()))?,
            None => self.scorer.score(job, resume).await,
        }
    }

    fn lock_buffers(&self) -> MutexGuard<'_, Buffers> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unscored<T>(items: Vec<T>, scored: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(scored)
        .filter(|(_, scored)| !**scored)
        .map(|(item, _)| item)
        .collect()
}
