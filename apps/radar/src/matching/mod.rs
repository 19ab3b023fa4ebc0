// Match Coordinator: correlates the job and resume streams and scores every
// buffered pair. All LLM calls go through llm_client.

pub mod coordinator;
pub mod handler;
pub mod prompts;
pub mod scoring;

pub use coordinator::{
    CoordinatorSettings, MatchAttempt, MatchCoordinator, PassReport, RequeuePolicy,
};
pub use handler::CoordinatorHandler;
pub use scoring::{LlmMatchScorer, MatchScorer, MatchVerdict, ScoringError};
