//! Resume Radar: job and resume producers, the match coordinator and the
//! notification consumer, wired together over a pub/sub message bus.

pub mod bus;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod jobs;
pub mod llm_client;
pub mod matching;
pub mod models;
pub mod notification;
pub mod resumes;
pub mod routes;
pub mod state;
pub mod telemetry;
