//! Job Producer: pulls postings from the job board and publishes one
//! `JobAvailable` per posting.

pub mod fetcher;
pub mod handlers;
pub mod source;

pub use fetcher::{FetchSummary, JobFetcher};
pub use source::{JobQuery, JobQueryOverrides, JobSource, JobSourceError, RapidApiJobSource};
