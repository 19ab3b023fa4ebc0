//! Resume Producer: raw upload in, one `ResumeAvailable` out.

pub mod analyzer;
pub mod extraction;
pub mod handlers;
pub mod intake;
pub mod prompts;

pub use analyzer::ResumeAnalyzer;
pub use extraction::{
    chunk_text, ExtractedResume, LlmSectionExtractor, RegexSectionExtractor, SectionExtractor,
};
pub use intake::{resume_text, IntakeError, UploadedFile};
