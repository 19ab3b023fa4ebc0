use std::collections::BTreeMap;

pub mod event;
pub mod job;
pub mod match_result;
pub mod resume;

pub use event::{decode_payload, Channel, ChannelEvent, DecodeError, InboundEvent};
pub use job::JobAvailable;
pub use match_result::MatchResult;
pub use resume::{PersonalInformation, ResumeAvailable};

/// Section name -> embedding vector, as returned by the embedding service.
pub type Embeddings = BTreeMap<String, Vec<f32>>;
