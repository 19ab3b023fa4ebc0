//! Channel names and the decode step for inbound payloads.
//!
//! Every payload is decoded into a concrete record before it touches any
//! service state. Decoding fails closed: a payload that does not parse as the
//! channel's record, or parses but fails validation, is rejected.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::models::{JobAvailable, ResumeAvailable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Job,
    Resume,
    Match,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Job, Channel::Resume, Channel::Match];

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Job => "job_channel",
            Channel::Resume => "resume_channel",
            Channel::Match => "match_channel",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record that travels on exactly one channel.
pub trait ChannelEvent: Serialize + DeserializeOwned + Send + Sync {
    const CHANNEL: Channel;

    /// Semantic checks that serde cannot express.
    fn validate(&self) -> Result<(), &'static str> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed {channel} payload: {source}")]
    Malformed {
        channel: Channel,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {channel} payload: {reason}")]
    Invalid {
        channel: Channel,
        reason: &'static str,
    },

    #[error("unexpected channel '{0}'")]
    UnexpectedChannel(String),
}

/// Decodes a raw payload as the record carried on `E::CHANNEL`.
pub fn decode_payload<E: ChannelEvent>(payload: &str) -> Result<E, DecodeError> {
    let event: E = serde_json::from_str(payload).map_err(|source| DecodeError::Malformed {
        channel: E::CHANNEL,
        source,
    })?;
    event.validate().map_err(|reason| DecodeError::Invalid {
        channel: E::CHANNEL,
        reason,
    })?;
    Ok(event)
}

/// Everything the match coordinator can receive.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Job(JobAvailable),
    Resume(ResumeAvailable),
}

impl InboundEvent {
    pub fn decode(channel: &str, payload: &str) -> Result<Self, DecodeError> {
        match Channel::from_name(channel) {
            Some(Channel::Job) => decode_payload(payload).map(InboundEvent::Job),
            Some(Channel::Resume) => decode_payload(payload).map(InboundEvent::Resume),
            _ => Err(DecodeError::UnexpectedChannel(channel.to_string())),
        }
    }
}
