use serde::{Deserialize, Serialize};

use crate::models::event::{Channel, ChannelEvent};
use crate::models::Embeddings;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalInformation {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
}

/// A structured resume published once on the resume channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAvailable {
    pub id: String,
    #[serde(default)]
    pub personal_information: PersonalInformation,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub work_experience: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub unstructured_text_blocks: Vec<String>,
    /// Raw resume text as uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Embeddings>,
}

impl ResumeAvailable {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            personal_information: PersonalInformation::default(),
            skills: vec![],
            education: vec![],
            work_experience: vec![],
            projects: vec![],
            certifications: vec![],
            unstructured_text_blocks: vec![],
            content: None,
            embeddings: None,
        }
    }
}

impl ChannelEvent for ResumeAvailable {
    const CHANNEL: Channel = Channel::Resume;

    fn validate(&self) -> Result<(), &'static str> {
        if self.id.trim().is_empty() {
            return Err("resume id is empty");
        }
        Ok(())
    }
}
