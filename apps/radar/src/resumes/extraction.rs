//! Turns raw resume text into sections.
//!
//! With an LLM configured, the text is chunked and each chunk is extracted
//! separately, then merged. Contact details the model missed are filled in
//! by regex. Without an LLM only the regex pass runs.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::models::{PersonalInformation, ResumeAvailable};
use crate::resumes::prompts::RESUME_EXTRACT_PROMPT;

/// Longest chunk sent to the model, in characters.
pub const CHUNK_LIMIT: usize = 3000;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"\+?\(?\d[\d\s().-]{7,}\d").unwrap();
    static ref GITHUB_REGEX: Regex =
        Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/[a-z0-9_-]+").unwrap();
    static ref LINKEDIN_REGEX: Regex =
        Regex::new(r"(?i)(?:https?://)?(?:[a-z]{2,3}\.)?linkedin\.com/in/[a-z0-9_%-]+").unwrap();
}

/// Model output schema. Every field tolerates `null` or absence.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractedResume {
    #[serde(default, deserialize_with = "nullable")]
    pub personal_information: ExtractedContact,
    #[serde(default, deserialize_with = "nullable")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub education: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub work_experience: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub projects: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub certifications: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub unstructured_text_blocks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractedContact {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: String,
    #[serde(default, deserialize_with = "nullable")]
    pub github: String,
    #[serde(default, deserialize_with = "nullable")]
    pub linkedin: String,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExtractedResume {
    /// Folds a later chunk into this one. Non-empty contact fields from
    /// `other` win; list sections keep first-seen order without repeats.
    pub fn merge(&mut self, other: ExtractedResume) {
        let mine = &mut self.personal_information;
        let theirs = other.personal_information;
        overwrite_if_present(&mut mine.name, theirs.name);
        overwrite_if_present(&mut mine.email, theirs.email);
        overwrite_if_present(&mut mine.phone, theirs.phone);
        overwrite_if_present(&mut mine.github, theirs.github);
        overwrite_if_present(&mut mine.linkedin, theirs.linkedin);

        append_unique(&mut self.skills, other.skills);
        append_unique(&mut self.education, other.education);
        append_unique(&mut self.work_experience, other.work_experience);
        append_unique(&mut self.projects, other.projects);
        append_unique(&mut self.certifications, other.certifications);
        append_unique(
            &mut self.unstructured_text_blocks,
            other.unstructured_text_blocks,
        );
    }

    pub fn has_sections(&self) -> bool {
        !(self.skills.is_empty()
            && self.education.is_empty()
            && self.work_experience.is_empty()
            && self.projects.is_empty()
            && self.certifications.is_empty()
            && self.unstructured_text_blocks.is_empty())
    }

    /// Fills contact fields that are still empty from patterns in `text`.
    pub fn fill_contacts_from(&mut self, text: &str) {
        let contact = &mut self.personal_information;
        fill_if_empty(&mut contact.email, || find_email(text));
        fill_if_empty(&mut contact.phone, || find_phone(text));
        fill_if_empty(&mut contact.github, || find_match(&GITHUB_REGEX, text));
        fill_if_empty(&mut contact.linkedin, || find_match(&LINKEDIN_REGEX, text));
    }

    pub fn into_event(self, id: String, content: String) -> ResumeAvailable {
        let contact = self.personal_information;
        ResumeAvailable {
            personal_information: PersonalInformation {
                name: contact.name,
                email: contact.email,
                phone: contact.phone,
                github: Some(contact.github).filter(|v| !v.is_empty()),
                linkedin: Some(contact.linkedin).filter(|v| !v.is_empty()),
            },
            skills: self.skills,
            education: self.education,
            work_experience: self.work_experience,
            projects: self.projects,
            certifications: self.certifications,
            unstructured_text_blocks: self.unstructured_text_blocks,
            content: Some(content),
            ..ResumeAvailable::new(id)
        }
    }
}

fn overwrite_if_present(slot: &mut String, value: String) {
    let value = value.trim();
    if !value.is_empty() {
        *slot = value.to_string();
    }
}

fn append_unique(list: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !list.iter().any(|existing| existing == item) {
            list.push(item.to_string());
        }
    }
}

fn fill_if_empty(slot: &mut String, find: impl FnOnce() -> Option<String>) {
    if slot.trim().is_empty() {
        if let Some(found) = find() {
            *slot = found;
        }
    }
}

fn find_match(regex: &Regex, text: &str) -> Option<String> {
    regex.find(text).map(|m| m.as_str().to_string())
}

fn find_email(text: &str) -> Option<String> {
    find_match(&EMAIL_REGEX, text)
}

/// Date ranges look like phone numbers to the pattern; require a plausible
/// digit count.
fn find_phone(text: &str) -> Option<String> {
    PHONE_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (10..=15).contains(&digits)
        })
        .map(str::to_string)
}

/// Splits `text` into chunks of at most `limit` characters, breaking on
/// blank lines. Paragraphs longer than `limit` are cut mid-text.
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let normalized = text.replace("\r\n", "\n");

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    let paragraphs = normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty());
    for paragraph in paragraphs {
        for piece in hard_split(paragraph, limit) {
            let piece_len = piece.chars().count();
            if !current.is_empty() && current_len + 2 + piece_len > limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push_str("\n\n");
                current_len += 2;
            }
            current.push_str(piece);
            current_len += piece_len;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn hard_split(paragraph: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = paragraph;
    while let Some((cut, _)) = rest.char_indices().nth(limit) {
        pieces.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

#[async_trait]
pub trait SectionExtractor: Send + Sync {
    /// Never fails outright; unusable input yields an empty result.
    async fn extract(&self, text: &str) -> ExtractedResume;
}

/// Chunked LLM extraction.
pub struct LlmSectionExtractor {
    llm: LlmClient,
}

impl LlmSectionExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SectionExtractor for LlmSectionExtractor {
    async fn extract(&self, text: &str) -> ExtractedResume {
        let chunks = chunk_text(text, CHUNK_LIMIT);
        let total = chunks.len();
        let mut merged = ExtractedResume::default();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let prompt = RESUME_EXTRACT_PROMPT.replace("{chunk}", &chunk);
            match self
                .llm
                .call_json::<ExtractedResume>(&prompt, JSON_ONLY_SYSTEM)
                .await
            {
                Ok(part) => {
                    debug!(chunk = index + 1, total, "Chunk extracted");
                    merged.merge(part);
                }
                Err(e) => warn!(chunk = index + 1, total, "Skipping chunk: {e}"),
            }
        }
        merged
    }
}

/// Pattern-only extraction: contact details plus the whole text as one
/// unstructured block.
pub struct RegexSectionExtractor;

#[async_trait]
impl SectionExtractor for RegexSectionExtractor {
    async fn extract(&self, text: &str) -> ExtractedResume {
        let mut resume = ExtractedResume::default();
        resume.fill_contacts_from(text);
        let text = text.trim();
        if !text.is_empty() {
            resume.unstructured_text_blocks.push(text.to_string());
        }
        resume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = "Jane Doe\n\
        jane.doe@example.com | +1 (555) 123-4567\n\
        https://github.com/janedoe  linkedin.com/in/jane-doe\n\n\
        Experience\nSoftware Engineer at XYZ Corp (2019-2022)";

    fn extracted(value: serde_json::Value) -> ExtractedResume {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_merge_overwrites_contacts_and_dedups_lists() {
        let mut base = extracted(json!({
            "personal_information": {"name": "Jane", "email": "old@example.com"},
            "skills": ["Rust", "SQL"]
        }));
        base.merge(extracted(json!({
            "personal_information": {"name": "", "email": "jane@example.com", "phone": null},
            "skills": ["SQL", "Kafka", "Rust", " "],
            "projects": ["Radar"]
        })));

        assert_eq!(base.personal_information.name, "Jane");
        assert_eq!(base.personal_information.email, "jane@example.com");
        assert_eq!(base.skills, vec!["Rust", "SQL", "Kafka"]);
        assert_eq!(base.projects, vec!["Radar"]);
    }

    #[test]
    fn test_model_output_with_nulls_decodes() {
        let parsed = extracted(json!({
            "personal_information": null,
            "skills": null,
            "education": ["BSc"]
        }));
        assert_eq!(parsed.personal_information, ExtractedContact::default());
        assert!(parsed.skills.is_empty());
        assert_eq!(parsed.education, vec!["BSc"]);
    }

    #[test]
    fn test_regex_fill_only_touches_empty_fields() {
        let mut resume = ExtractedResume::default();
        resume.personal_information.email = "llm@example.com".into();
        resume.fill_contacts_from(SAMPLE);

        let contact = &resume.personal_information;
        assert_eq!(contact.email, "llm@example.com");
        assert_eq!(contact.phone, "+1 (555) 123-4567");
        assert_eq!(contact.github, "https://github.com/janedoe");
        assert_eq!(contact.linkedin, "linkedin.com/in/jane-doe");
    }

    #[test]
    fn test_date_ranges_are_not_phone_numbers() {
        assert_eq!(find_phone("Acme (2015-2019), Initech 2019 - 2022"), None);
    }

    #[tokio::test]
    async fn test_regex_extractor_keeps_whole_text() {
        let resume = RegexSectionExtractor.extract(SAMPLE).await;
        assert_eq!(resume.personal_information.email, "jane.doe@example.com");
        assert_eq!(resume.unstructured_text_blocks, vec![SAMPLE.to_string()]);
        assert!(resume.skills.is_empty());
    }

    #[test]
    fn test_chunks_follow_paragraphs() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        assert_eq!(chunk_text(text, 10), vec!["aaaa\n\nbbbb", "cccc"]);
        assert_eq!(chunk_text(text, 100), vec![text]);
    }

    #[test]
    fn test_oversized_paragraph_is_hard_split() {
        let text = format!("{}\n\nshort", "x".repeat(25));
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks[..2], ["x".repeat(10), "x".repeat(10)]);
        assert_eq!(chunks[2..], ["xxxxx", "short"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_chunking_counts_characters_not_bytes() {
        let text = "é".repeat(7);
        let chunks = chunk_text(&text, 3);
        assert_eq!(chunks, vec!["ééé", "ééé", "é"]);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(chunk_text(" \r\n\r\n  ", CHUNK_LIMIT).is_empty());
    }

    #[test]
    fn test_into_event_maps_empty_links_to_none() {
        let mut resume = ExtractedResume::default();
        resume.personal_information.github = "github.com/jane".into();
        resume.skills = vec!["Rust".into()];

        let event = resume.into_event("r1".into(), "raw".into());
        assert_eq!(event.id, "r1");
        assert_eq!(event.personal_information.github.as_deref(), Some("github.com/jane"));
        assert!(event.personal_information.linkedin.is_none());
        assert_eq!(event.content.as_deref(), Some("raw"));
        assert_eq!(event.skills, vec!["Rust"]);
    }
}
