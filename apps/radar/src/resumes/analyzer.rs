use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bus::{publish_event, BusError, MessageBus};
use crate::embedding::{embed_best_effort, Embedder, EntityType};
use crate::models::ResumeAvailable;
use crate::resumes::extraction::SectionExtractor;

/// Resume Producer pipeline: extract, enrich, publish.
pub struct ResumeAnalyzer {
    extractor: Arc<dyn SectionExtractor>,
    embedder: Option<Arc<dyn Embedder>>,
    bus: Arc<dyn MessageBus>,
}

impl ResumeAnalyzer {
    pub fn new(
        extractor: Arc<dyn SectionExtractor>,
        embedder: Option<Arc<dyn Embedder>>,
        bus: Arc<dyn MessageBus>,
    ) -> Self {
        Self {
            extractor,
            embedder,
            bus,
        }
    }

    /// Builds a `ResumeAvailable` from raw text and publishes it. Extraction
    /// and embedding degrade; only the publish itself can fail.
    pub async fn analyze(&self, text: &str) -> Result<ResumeAvailable, BusError> {
        let mut extracted = self.extractor.extract(text).await;
        extracted.fill_contacts_from(text);
        if !extracted.has_sections() {
            warn!("Extraction produced no sections, keeping raw text as one block");
            extracted.unstructured_text_blocks.push(text.trim().to_string());
        }

        let mut resume = extracted.into_event(Uuid::new_v4().to_string(), text.to_string());

        let sections = embed_sections(&resume);
        let metadata = json!({
            "resume_id": resume.id,
            "name": resume.personal_information.name,
        });
        resume.embeddings = embed_best_effort(
            self.embedder.as_deref(),
            EntityType::Resume,
            &sections,
            &metadata,
        )
        .await;

        publish_event(self.bus.as_ref(), &resume).await?;
        info!(
            resume_id = %resume.id,
            skills = resume.skills.len(),
            embedded = resume.embeddings.is_some(),
            "Resume published"
        );
        Ok(resume)
    }
}

fn embed_sections(resume: &ResumeAvailable) -> BTreeMap<String, String> {
    [
        ("skills", &resume.skills),
        ("education", &resume.education),
        ("workExperience", &resume.work_experience),
        ("projects", &resume.projects),
    ]
    .into_iter()
    .filter(|(_, items)| !items.is_empty())
    .map(|(name, items)| (name.to_string(), items.join("\n")))
    .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::bus::InMemoryBus;
    use crate::embedding::EmbeddingError;
    use crate::models::{decode_payload, Channel, Embeddings};
    use crate::resumes::extraction::{ExtractedResume, RegexSectionExtractor};

    struct CannedExtractor(ExtractedResume);

    #[async_trait]
    impl SectionExtractor for CannedExtractor {
        async fn extract(&self, _text: &str) -> ExtractedResume {
            self.0.clone()
        }
    }

    struct SectionEcho;

    #[async_trait]
    impl Embedder for SectionEcho {
        async fn embed(
            &self,
            _entity_type: EntityType,
            sections: &BTreeMap<String, String>,
            _metadata: &Value,
        ) -> Result<Embeddings, EmbeddingError> {
            Ok(sections
                .iter()
                .map(|(k, v)| (k.clone(), vec![v.len() as f32]))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_analyze_publishes_structured_resume() {
        let bus = Arc::new(InMemoryBus::new());
        let mut rx = bus.subscribe_raw(&[Channel::Resume]).await.unwrap();
        let mut canned = ExtractedResume::default();
        canned.personal_information.name = "Jane Doe".into();
        canned.skills = vec!["Rust".into(), "SQL".into()];
        canned.work_experience = vec!["Engineer at XYZ".into()];

        let analyzer = ResumeAnalyzer::new(
            Arc::new(CannedExtractor(canned)),
            Some(Arc::new(SectionEcho)),
            bus.clone(),
        );
        let text = "Jane Doe\njane@example.com\nRust, SQL";
        let resume = analyzer.analyze(text).await.unwrap();

        assert_eq!(resume.personal_information.email, "jane@example.com");
        assert_eq!(resume.content.as_deref(), Some(text));
        let vectors = resume.embeddings.as_ref().unwrap();
        assert_eq!(vectors["skills"], vec!["Rust\nSQL".len() as f32]);
        assert!(vectors.contains_key("workExperience"));
        assert!(!vectors.contains_key("projects"));

        let published: ResumeAvailable = decode_payload(&rx.recv().await.unwrap().payload).unwrap();
        assert_eq!(published, resume);
    }

    #[tokio::test]
    async fn test_regex_only_keeps_text_and_skips_embedding_without_sections() {
        let analyzer = ResumeAnalyzer::new(
            Arc::new(RegexSectionExtractor),
            Some(Arc::new(SectionEcho)),
            Arc::new(InMemoryBus::new()),
        );
        let resume = analyzer
            .analyze("Reach me at dev@example.org")
            .await
            .unwrap();

        assert_eq!(resume.personal_information.email, "dev@example.org");
        assert_eq!(resume.unstructured_text_blocks, vec!["Reach me at dev@example.org"]);
        assert!(resume.embeddings.is_none());
    }

    #[tokio::test]
    async fn test_empty_extraction_falls_back_to_raw_text() {
        let analyzer = ResumeAnalyzer::new(
            Arc::new(CannedExtractor(ExtractedResume::default())),
            None,
            Arc::new(InMemoryBus::new()),
        );
        let resume = analyzer.analyze("  Just a paragraph.  ").await.unwrap();
        assert_eq!(resume.unstructured_text_blocks, vec!["Just a paragraph."]);
    }

    #[tokio::test]
    async fn test_publish_failure_is_returned() {
        let bus = Arc::new(InMemoryBus::new());
        bus.set_connected(false);
        let analyzer = ResumeAnalyzer::new(Arc::new(RegexSectionExtractor), None, bus);
        assert!(matches!(
            analyzer.analyze("text").await,
            Err(BusError::NotReady(_))
        ));
    }
}
