use std::sync::Arc;

use async_trait::async_trait;

use crate::bus::{BusMessage, HandlerError, MessageHandler};
use crate::matching::coordinator::MatchCoordinator;
use crate::models::InboundEvent;

/// Bridges the job and resume channels into the coordinator. Payloads that
/// fail to decode are rejected before they reach the buffers.
pub struct CoordinatorHandler {
    coordinator: Arc<MatchCoordinator>,
}

impl CoordinatorHandler {
    pub fn new(coordinator: Arc<MatchCoordinator>) -> Self {
        Self { coordinator }
    }
}

#[async_trait]
impl MessageHandler for CoordinatorHandler {
    async fn handle(&self, message: BusMessage) -> Result<(), HandlerError> {
        match InboundEvent::decode(&message.channel, &message.payload)? {
            InboundEvent::Job(job) => {
                self.coordinator.on_job_available(job).await;
            }
            InboundEvent::Resume(resume) => {
                self.coordinator.on_resume_available(resume).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bus::{subscribe, InMemoryBus, MessageBus};
    use crate::matching::coordinator::CoordinatorSettings;
    use crate::matching::scoring::{MatchScorer, MatchVerdict, ScoringError};
    use crate::models::{decode_payload, Channel, JobAvailable, MatchResult, ResumeAvailable};

    struct FixedScorer(f64);

    #[async_trait]
    impl MatchScorer for FixedScorer {
        async fn score(
            &self,
            _job: &JobAvailable,
            _resume: &ResumeAvailable,
        ) -> Result<MatchVerdict, ScoringError> {
            Ok(MatchVerdict {
                score: self.0,
                reasoning: "fixed".into(),
            })
        }
    }

    fn coordinator(bus: Arc<InMemoryBus>) -> Arc<MatchCoordinator> {
        Arc::new(MatchCoordinator::new(
            Arc::new(FixedScorer(7.0)),
            bus,
            CoordinatorSettings::default(),
        ))
    }

    #[tokio::test]
    async fn test_malformed_job_is_rejected_and_not_buffered() {
        let coordinator = coordinator(Arc::new(InMemoryBus::new()));
        let handler = CoordinatorHandler::new(coordinator.clone());

        let result = handler
            .handle(BusMessage {
                channel: "job_channel".into(),
                payload: "{\"title\": 42".into(),
            })
            .await;

        assert!(matches!(result, Err(HandlerError::Decode(_))));
        assert_eq!(coordinator.pending(), (0, 0));
    }

    #[tokio::test]
    async fn test_end_to_end_over_the_bus() {
        let bus = Arc::new(InMemoryBus::new());
        let coordinator = coordinator(bus.clone());
        let mut matches = bus.subscribe_raw(&[Channel::Match]).await.unwrap();
        let subscription = subscribe(
            bus.as_ref(),
            &[Channel::Job, Channel::Resume],
            Arc::new(CoordinatorHandler::new(coordinator.clone())),
        )
        .await
        .unwrap();

        // Garbage first: it must be dropped without ending the subscription.
        bus.publish_raw(Channel::Job, "definitely not json".into())
            .await
            .unwrap();
        bus.publish_raw(
            Channel::Job,
            r#"{"id":"j1","title":"Backend Engineer","description":"..."}"#.into(),
        )
        .await
        .unwrap();

        for _ in 0..200 {
            if coordinator.pending() == (1, 0) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(coordinator.pending(), (1, 0));

        bus.publish_raw(Channel::Resume, r#"{"id":"r1","content":"..."}"#.into())
            .await
            .unwrap();

        let message = tokio::time::timeout(Duration::from_secs(1), matches.recv())
            .await
            .unwrap()
            .unwrap();
        let result: MatchResult = decode_payload(&message.payload).unwrap();
        assert_eq!(result.job_id, "j1");
        assert_eq!(result.resume_id, "r1");
        assert_eq!(result.score, 7.0);

        for _ in 0..200 {
            if coordinator.pending() == (0, 0) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(coordinator.pending(), (0, 0));
        assert!(!subscription.is_finished());
    }
}
