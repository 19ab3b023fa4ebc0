use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::bus::{BusMessage, HandlerError, MessageHandler};
use crate::models::{decode_payload, MatchResult};
use crate::notification::mailer::{EmailMessage, MailError, Mailer};

pub const MATCH_SUBJECT: &str = "New Job Match Found";

pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    from: String,
    to: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, from: String, to: String) -> Self {
        Self { mailer, from, to }
    }

    pub async fn notify(&self, result: &MatchResult) -> Result<(), MailError> {
        let message = match_email(result, &self.from, &self.to);
        self.mailer.send(&message).await?;
        info!(
            job_id = %result.job_id,
            resume_id = %result.resume_id,
            score = result.score,
            "Match notification sent"
        );
        Ok(())
    }
}

pub fn match_email(result: &MatchResult, from: &str, to: &str) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: MATCH_SUBJECT.to_string(),
        text: format!(
            "You have a new job match with a score of {}.\n\n\
             Reasoning: {}\n\
             Job ID: {}\n\
             Resume ID: {}\n",
            result.score, result.reasoning, result.job_id, result.resume_id
        ),
    }
}

/// Subscription handler for the match channel. Delivery failures are logged
/// and not retried.
pub struct NotificationHandler {
    notifier: Arc<Notifier>,
}

impl NotificationHandler {
    pub fn new(notifier: Arc<Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl MessageHandler for NotificationHandler {
    async fn handle(&self, message: BusMessage) -> Result<(), HandlerError> {
        let result: MatchResult = decode_payload(&message.payload)?;
        if let Err(e) = self.notifier.notify(&result).await {
            error!(
                job_id = %result.job_id,
                resume_id = %result.resume_id,
                "Failed to deliver match notification: {e}"
            );
        }
        Ok(())
    }
}
