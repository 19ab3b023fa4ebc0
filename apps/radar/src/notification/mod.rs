//! Notification Consumer: one email per `MatchResult` on the match channel.

pub mod mailer;
pub mod notifier;

pub use mailer::{EmailMessage, HttpMailer, LogMailer, MailError, Mailer, SmtpMailer};
pub use notifier::{match_email, NotificationHandler, Notifier};
