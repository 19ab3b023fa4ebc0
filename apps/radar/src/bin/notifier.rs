use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use resume_radar::bus::{subscribe, MessageBus, RedisBus};
use resume_radar::config::{Config, NotifierConfig};
use resume_radar::models::Channel;
use resume_radar::notification::{
    HttpMailer, LogMailer, Mailer, NotificationHandler, Notifier, SmtpMailer,
};
use resume_radar::routes::{health_router, serve};
use resume_radar::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env(3004)?;
    let notifier_config = NotifierConfig::from_env()?;

    init_tracing(env!("CARGO_CRATE_NAME"), &config.rust_log);
    info!("Starting notifier v{}", env!("CARGO_PKG_VERSION"));

    let bus: Arc<dyn MessageBus> = Arc::new(
        RedisBus::connect(&config.redis_url, config.bus_reconnect_delay)
            .await
            .context("Failed to connect to Redis")?,
    );

    let mailer: Arc<dyn Mailer> = match (
        notifier_config.smtp_host.as_deref(),
        notifier_config.mail_relay_url,
    ) {
        (Some(host), _) => {
            let port = notifier_config.smtp_port;
            info!("Delivering mail over SMTP to {host}:{port}");
            Arc::new(SmtpMailer::new(host, port, config.collaborator_timeout))
        }
        (None, Some(url)) => {
            info!("Delivering mail through relay at {url}");
            Arc::new(
                HttpMailer::new(url, config.collaborator_timeout)
                    .context("Failed to build mail relay client")?,
            )
        }
        (None, None) => {
            info!("Neither SMTP_HOST nor MAIL_RELAY_URL set, notifications go to the log");
            Arc::new(LogMailer)
        }
    };

    let notifier = Arc::new(Notifier::new(
        mailer,
        notifier_config.email_from,
        notifier_config.email_to,
    ));

    let subscription = subscribe(
        bus.as_ref(),
        &[Channel::Match],
        Arc::new(NotificationHandler::new(notifier)),
    )
    .await
    .context("Failed to subscribe to the match channel")?;
    info!("Subscribed to {}", Channel::Match);

    tokio::select! {
        result = serve(health_router("notifier"), config.port) => result,
        ended = subscription => Err(anyhow!("Subscription loop ended: {ended:?}")),
    }
}
