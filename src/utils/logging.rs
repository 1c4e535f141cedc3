use tracing_subscriber::EnvFilter;
use crate::core::{Notification, NotificationStatus, Notifier};

const DEFAULT_FILTER: &str = "info";

/// Install the global fmt subscriber. `RUST_LOG` overrides the default
/// `info` filter.
pub fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("Failed to initialize tracing: {}", err))
}

/// 把提示消息写进日志，CLI 下代替 toast
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        let Notification { title, description, status } = notification;

        match status {
            NotificationStatus::Success => {
                tracing::info!(%title, %description, "notification");
            }
            NotificationStatus::Error => {
                tracing::error!(%title, %description, "notification");
            }
        }
    }
}
