//! Writes notification events to the tracing log.

use anyhow::Result;
use async_trait::async_trait;

use super::integration::NotificationIntegration;
use super::NotificationEvent;

pub struct LogIntegration {
    enabled: bool,
}

impl LogIntegration {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl NotificationIntegration for LogIntegration {
    fn name(&self) -> &str {
        "log"
    }

    fn handles_event(&self, _event: &NotificationEvent) -> bool {
        true
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        match event {
            NotificationEvent::GenerationFailed { .. } => {
                tracing::warn!(event = %event.event_type(), %payload, "Notification");
            }
            _ => tracing::info!(event = %event.event_type(), %payload, "Notification"),
        }
        Ok(())
    }
}
