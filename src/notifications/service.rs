//! Central notification service that dispatches events to all integrations.

use std::sync::Arc;

use super::integration::NotificationIntegration;
use super::log_integration::LogIntegration;
use super::toast::{ToastIntegration, ToastQueue};
use super::NotificationEvent;
use crate::config::Config;

/// Central notification dispatcher.
///
/// Receives events and dispatches them to all enabled integrations
/// that handle the given event type.
pub struct NotificationService {
    integrations: Vec<Arc<dyn NotificationIntegration>>,
    enabled: bool,
}

impl NotificationService {
    /// Create a notification service from config, with toasts going to `toasts`.
    pub fn from_config(config: &Config, toasts: ToastQueue) -> Self {
        let mut integrations: Vec<Arc<dyn NotificationIntegration>> = vec![Arc::new(
            ToastIntegration::new(toasts, config.toast_duration()),
        )];

        if config.notifications.log_events {
            integrations.push(Arc::new(LogIntegration::new(true)));
        }

        Self {
            integrations,
            enabled: config.notifications.enabled,
        }
    }

    pub fn with_integrations(integrations: Vec<Arc<dyn NotificationIntegration>>) -> Self {
        Self {
            integrations,
            enabled: true,
        }
    }

    /// Create a disabled notification service (for testing).
    pub fn disabled() -> Self {
        Self {
            integrations: Vec::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn integration_count(&self) -> usize {
        self.integrations.len()
    }

    /// Dispatch a notification to all enabled integrations that handle the event.
    ///
    /// This is fire-and-forget - each integration is spawned as a separate task
    /// and errors are logged but not propagated.
    pub fn notify(&self, event: NotificationEvent) {
        if !self.enabled {
            return;
        }

        for integration in &self.integrations {
            if integration.is_enabled() && integration.handles_event(&event) {
                let integration = integration.clone();
                let event = event.clone();

                tokio::spawn(async move {
                    if let Err(e) = integration.send(&event).await {
                        tracing::warn!(
                            integration = %integration.name(),
                            event = %event.event_type(),
                            error = %e,
                            "Notification delivery failed"
                        );
                    }
                });
            }
        }
    }
}
