//! Notification integration trait definition.

use anyhow::Result;
use async_trait::async_trait;

use super::NotificationEvent;

/// Trait for notification integrations.
///
/// Each integration (toasts, log, ...) implements this trait to receive
/// and handle notification events.
#[async_trait]
pub trait NotificationIntegration: Send + Sync {
    /// Integration name (for logging)
    fn name(&self) -> &str;

    /// Check if this integration handles the given event type.
    fn handles_event(&self, event: &NotificationEvent) -> bool;

    fn is_enabled(&self) -> bool;

    /// Deliver one event. Errors are logged by the caller and dropped.
    async fn send(&self, event: &NotificationEvent) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock integration for testing
    struct MockIntegration {
        events: Vec<String>,
        sent_events: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl NotificationIntegration for MockIntegration {
        fn name(&self) -> &str {
            "mock"
        }

        fn handles_event(&self, event: &NotificationEvent) -> bool {
            self.events.is_empty() || self.events.contains(&event.event_type().to_string())
        }

        fn is_enabled(&self) -> bool {
            true
        }

        async fn send(&self, event: &NotificationEvent) -> Result<()> {
            self.sent_events
                .lock()
                .unwrap()
                .push(event.event_type().to_string());
            Ok(())
        }
    }

    #[test]
    fn test_handles_event_empty_filter_matches_all() {
        let integration = MockIntegration {
            events: vec![],
            sent_events: Default::default(),
        };
        assert!(integration.handles_event(&NotificationEvent::GenerationBusy));
    }

    #[test]
    fn test_handles_event_specific_filter() {
        let integration = MockIntegration {
            events: vec!["generation.busy".into()],
            sent_events: Default::default(),
        };
        assert!(integration.handles_event(&NotificationEvent::GenerationBusy));
        assert!(!integration.handles_event(&NotificationEvent::MissingInformation {
            reason: "x".into()
        }));
    }

    #[tokio::test]
    async fn test_send_records_event() {
        let sent = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let integration = MockIntegration {
            events: vec![],
            sent_events: sent.clone(),
        };
        integration
            .send(&NotificationEvent::GenerationBusy)
            .await
            .unwrap();
        assert_eq!(*sent.lock().unwrap(), vec!["generation.busy".to_string()]);
    }
}
