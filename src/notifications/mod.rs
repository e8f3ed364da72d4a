//! Notification system for generation events.
//!
//! Events are dispatched by [`NotificationService`] to every registered
//! integration (in-app toasts, the log). Delivery is best-effort: an
//! integration failing never affects the run that raised the event.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod integration;
mod log_integration;
mod service;
mod toast;

pub use integration::NotificationIntegration;
pub use log_integration::LogIntegration;
pub use service::NotificationService;
pub use toast::{Toast, ToastIntegration, ToastKind, ToastQueue};

/// All notification events that can be dispatched to integrations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum NotificationEvent {
    /// Every step of a run completed
    #[serde(rename = "generation.completed")]
    GenerationCompleted {
        run_id: Uuid,
        request_id: String,
        company: String,
    },

    /// A run stopped on an error or was cancelled
    #[serde(rename = "generation.failed")]
    GenerationFailed {
        run_id: Uuid,
        request_id: String,
        error: String,
    },

    /// A run was requested while another one is active
    #[serde(rename = "generation.busy")]
    GenerationBusy,

    /// The brief failed validation; no run was started
    #[serde(rename = "brief.invalid")]
    MissingInformation { reason: String },
}

impl NotificationEvent {
    /// Get the event type string for filtering (e.g., "generation.completed")
    pub fn event_type(&self) -> &'static str {
        match self {
            NotificationEvent::GenerationCompleted { .. } => "generation.completed",
            NotificationEvent::GenerationFailed { .. } => "generation.failed",
            NotificationEvent::GenerationBusy => "generation.busy",
            NotificationEvent::MissingInformation { .. } => "brief.invalid",
        }
    }

    pub fn kind(&self) -> ToastKind {
        match self {
            NotificationEvent::GenerationCompleted { .. } => ToastKind::Success,
            NotificationEvent::GenerationFailed { .. } => ToastKind::Error,
            NotificationEvent::GenerationBusy => ToastKind::Warning,
            NotificationEvent::MissingInformation { .. } => ToastKind::Error,
        }
    }

    /// Fixed user-facing (title, description)
    pub fn headline(&self) -> (&'static str, &'static str) {
        match self {
            NotificationEvent::GenerationCompleted { .. } => (
                "Content Generation Complete!",
                "Your content plan has been generated and is ready for review.",
            ),
            NotificationEvent::GenerationFailed { .. } => (
                "Generation Failed",
                "There was an error generating your content. Please try again.",
            ),
            NotificationEvent::GenerationBusy => (
                "Generation In Progress",
                "Wait for the current content plan to finish before starting another.",
            ),
            NotificationEvent::MissingInformation { .. } => (
                "Missing Information",
                "Please provide company name and at least one primary keyword.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_strings() {
        let run_id = Uuid::new_v4();
        let test_cases = vec![
            (
                NotificationEvent::GenerationCompleted {
                    run_id,
                    request_id: "abc".into(),
                    company: "Acme".into(),
                },
                "generation.completed",
            ),
            (
                NotificationEvent::GenerationFailed {
                    run_id,
                    request_id: "abc".into(),
                    error: "boom".into(),
                },
                "generation.failed",
            ),
            (NotificationEvent::GenerationBusy, "generation.busy"),
            (
                NotificationEvent::MissingInformation {
                    reason: "company name is required".into(),
                },
                "brief.invalid",
            ),
        ];

        for (event, expected_type) in test_cases {
            assert_eq!(
                event.event_type(),
                expected_type,
                "Event {:?} should have type '{}'",
                event,
                expected_type
            );
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = NotificationEvent::GenerationFailed {
            run_id: Uuid::nil(),
            request_id: "k2j3h4g5f".into(),
            error: "keyword-research/primary-keywords: timed out".into(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"generation.failed\""));
        assert!(json.contains("\"request_id\":\"k2j3h4g5f\""));

        let deserialized: NotificationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_headlines_are_fixed_text() {
        let done = NotificationEvent::GenerationCompleted {
            run_id: Uuid::nil(),
            request_id: "x".into(),
            company: "Acme".into(),
        };
        assert_eq!(done.headline().0, "Content Generation Complete!");
        assert_eq!(done.kind(), ToastKind::Success);

        let missing = NotificationEvent::MissingInformation {
            reason: "whatever".into(),
        };
        assert_eq!(missing.headline().0, "Missing Information");
        assert_eq!(missing.kind(), ToastKind::Error);
    }
}
