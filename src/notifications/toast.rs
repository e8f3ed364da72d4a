//! In-app toasts.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use super::integration::NotificationIntegration;
use super::NotificationEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub title: String,
    pub description: Option<String>,
    pub shown_at: Instant,
    /// `None` keeps the toast until dismissed
    pub duration: Option<Duration>,
}

impl Toast {
    pub fn new(kind: ToastKind, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            description: None,
            shown_at: Instant::now(),
            duration: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.duration
            .is_some_and(|d| now.saturating_duration_since(self.shown_at) >= d)
    }
}

/// Shared list of toasts currently on screen
#[derive(Clone, Default)]
pub struct ToastQueue {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, toast: Toast) -> Uuid {
        let id = toast.id;
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
        id
    }

    pub fn dismiss(&self, id: Uuid) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|t| t.id != id);
    }

    /// Drop expired toasts and return the rest, oldest first
    pub fn visible_at(&self, now: Instant) -> Vec<Toast> {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        toasts.retain(|t| !t.is_expired(now));
        toasts.clone()
    }

    pub fn visible(&self) -> Vec<Toast> {
        self.visible_at(Instant::now())
    }

    /// Remove and return everything, expired or not
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turns every event into a toast
pub struct ToastIntegration {
    queue: ToastQueue,
    duration: Duration,
}

impl ToastIntegration {
    pub fn new(queue: ToastQueue, duration: Duration) -> Self {
        Self { queue, duration }
    }
}

#[async_trait]
impl NotificationIntegration for ToastIntegration {
    fn name(&self) -> &str {
        "toast"
    }

    fn handles_event(&self, _event: &NotificationEvent) -> bool {
        true
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        let (title, description) = event.headline();
        self.queue.push(
            Toast::new(event.kind(), title)
                .with_description(description)
                .with_duration(self.duration),
        );
        Ok(())
    }
}
