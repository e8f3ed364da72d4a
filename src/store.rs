//! Shared run store.
//!
//! Holds the current [`Run`] snapshot and notifies subscribers synchronously
//! on every publish. Snapshots are immutable `Arc<Run>` values: a publish
//! swaps the whole snapshot, so readers never observe a half-applied update.
//!
//! The store is an explicit handle. Clone it into whatever needs to read or
//! publish; every clone shares the same snapshot and subscriber list.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use uuid::Uuid;

use crate::steps::{Step, StepStatus};

/// One end-to-end execution of the generation pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub id: Uuid,
    pub steps: Vec<Step>,
    pub active: bool,
}

impl Run {
    /// The idle run the store starts with
    pub fn empty() -> Self {
        Self {
            id: Uuid::nil(),
            steps: Vec::new(),
            active: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when there is at least one step and every step is completed
    pub fn all_completed(&self) -> bool {
        !self.steps.is_empty()
            && self
                .steps
                .iter()
                .all(|s| s.status == StepStatus::Completed)
    }

    pub fn has_error(&self) -> bool {
        self.steps.iter().any(|s| {
            s.status == StepStatus::Error
                || s.substeps.iter().any(|ss| ss.status == StepStatus::Error)
        })
    }

    /// Finished units as a whole percentage
    pub fn progress(&self) -> u8 {
        let total: usize = self.steps.iter().map(Step::total_units).sum();
        if total == 0 {
            return 0;
        }
        let done: usize = self.steps.iter().map(Step::finished_units).sum();
        ((done * 100) / total) as u8
    }
}

impl Default for Run {
    fn default() -> Self {
        Self::empty()
    }
}

type Callback = Arc<dyn Fn(&Arc<Run>) + Send + Sync>;

struct Inner {
    current: RwLock<Arc<Run>>,
    subscribers: Mutex<Vec<(u64, Callback)>>,
    next_subscriber: AtomicU64,
    publishes: AtomicU64,
}

impl Inner {
    fn remove(&self, id: u64) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(sid, _)| *sid != id);
    }
}

/// Process-wide holder of the current run
#[derive(Clone)]
pub struct RunStore {
    inner: Arc<Inner>,
}

impl RunStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(Arc::new(Run::empty())),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(1),
                publishes: AtomicU64::new(0),
            }),
        }
    }

    /// Current snapshot
    pub fn current(&self) -> Arc<Run> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the run and notify every subscriber.
    ///
    /// Callbacks run on the caller's thread after the snapshot is swapped and
    /// with no lock held, so they may read the store or (un)subscribe. They
    /// must not publish.
    pub fn publish(&self, run: Run) {
        let snapshot = Arc::new(run);
        {
            let mut current = self
                .inner
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *current = Arc::clone(&snapshot);
        }
        self.inner.publishes.fetch_add(1, Ordering::SeqCst);

        let callbacks: Vec<Callback> = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(&snapshot);
        }
    }

    /// Register an observer. It stays registered until the returned
    /// [`Subscription`] is dropped or passed to [`RunStore::unsubscribe`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<Run>) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::SeqCst);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Publishes since the store was created
    pub fn publish_count(&self) -> u64 {
        self.inner.publishes.load(Ordering::SeqCst)
    }
}

impl Default for RunStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration handle returned by [`RunStore::subscribe`]
pub struct Subscription {
    id: u64,
    store: Weak<Inner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::content_plan_pipeline;
    use std::sync::atomic::AtomicUsize;

    fn active_run(steps: Vec<Step>) -> Run {
        Run {
            id: Uuid::new_v4(),
            steps,
            active: true,
        }
    }

    #[test]
    fn test_starts_with_empty_inactive_run() {
        let store = RunStore::new();
        let run = store.current();
        assert!(run.is_empty());
        assert!(!run.active);
        assert_eq!(store.publish_count(), 0);
    }

    #[test]
    fn test_publish_replaces_snapshot_and_notifies() {
        let store = RunStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |run| sink.lock().unwrap().push(run.steps.len()));

        store.publish(active_run(content_plan_pipeline()));
        store.publish(Run::empty());

        assert_eq!(*seen.lock().unwrap(), vec![8, 0]);
        assert!(store.current().is_empty());
        assert_eq!(store.publish_count(), 2);
    }

    #[test]
    fn test_multiple_subscribers_all_notified() {
        let store = RunStore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&hits);
        let b = Arc::clone(&hits);
        let _s1 = store.subscribe(move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let _s2 = store.subscribe(move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        });

        store.publish(Run::empty());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_and_drop_stop_notifications() {
        let store = RunStore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&hits);
        let b = Arc::clone(&hits);
        let s1 = store.subscribe(move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let s2 = store.subscribe(move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(store.subscriber_count(), 2);

        store.unsubscribe(s1);
        drop(s2);
        assert_eq!(store.subscriber_count(), 0);

        store.publish(Run::empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscriber_can_read_store_during_notify() {
        let store = RunStore::new();
        let reader = store.clone();
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        let _sub = store.subscribe(move |run| {
            *sink.lock().unwrap() = Some(Arc::ptr_eq(run, &reader.current()));
        });

        store.publish(active_run(Vec::new()));
        assert_eq!(*observed.lock().unwrap(), Some(true));
    }

    #[test]
    fn test_run_progress_and_completion() {
        let mut run = active_run(content_plan_pipeline());
        assert_eq!(run.progress(), 0);
        assert!(!run.all_completed());
        assert!(!Run::empty().all_completed());

        let now = chrono::Utc::now();
        for step in &mut run.steps {
            step.begin(now).unwrap();
            for sub in &mut step.substeps {
                sub.begin().unwrap();
                sub.complete(now).unwrap();
            }
            step.complete(now).unwrap();
        }
        assert_eq!(run.progress(), 100);
        assert!(run.all_completed());
    }
}
