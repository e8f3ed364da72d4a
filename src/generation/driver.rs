//! Progress driver.
//!
//! Executes one run at a time. Every status change is published to the
//! store as a fresh snapshot, so observers see each transition exactly
//! once and in order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::executor::{Pacing, WorkExecutor, WorkUnit};
use super::{GenerationError, GenerationRecord, GenerationRequest};
use crate::notifications::{NotificationEvent, NotificationService};
use crate::steps::{content_plan_pipeline, Step, StepStatus, TransitionError};
use crate::store::{Run, RunStore};

/// Clears the busy flag when the run ends, however it ends
struct RunGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(busy: &'a AtomicBool) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { busy })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// The run being driven, published after every mutation
struct ActiveRun<'a> {
    store: &'a RunStore,
    run: Run,
}

impl<'a> ActiveRun<'a> {
    fn start(store: &'a RunStore, steps: Vec<Step>) -> Self {
        let active = Self {
            store,
            run: Run {
                id: Uuid::new_v4(),
                steps,
                active: true,
            },
        };
        active.publish();
        active
    }

    fn publish(&self) {
        self.store.publish(self.run.clone());
    }

    fn id(&self) -> Uuid {
        self.run.id
    }

    fn begin_step(&mut self, step: usize) -> Result<(), TransitionError> {
        self.run.steps[step].begin(Utc::now())?;
        debug!(run_id = %self.run.id, step = %self.run.steps[step].id, "Step started");
        self.publish();
        Ok(())
    }

    fn complete_step(&mut self, step: usize) -> Result<(), TransitionError> {
        self.run.steps[step].complete(Utc::now())?;
        debug!(run_id = %self.run.id, step = %self.run.steps[step].id, "Step completed");
        self.publish();
        Ok(())
    }

    fn begin_substep(&mut self, step: usize, sub: usize) -> Result<(), TransitionError> {
        self.run.steps[step].substeps[sub].begin()?;
        debug!(
            run_id = %self.run.id,
            step = %self.run.steps[step].id,
            substep = %self.run.steps[step].substeps[sub].id,
            "Substep started"
        );
        self.publish();
        Ok(())
    }

    fn complete_substep(&mut self, step: usize, sub: usize) -> Result<(), TransitionError> {
        self.run.steps[step].substeps[sub].complete(Utc::now())?;
        debug!(
            run_id = %self.run.id,
            step = %self.run.steps[step].id,
            substep = %self.run.steps[step].substeps[sub].id,
            "Substep completed"
        );
        self.publish();
        Ok(())
    }

    /// Mark the in-flight substep and its step as failed, one publish each
    fn fail_in_flight(&mut self) {
        let Some(index) = self
            .run
            .steps
            .iter()
            .position(|s| s.status == StepStatus::InProgress)
        else {
            return;
        };

        let step = &mut self.run.steps[index];
        if let Some(sub) = step.in_flight_substep() {
            if step.substeps[sub].fail().is_ok() {
                self.publish();
            }
        }

        if self.run.steps[index].fail().is_ok() {
            self.publish();
        }
    }

    /// Close the run, keeping its steps as the terminal snapshot
    fn finish(&mut self) {
        self.run.active = false;
        self.publish();
    }

    fn run(&self) -> &Run {
        &self.run
    }
}

pub struct ProgressDriver {
    store: RunStore,
    executor: Arc<dyn WorkExecutor>,
    notifications: Arc<NotificationService>,
    pacing: Pacing,
    pipeline: Vec<Step>,
    busy: AtomicBool,
}

impl ProgressDriver {
    pub fn new(
        store: RunStore,
        executor: Arc<dyn WorkExecutor>,
        notifications: Arc<NotificationService>,
        pacing: Pacing,
    ) -> Self {
        Self {
            store,
            executor,
            notifications,
            pacing,
            pipeline: content_plan_pipeline(),
            busy: AtomicBool::new(false),
        }
    }

    /// Run a different pipeline than the content plan template
    pub fn with_pipeline(mut self, pipeline: Vec<Step>) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn store(&self) -> &RunStore {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub async fn run(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationRecord, GenerationError> {
        self.run_with_cancel(request, CancellationToken::new()).await
    }

    /// Drive one run to completion, failure or cancellation.
    ///
    /// Returns [`GenerationError::AlreadyRunning`] without touching the store
    /// while another run holds the driver.
    pub async fn run_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: CancellationToken,
    ) -> Result<GenerationRecord, GenerationError> {
        let Some(_guard) = RunGuard::acquire(&self.busy) else {
            warn!(request_id = %request.id, "Generation requested while another run is active");
            self.notifications.notify(NotificationEvent::GenerationBusy);
            return Err(GenerationError::AlreadyRunning);
        };

        let mut run = ActiveRun::start(&self.store, self.pipeline.clone());
        info!(
            run_id = %run.id(),
            request_id = %request.id,
            company = %request.company,
            steps = run.run().steps.len(),
            "Generation started"
        );

        match self.walk(&mut run, request, &cancel).await {
            Ok(()) => {
                run.finish();
                let record = GenerationRecord::from_run(request, run.run(), None);
                info!(
                    run_id = %run.id(),
                    request_id = %request.id,
                    elapsed_secs = record.elapsed_secs(),
                    "Generation completed"
                );
                self.notifications
                    .notify(NotificationEvent::GenerationCompleted {
                        run_id: run.id(),
                        request_id: request.id.clone(),
                        company: request.company.clone(),
                    });
                Ok(record)
            }
            Err(e) => {
                run.fail_in_flight();
                run.finish();
                match e {
                    GenerationError::Cancelled => {
                        warn!(run_id = %run.id(), request_id = %request.id, "Generation cancelled")
                    }
                    _ => {
                        error!(run_id = %run.id(), request_id = %request.id, error = %e, "Generation failed")
                    }
                }
                self.notifications
                    .notify(NotificationEvent::GenerationFailed {
                        run_id: run.id(),
                        request_id: request.id.clone(),
                        error: e.to_string(),
                    });
                Err(e)
            }
        }
    }

    async fn walk(
        &self,
        run: &mut ActiveRun<'_>,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<(), GenerationError> {
        for index in 0..run.run().steps.len() {
            run.begin_step(index)?;

            let step = &run.run().steps[index];
            if step.is_atomic() {
                let unit = WorkUnit::step(&step.id, &step.title);
                self.perform(request, &unit, cancel).await?;
            } else {
                for sub in 0..step.substeps.len() {
                    run.begin_substep(index, sub)?;
                    let step = &run.run().steps[index];
                    let unit = WorkUnit::substep(&step.id, &step.substeps[sub].id, &step.substeps[sub].title);
                    self.perform(request, &unit, cancel).await?;
                    run.complete_substep(index, sub)?;
                }
            }

            run.complete_step(index)?;
            if index + 1 < run.run().steps.len() {
                self.pause(self.pacing.step_gap, cancel).await?;
            }
        }

        // Every step is completed: a cancel now only cuts the wind-down short
        self.wind_down(self.pacing.step_gap + self.pacing.finish_delay, cancel)
            .await;
        Ok(())
    }

    async fn perform(
        &self,
        request: &GenerationRequest,
        unit: &WorkUnit,
        cancel: &CancellationToken,
    ) -> Result<(), GenerationError> {
        let work = self.executor.execute(request, unit);

        let outcome = match self.pacing.unit_timeout {
            Some(limit) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                res = tokio::time::timeout(limit, work) => match res {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        return Err(GenerationError::Timeout {
                            unit: unit.to_string(),
                        })
                    }
                },
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                res = work => res,
            },
        };

        outcome.map_err(|error| GenerationError::Work {
            unit: unit.to_string(),
            error,
        })
    }

    async fn wind_down(&self, duration: Duration, cancel: &CancellationToken) {
        if duration.is_zero() || cancel.is_cancelled() {
            return;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancelled after the last step, finishing early");
            }
            _ = tokio::time::sleep(duration) => {}
        }
    }

    async fn pause(
        &self,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), GenerationError> {
        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }
        if duration.is_zero() {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
