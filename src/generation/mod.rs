//! Content generation runs.
//!
//! [`ProgressDriver`] walks the pipeline for one [`GenerationRequest`],
//! publishing every status change to the [`crate::store::RunStore`] and
//! handing each unit of work to a [`WorkExecutor`].

mod driver;
mod executor;
mod request;

use thiserror::Error;

pub use driver::ProgressDriver;
pub use executor::{DelayBand, Pacing, SimulatedExecutor, WorkExecutor, WorkUnit};
pub use request::{
    BriefError, GenerationBrief, GenerationRecord, GenerationRequest, PlanDuration, RecordStatus,
};

use crate::steps::TransitionError;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("a generation run is already in progress")]
    AlreadyRunning,

    #[error("generation was cancelled")]
    Cancelled,

    #[error("{unit}: timed out")]
    Timeout { unit: String },

    #[error("{unit}: {error:#}")]
    Work { unit: String, error: anyhow::Error },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl GenerationError {
    /// Whether the error came from the run itself rather than the guard
    pub fn is_run_failure(&self) -> bool {
        !matches!(self, GenerationError::AlreadyRunning)
    }
}
