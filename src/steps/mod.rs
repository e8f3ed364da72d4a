//! Pipeline step model.
//!
//! A generation run walks an ordered list of [`Step`]s. A step either
//! completes atomically or is split into ordered [`Substep`]s, and both
//! move through the same machine:
//!
//! ```text
//! pending -> in-progress -> completed
//!                        -> error
//! ```
//!
//! Status and timestamp always change together, inside the transition
//! methods below. Nothing else writes `status`.

mod template;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use template::content_plan_pipeline;

/// Status of a step or substep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Error,
}

impl StepStatus {
    /// Whether `self -> next` is a legal move
    pub fn can_transition_to(self, next: StepStatus) -> bool {
        matches!(
            (self, next),
            (StepStatus::Pending, StepStatus::InProgress)
                | (StepStatus::InProgress, StepStatus::Completed)
                | (StepStatus::InProgress, StepStatus::Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Error)
    }

    /// Wire name, e.g. `in-progress`
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in-progress",
            StepStatus::Completed => "completed",
            StepStatus::Error => "error",
        }
    }

    /// Human label for badges
    pub fn label(self) -> &'static str {
        match self {
            StepStatus::Pending => "Pending",
            StepStatus::InProgress => "In Progress",
            StepStatus::Completed => "Completed",
            StepStatus::Error => "Failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{unit}: cannot move from {from} to {to}")]
    Illegal {
        unit: String,
        from: StepStatus,
        to: StepStatus,
    },

    #[error("step {step}: substep {substep} is still {status}")]
    UnfinishedSubstep {
        step: String,
        substep: String,
        status: StepStatus,
    },
}

/// Display-only category tag for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepIcon {
    Brain,
    Search,
    TrendingUp,
    Calendar,
    FileText,
    Image,
    Target,
    Sparkles,
}

impl StepIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            StepIcon::Brain => "◆",
            StepIcon::Search => "⌕",
            StepIcon::TrendingUp => "↗",
            StepIcon::Calendar => "▦",
            StepIcon::FileText => "≡",
            StepIcon::Image => "▣",
            StepIcon::Target => "◎",
            StepIcon::Sparkles => "✦",
        }
    }
}

/// A unit of work nested under a [`Step`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substep {
    pub id: String,
    pub title: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Substep {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: StepStatus::Pending,
            estimated_time: None,
            completed_at: None,
            details: None,
        }
    }

    pub fn with_estimate(mut self, estimate: impl Into<String>) -> Self {
        self.estimated_time = Some(estimate.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn transition(&mut self, to: StepStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError::Illegal {
                unit: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn begin(&mut self) -> Result<(), TransitionError> {
        self.transition(StepStatus::InProgress)
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(StepStatus::Completed)?;
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), TransitionError> {
        self.transition(StepStatus::Error)
    }
}

/// One pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substeps: Vec<Substep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<StepIcon>,
}

impl Step {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            status: StepStatus::Pending,
            estimated_time: None,
            started_at: None,
            completed_at: None,
            substeps: Vec::new(),
            icon: None,
        }
    }

    pub fn with_estimate(mut self, estimate: impl Into<String>) -> Self {
        self.estimated_time = Some(estimate.into());
        self
    }

    pub fn with_icon(mut self, icon: StepIcon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_substeps(mut self, substeps: Vec<Substep>) -> Self {
        self.substeps = substeps;
        self
    }

    /// A step with no substeps runs as a single unit of work
    pub fn is_atomic(&self) -> bool {
        self.substeps.is_empty()
    }

    fn transition(&mut self, to: StepStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError::Illegal {
                unit: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(StepStatus::InProgress)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// Complete the step. Refused while any substep is unfinished.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if let Some(open) = self
            .substeps
            .iter()
            .find(|s| s.status != StepStatus::Completed)
        {
            return Err(TransitionError::UnfinishedSubstep {
                step: self.id.clone(),
                substep: open.id.clone(),
                status: open.status,
            });
        }
        self.transition(StepStatus::Completed)?;
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), TransitionError> {
        self.transition(StepStatus::Error)
    }

    /// Index of the substep currently in progress, if any
    pub fn in_flight_substep(&self) -> Option<usize> {
        self.substeps
            .iter()
            .position(|s| s.status == StepStatus::InProgress)
    }

    /// Units of work this step contributes to overall progress
    pub fn total_units(&self) -> usize {
        self.substeps.len().max(1)
    }

    pub fn finished_units(&self) -> usize {
        if self.is_atomic() {
            usize::from(self.status == StepStatus::Completed)
        } else {
            self.substeps
                .iter()
                .filter(|s| s.status == StepStatus::Completed)
                .count()
        }
    }
}

/// Number of store updates a successful run over `steps` produces.
///
/// One initial publish, one per step start and completion, two per substep,
/// and the final inactive publish.
pub fn publications_for(steps: &[Step]) -> usize {
    2 + steps
        .iter()
        .map(|s| 2 + 2 * s.substeps.len())
        .sum::<usize>()
}
