//! Generation brief, request and run record.
//!
//! The brief is what the user fills in. It is validated and turned into a
//! [`GenerationRequest`] before the driver is ever invoked; the driver
//! trusts whatever request it receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::RequestDefaults;
use crate::steps::StepStatus;
use crate::store::Run;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BriefError {
    #[error("company name is required")]
    MissingCompanyName,
    #[error("at least one primary keyword is required")]
    MissingPrimaryKeyword,
}

/// Length of the content plan to generate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanDuration {
    #[serde(rename = "1_week")]
    OneWeek,
    #[serde(rename = "2_weeks")]
    TwoWeeks,
    #[default]
    #[serde(rename = "1_month")]
    OneMonth,
    #[serde(rename = "3_months")]
    ThreeMonths,
}

impl PlanDuration {
    pub fn label(self) -> &'static str {
        match self {
            PlanDuration::OneWeek => "1 week",
            PlanDuration::TwoWeeks => "2 weeks",
            PlanDuration::OneMonth => "1 month",
            PlanDuration::ThreeMonths => "3 months",
        }
    }
}

/// Everything the user tells us about the business
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationBrief {
    pub company_name: String,
    pub industry: String,
    pub target_audience: String,
    pub business_description: String,
    pub website: String,
    pub primary_keywords: Vec<String>,
    pub secondary_keywords: Vec<String>,
    pub competitor_websites: Vec<String>,
    pub content_goals: String,
    pub brand_voice: String,
    pub contact_email: String,
    pub additional_notes: String,
    /// Names of attached files
    pub attachments: Vec<String>,
}

/// Push `value` trimmed, unless it is blank or already present
fn add_unique(list: &mut Vec<String>, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    true
}

impl GenerationBrief {
    pub fn add_primary_keyword(&mut self, keyword: &str) -> bool {
        add_unique(&mut self.primary_keywords, keyword)
    }

    pub fn add_secondary_keyword(&mut self, keyword: &str) -> bool {
        add_unique(&mut self.secondary_keywords, keyword)
    }

    pub fn add_competitor(&mut self, website: &str) -> bool {
        add_unique(&mut self.competitor_websites, website)
    }

    pub fn remove_primary_keyword(&mut self, keyword: &str) {
        self.primary_keywords.retain(|k| k != keyword);
    }

    pub fn remove_secondary_keyword(&mut self, keyword: &str) {
        self.secondary_keywords.retain(|k| k != keyword);
    }

    pub fn remove_competitor(&mut self, website: &str) {
        self.competitor_websites.retain(|w| w != website);
    }

    pub fn validate(&self) -> Result<(), BriefError> {
        if self.company_name.trim().is_empty() {
            return Err(BriefError::MissingCompanyName);
        }
        if self.primary_keywords.is_empty() {
            return Err(BriefError::MissingPrimaryKeyword);
        }
        Ok(())
    }

    /// Free-text prompt summarizing the brief for the generator
    pub fn additional_prompts(&self) -> String {
        format!(
            "Company: {}. Industry: {}. Target: {}. Description: {}. Goals: {}. Additional: {}",
            self.company_name.trim(),
            self.industry,
            self.target_audience,
            self.business_description,
            self.content_goals,
            self.additional_notes,
        )
    }

    /// Validate and build the request the driver runs with
    pub fn to_request(&self, defaults: &RequestDefaults) -> Result<GenerationRequest, BriefError> {
        self.validate()?;

        let tone = if self.brand_voice.trim().is_empty() {
            defaults.tone.clone()
        } else {
            self.brand_voice.trim().to_string()
        };

        Ok(GenerationRequest {
            id: Uuid::new_v4().simple().to_string()[..9].to_string(),
            company: self.company_name.trim().to_string(),
            brand_id: defaults.brand_id.clone(),
            platforms: defaults.platforms.clone(),
            duration: defaults.duration,
            content_types: defaults.content_types.clone(),
            tone,
            topics: self.primary_keywords.clone(),
            additional_prompts: self.additional_prompts(),
            attachments: self.attachments.clone(),
            created_at: Utc::now(),
        })
    }
}

/// Parameters of one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub id: String,
    pub company: String,
    pub brand_id: String,
    pub platforms: Vec<String>,
    pub duration: PlanDuration,
    pub content_types: Vec<String>,
    pub tone: String,
    pub topics: Vec<String>,
    pub additional_prompts: String,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RecordStatus {
    pub fn label(self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Processing => "processing",
            RecordStatus::Completed => "completed",
            RecordStatus::Failed => "failed",
        }
    }
}

/// Outcome of a run, kept in the history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub run_id: Uuid,
    pub request_id: String,
    pub company: String,
    pub topics: Vec<String>,
    pub duration: PlanDuration,
    pub status: RecordStatus,
    /// Finished units, 0..=100
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationRecord {
    /// Summarize `run` as the outcome of `request`
    pub fn from_run(request: &GenerationRequest, run: &Run, error: Option<String>) -> Self {
        let status = if error.is_none() && run.all_completed() {
            RecordStatus::Completed
        } else {
            RecordStatus::Failed
        };

        let failed_unit = run.steps.iter().find_map(|step| {
            step.substeps
                .iter()
                .find(|s| s.status == StepStatus::Error)
                .map(|s| format!("{}/{}", step.id, s.id))
                .or_else(|| {
                    (step.status == StepStatus::Error).then(|| step.id.clone())
                })
        });

        Self {
            run_id: run.id,
            request_id: request.id.clone(),
            company: request.company.clone(),
            topics: request.topics.clone(),
            duration: request.duration,
            status,
            progress: run.progress(),
            created_at: request.created_at,
            finished_at: Utc::now(),
            failed_unit,
            error,
        }
    }

    pub fn elapsed_secs(&self) -> i64 {
        self.finished_at
            .signed_duration_since(self.created_at)
            .num_seconds()
    }
}
