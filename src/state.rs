use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::generation::GenerationRecord;

/// Records kept in `state.json`
const HISTORY_LIMIT: usize = 100;

/// Persistent history of finished runs, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub history: Vec<GenerationRecord>,

    #[serde(skip)]
    state_path: PathBuf,
}

impl State {
    pub fn load(config: &Config) -> Result<Self> {
        let state_path = config.state_path();
        fs::create_dir_all(&state_path).context("Failed to create state directory")?;

        let state_file = state_path.join("state.json");

        if state_file.exists() {
            let contents = fs::read_to_string(&state_file).context("Failed to read state file")?;
            let mut state: State =
                serde_json::from_str(&contents).context("Failed to parse state file")?;
            state.state_path = state_path;
            Ok(state)
        } else {
            Ok(Self {
                history: Vec::new(),
                state_path,
            })
        }
    }

    pub fn save(&self) -> Result<()> {
        let state_file = self.state_path.join("state.json");
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&state_file, contents)
            .with_context(|| format!("Failed to write {}", state_file.display()))?;
        Ok(())
    }

    /// Append a finished run and persist
    pub fn record(&mut self, record: GenerationRecord) -> Result<()> {
        self.history.push(record);
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
        self.save()
    }

    /// Up to `limit` records, newest first
    pub fn recent(&self, limit: usize) -> Vec<&GenerationRecord> {
        self.history.iter().rev().take(limit).collect()
    }

    pub fn last(&self) -> Option<&GenerationRecord> {
        self.history.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestDefaults;
    use crate::generation::{GenerationBrief, RecordStatus};
    use crate::steps::content_plan_pipeline;
    use crate::store::Run;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn test_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.state = temp_dir.path().to_string_lossy().to_string();
        config
    }

    fn record(company: &str) -> GenerationRecord {
        let mut brief = GenerationBrief {
            company_name: company.into(),
            ..Default::default()
        };
        brief.add_primary_keyword("espresso");
        let request = brief.to_request(&RequestDefaults::default()).unwrap();
        let run = Run {
            id: Uuid::new_v4(),
            steps: content_plan_pipeline(),
            active: false,
        };
        GenerationRecord::from_run(&request, &run, Some("cancelled".into()))
    }

    #[test]
    fn test_load_without_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let state = State::load(&test_config(&temp_dir)).unwrap();
        assert!(state.history.is_empty());
        assert!(state.last().is_none());
    }

    #[test]
    fn test_record_persists_across_loads() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut state = State::load(&config).unwrap();
        state.record(record("Acme")).unwrap();
        assert!(temp_dir.path().join("state.json").exists());

        let reloaded = State::load(&config).unwrap();
        assert_eq!(reloaded.history.len(), 1);
        let last = reloaded.last().unwrap();
        assert_eq!(last.company, "Acme");
        assert_eq!(last.status, RecordStatus::Failed);
    }

    #[test]
    fn test_history_keeps_most_recent_hundred() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = State::load(&test_config(&temp_dir)).unwrap();

        for i in 0..105 {
            state.record(record(&format!("Company {i}"))).unwrap();
        }

        assert_eq!(state.history.len(), 100);
        assert_eq!(state.history[0].company, "Company 5");
        assert_eq!(state.last().unwrap().company, "Company 104");
    }

    #[test]
    fn test_recent_is_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = State::load(&test_config(&temp_dir)).unwrap();
        for name in ["A", "B", "C"] {
            state.record(record(name)).unwrap();
        }

        let recent: Vec<_> = state.recent(2).iter().map(|r| r.company.as_str()).collect();
        assert_eq!(recent, vec!["C", "B"]);
        assert_eq!(state.recent(10).len(), 3);
    }
}
