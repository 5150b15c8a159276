//! Experiment persistence
//!
//! [`JsonFileStore`] keeps every experiment in one pretty-printed JSON file
//! that is rewritten on each change. [`MemoryStore`] is the in-process
//! equivalent used by tests and `--no-save` runs.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{Experiment, NewExperiment};

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Experiment {0} not found")]
    NotFound(u64),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Insert / select / delete over experiments
pub trait ExperimentStore: Send {
    /// Store a new experiment and return it with its assigned id
    fn insert(&mut self, experiment: NewExperiment) -> StoreResult<Experiment>;

    /// All experiments, newest first
    fn list(&self) -> StoreResult<Vec<Experiment>>;

    fn get(&self, id: u64) -> StoreResult<Experiment>;

    /// Remove an experiment, returning it
    fn delete(&mut self, id: u64) -> StoreResult<Experiment>;

    fn count(&self) -> StoreResult<usize> {
        Ok(self.list()?.len())
    }
}

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: u64,
    experiments: Vec<Experiment>,
}

impl StoreFile {
    fn insert(&mut self, experiment: NewExperiment) -> Experiment {
        self.next_id = self.next_id.max(self.max_id()) + 1;
        let experiment = experiment.into_experiment(self.next_id, Utc::now());
        self.experiments.push(experiment.clone());
        experiment
    }

    fn max_id(&self) -> u64 {
        self.experiments.iter().map(|e| e.id).max().unwrap_or(0)
    }

    fn newest_first(&self) -> Vec<Experiment> {
        let mut all = self.experiments.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        all
    }

    fn get(&self, id: u64) -> StoreResult<Experiment> {
        self.experiments
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn remove(&mut self, id: u64) -> StoreResult<Experiment> {
        let index = self
            .experiments
            .iter()
            .position(|e| e.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(self.experiments.remove(index))
    }
}

/// Experiments kept in a single JSON file
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open a store at `path`; the file is created on first write
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StoreResult<StoreFile> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write through a sibling temp file, then rename over the store
    fn write(&self, data: &StoreFile) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, data)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            "Persisted {} experiments to {}",
            data.experiments.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl ExperimentStore for JsonFileStore {
    fn insert(&mut self, experiment: NewExperiment) -> StoreResult<Experiment> {
        let mut data = self.read()?;
        let experiment = data.insert(experiment);
        self.write(&data)?;
        Ok(experiment)
    }

    fn list(&self) -> StoreResult<Vec<Experiment>> {
        Ok(self.read()?.newest_first())
    }

    fn get(&self, id: u64) -> StoreResult<Experiment> {
        self.read()?.get(id)
    }

    fn delete(&mut self, id: u64) -> StoreResult<Experiment> {
        let mut data = self.read()?;
        let removed = data.remove(id)?;
        self.write(&data)?;
        Ok(removed)
    }
}

/// Experiments held in memory only
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: StoreFile,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExperimentStore for MemoryStore {
    fn insert(&mut self, experiment: NewExperiment) -> StoreResult<Experiment> {
        Ok(self.data.insert(experiment))
    }

    fn list(&self) -> StoreResult<Vec<Experiment>> {
        Ok(self.data.newest_first())
    }

    fn get(&self, id: u64) -> StoreResult<Experiment> {
        self.data.get(id)
    }

    fn delete(&mut self, id: u64) -> StoreResult<Experiment> {
        self.data.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiments::ResponseRecord;
    use promptscope::ScoreRecord;

    fn response(name: &str, scores: Option<ScoreRecord>) -> ResponseRecord {
        ResponseRecord {
            llm_name: name.to_string(),
            model: None,
            response_text: "text".to_string(),
            response_time_ms: 250,
            error: None,
            metrics: scores,
        }
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("experiments.json");
        let mut store = JsonFileStore::open(&path);

        let scores = ScoreRecord {
            accuracy_score: Some(0.123456789),
            relevancy_score: Some(0.5),
            coherence_score: Some(2.0 / 3.0),
            completeness_score: None,
        };
        let created = store
            .insert(
                NewExperiment::new("Explain ownership")
                    .with_description("rust basics")
                    .with_responses(vec![response("gemini", Some(scores))]),
            )
            .unwrap();
        assert_eq!(created.id, 1);
        assert!(path.exists());

        // a fresh handle reads what the first one wrote
        let reopened = JsonFileStore::open(&path);
        let loaded = reopened.get(1).unwrap();
        assert_eq!(loaded, created);

        let stored = loaded.responses[0].metrics.unwrap();
        for (metric, value) in scores.iter() {
            match (value, stored.get(metric)) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-3, "{} drifted", metric),
                (None, None) => {}
                other => panic!("{} changed presence: {:?}", metric, other),
            }
        }
    }

    #[test]
    fn test_scores_reload_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiments.json");
        let mut store = JsonFileStore::open(&path);

        // the fast float parser moves these by one ulp
        let scores = ScoreRecord {
            accuracy_score: Some(0.1 + 0.2),
            relevancy_score: Some(0.47000000000000003),
            coherence_score: Some(0.46499999999999997),
            completeness_score: Some(0.0),
        };
        store
            .insert(NewExperiment::new("p").with_responses(vec![response("groq", Some(scores))]))
            .unwrap();

        let reloaded = JsonFileStore::open(&path).get(1).unwrap();
        assert_eq!(reloaded.responses[0].metrics, Some(scores));
    }

    #[test]
    fn test_list_is_newest_first() {
        let mut store = MemoryStore::new();
        for prompt in ["first", "second", "third"] {
            store.insert(NewExperiment::new(prompt)).unwrap();
        }

        let prompts: Vec<String> = store.list().unwrap().into_iter().map(|e| e.prompt).collect();
        assert_eq!(prompts, vec!["third", "second", "first"]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::open(dir.path().join("experiments.json"));
        store.insert(NewExperiment::new("a")).unwrap();
        store.insert(NewExperiment::new("b")).unwrap();

        let removed = store.delete(1).unwrap();
        assert_eq!(removed.prompt, "a");
        assert!(matches!(store.get(1), Err(StoreError::NotFound(1))));
        assert!(matches!(store.delete(1), Err(StoreError::NotFound(1))));

        // ids are not reused after a delete
        let next = store.insert(NewExperiment::new("c")).unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("none.json"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(matches!(store.list(), Err(StoreError::Json(_))));
    }
}
