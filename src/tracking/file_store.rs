//! Local file-based tracking backend
//!
//! Stores runs as a directory tree:
//!
//! ```text
//! <root>/<experiment>/<run_id>/meta.json
//! <root>/<experiment>/<run_id>/params.json
//! <root>/<experiment>/<run_id>/metrics.json
//! <root>/<experiment>/<run_id>/artifacts/model/model.json
//! <root>/registry.json
//! ```
//!
//! `registry.json` is the registered-model index shared by all runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::LinearModel;

use super::{MetricEntry, RunInfo, RunStatus, TrackingError, TrackingResult, TrackingStore};

const META_FILE: &str = "meta.json";
const PARAMS_FILE: &str = "params.json";
const METRICS_FILE: &str = "metrics.json";
const REGISTRY_FILE: &str = "registry.json";

pub struct FileStore {
    root: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryIndex {
    models: BTreeMap<String, Vec<RegisteredVersion>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegisteredVersion {
    version: u32,
    run_id: String,
    registered_at: DateTime<Utc>,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        FileStore { root }
    }

    /// The directory that holds the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run_dir(&self, run: &RunInfo) -> PathBuf {
        self.root.join(&run.experiment).join(&run.run_id)
    }

    fn generate_run_id() -> String {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> TrackingResult<()> {
        let body = serde_json::to_string_pretty(value)
            .map_err(|e| TrackingError::Serialization(e.to_string()))?;
        fs::write(path, body).map_err(|e| {
            TrackingError::Storage(format!("failed to write '{}': {}", path.display(), e))
        })
    }

    fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> TrackingResult<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        let body = fs::read_to_string(path).map_err(|e| {
            TrackingError::Storage(format!("failed to read '{}': {}", path.display(), e))
        })?;
        serde_json::from_str(&body).map_err(|e| TrackingError::Serialization(e.to_string()))
    }
}

impl TrackingStore for FileStore {
    fn create_run(&self, experiment: &str) -> TrackingResult<RunInfo> {
        let info = RunInfo {
            run_id: Self::generate_run_id(),
            experiment: experiment.to_string(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
        };

        let dir = self.run_dir(&info);
        fs::create_dir_all(dir.join("artifacts")).map_err(|e| {
            TrackingError::Storage(format!("failed to create '{}': {}", dir.display(), e))
        })?;

        Self::write_json(&dir.join(META_FILE), &info)?;
        Self::write_json(&dir.join(PARAMS_FILE), &BTreeMap::<String, String>::new())?;
        Self::write_json(
            &dir.join(METRICS_FILE),
            &BTreeMap::<String, Vec<MetricEntry>>::new(),
        )?;

        Ok(info)
    }

    fn log_param(&self, run: &RunInfo, name: &str, value: &str) -> TrackingResult<()> {
        let path = self.run_dir(run).join(PARAMS_FILE);
        let mut params: BTreeMap<String, String> = Self::read_json_or_default(&path)?;
        params.insert(name.to_string(), value.to_string());
        Self::write_json(&path, &params)
    }

    fn log_metric(
        &self,
        run: &RunInfo,
        name: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> TrackingResult<()> {
        let path = self.run_dir(run).join(METRICS_FILE);
        let mut metrics: BTreeMap<String, Vec<MetricEntry>> =
            Self::read_json_or_default(&path)?;
        metrics
            .entry(name.to_string())
            .or_default()
            .push(MetricEntry { timestamp, value });
        Self::write_json(&path, &metrics)
    }

    fn log_model(&self, run: &RunInfo, model: &LinearModel) -> TrackingResult<()> {
        let dir = self.run_dir(run).join("artifacts").join("model");
        fs::create_dir_all(&dir).map_err(|e| {
            TrackingError::Storage(format!("failed to create '{}': {}", dir.display(), e))
        })?;
        Self::write_json(&dir.join("model.json"), model)
    }

    fn register_model(
        &self,
        run: &RunInfo,
        model: &LinearModel,
        name: &str,
    ) -> TrackingResult<()> {
        self.log_model(run, model)?;

        let path = self.root.join(REGISTRY_FILE);
        let mut registry: RegistryIndex = Self::read_json_or_default(&path)?;
        let versions = registry.models.entry(name.to_string()).or_default();
        versions.push(RegisteredVersion {
            version: versions.len() as u32 + 1,
            run_id: run.run_id.clone(),
            registered_at: Utc::now(),
        });
        Self::write_json(&path, &registry)
    }

    fn update_run(&self, run: &RunInfo) -> TrackingResult<()> {
        Self::write_json(&self.run_dir(run).join(META_FILE), run)
    }
}
