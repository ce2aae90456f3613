//! Experiment tracking client
//!
//! This module records parameters, metrics and model artifacts for a single
//! evaluation run against an external tracking collaborator. The backend is
//! selected from the scheme of the configured tracking URI:
//!
//! - no scheme, or `file://` — a local file store rooted at the given path
//! - `http://` / `https://` — a remote registry, authenticated with
//!   credentials taken from the process environment
//!
//! A run is a scoped resource: it is opened with
//! [`TrackingClient::start_run`] and closed on every exit path — explicitly
//! as `FINISHED` through [`RunSession::finish`], or as `FAILED` by the drop
//! guard when the caller bails out early.

pub mod file_store;
pub mod rest;

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{TrackingCredentials, TRACKING_USERNAME_VAR};
use crate::model::LinearModel;

use file_store::FileStore;
use rest::RestStore;

/// Errors reported by the tracking backends.
///
/// The variants form an explicit, structurally-matched taxonomy: callers
/// decide what is fatal by matching on the kind, never by downcasting a
/// library error type. Only [`TrackingError::Rejected`] is treated as
/// recoverable by the evaluation stage.
#[derive(Debug)]
pub enum TrackingError {
    /// The configured tracking URI could not be understood
    InvalidUri(String),
    /// A required credential variable is absent from the environment
    MissingCredentials(&'static str),
    /// The backend understood the request and rejected it
    Rejected { status: u16, message: String },
    /// The backend could not be reached
    Transport(String),
    /// Local file-store IO failure
    Storage(String),
    /// Payload could not be encoded or decoded
    Serialization(String),
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingError::InvalidUri(msg) => {
                write!(f, "Invalid tracking URI: {}", msg)
            }
            TrackingError::MissingCredentials(var) => {
                write!(f, "Missing tracking credential: {} is not set", var)
            }
            TrackingError::Rejected { status, message } => {
                write!(f, "Tracking backend rejected request ({}): {}", status, message)
            }
            TrackingError::Transport(msg) => {
                write!(f, "Tracking transport error: {}", msg)
            }
            TrackingError::Storage(msg) => {
                write!(f, "Tracking storage error: {}", msg)
            }
            TrackingError::Serialization(msg) => {
                write!(f, "Tracking serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for TrackingError {}

pub type TrackingResult<T> = std::result::Result<T, TrackingError>;

/// Final status of a tracked run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Metadata stored for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub experiment: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// One recorded value of a metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricEntry {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Backend interface shared by the file store and the remote registry
pub(crate) trait TrackingStore {
    fn create_run(&self, experiment: &str) -> TrackingResult<RunInfo>;
    fn log_param(&self, run: &RunInfo, name: &str, value: &str) -> TrackingResult<()>;
    fn log_metric(
        &self,
        run: &RunInfo,
        name: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> TrackingResult<()>;
    fn log_model(&self, run: &RunInfo, model: &LinearModel) -> TrackingResult<()>;
    fn register_model(
        &self,
        run: &RunInfo,
        model: &LinearModel,
        name: &str,
    ) -> TrackingResult<()>;
    fn update_run(&self, run: &RunInfo) -> TrackingResult<()>;
}

enum Backend {
    File(FileStore),
    Rest(RestStore),
}

enum UriKind {
    LocalPath(PathBuf),
    Remote(Url),
}

fn classify_uri(uri: &str) -> TrackingResult<UriKind> {
    match Url::parse(uri) {
        Ok(url) => match url.scheme() {
            "file" => {
                let path = url.to_file_path().map_err(|_| {
                    TrackingError::InvalidUri(format!("'{}' is not a usable file path", uri))
                })?;
                Ok(UriKind::LocalPath(path))
            }
            "http" | "https" => Ok(UriKind::Remote(url)),
            other => Err(TrackingError::InvalidUri(format!(
                "unsupported scheme '{}'",
                other
            ))),
        },
        // Bare paths are taken as a local file-store root
        Err(_) => Ok(UriKind::LocalPath(PathBuf::from(uri))),
    }
}

/// Client for the experiment-tracking collaborator
pub struct TrackingClient {
    backend: Backend,
}

impl TrackingClient {
    /// Returns true when the URI designates a remote registry.
    ///
    /// Used by callers to decide whether credentials must be gathered
    /// before connecting.
    pub fn is_remote_uri(uri: &str) -> TrackingResult<bool> {
        Ok(matches!(classify_uri(uri)?, UriKind::Remote(_)))
    }

    /// Connects a client for the given URI.
    ///
    /// Remote backends require credentials; passing `None` for an
    /// `http`/`https` URI fails here, before any network call is attempted.
    /// File stores need no credentials and ignore them.
    pub fn connect(
        uri: &str,
        credentials: Option<TrackingCredentials>,
    ) -> TrackingResult<Self> {
        let backend = match classify_uri(uri)? {
            UriKind::LocalPath(root) => Backend::File(FileStore::new(root)),
            UriKind::Remote(url) => {
                let creds = credentials
                    .ok_or(TrackingError::MissingCredentials(TRACKING_USERNAME_VAR))?;
                Backend::Rest(RestStore::new(url, creds)?)
            }
        };
        Ok(TrackingClient { backend })
    }

    /// Returns true when the connected backend is a remote registry
    pub fn is_remote(&self) -> bool {
        matches!(self.backend, Backend::Rest(_))
    }

    /// Opens a run scope under the given experiment
    pub fn start_run(&self, experiment: &str) -> TrackingResult<RunSession<'_>> {
        let info = self.store().create_run(experiment)?;
        log::info!(
            "tracking run {} started under experiment '{}'",
            info.run_id,
            experiment
        );
        Ok(RunSession {
            client: self,
            info,
            closed: false,
        })
    }

    fn store(&self) -> &dyn TrackingStore {
        match &self.backend {
            Backend::File(store) => store,
            Backend::Rest(store) => store,
        }
    }
}

/// A scoped tracking run.
///
/// Dropping the session without calling [`RunSession::finish`] closes the
/// run as `FAILED`, so the backend never ends up with a dangling
/// `RUNNING` record.
pub struct RunSession<'a> {
    client: &'a TrackingClient,
    info: RunInfo,
    closed: bool,
}

impl RunSession<'_> {
    /// The backend-assigned run identifier
    pub fn run_id(&self) -> &str {
        &self.info.run_id
    }

    /// Records one named parameter
    pub fn log_param(&mut self, name: &str, value: &str) -> TrackingResult<()> {
        self.client.store().log_param(&self.info, name, value)
    }

    /// Records one named metric value
    pub fn log_metric(&mut self, name: &str, value: f64) -> TrackingResult<()> {
        self.client
            .store()
            .log_metric(&self.info, name, value, Utc::now())
    }

    /// Stores the model artifact under the run, unregistered
    pub fn log_model(&mut self, model: &LinearModel) -> TrackingResult<()> {
        self.client.store().log_model(&self.info, model)
    }

    /// Stores the model artifact and registers it in the model registry
    pub fn register_model(
        &mut self,
        model: &LinearModel,
        name: &str,
    ) -> TrackingResult<()> {
        self.client.store().register_model(&self.info, model, name)
    }

    /// Closes the run as `FINISHED`
    pub fn finish(mut self) -> TrackingResult<()> {
        self.close(RunStatus::Finished)
    }

    fn close(&mut self, status: RunStatus) -> TrackingResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.info.status = status;
        self.info.ended_at = Some(Utc::now());
        self.client.store().update_run(&self.info)
    }
}

impl Drop for RunSession<'_> {
    fn drop(&mut self) {
        if !self.closed {
            // Abort path: the caller bailed out before finish()
            if let Err(e) = self.close(RunStatus::Failed) {
                log::warn!("failed to close tracking run {}: {}", self.info.run_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_uri() {
        assert!(matches!(
            classify_uri("mlruns").unwrap(),
            UriKind::LocalPath(_)
        ));
        assert!(matches!(
            classify_uri("file:///tmp/mlruns").unwrap(),
            UriKind::LocalPath(_)
        ));
        assert!(matches!(
            classify_uri("https://tracker.example.com").unwrap(),
            UriKind::Remote(_)
        ));
        assert!(matches!(
            classify_uri("ftp://tracker.example.com"),
            Err(TrackingError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_remote_connect_requires_credentials() {
        assert!(matches!(
            TrackingClient::connect("https://tracker.example.com", None),
            Err(TrackingError::MissingCredentials(_))
        ));
    }
}
