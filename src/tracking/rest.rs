//! Remote REST tracking backend
//!
//! Speaks a small JSON protocol against the tracking service:
//!
//! - `POST api/2.0/runs/create` — `{experiment}` → `{run_id}`
//! - `POST api/2.0/runs/log-parameter` — `{run_id, name, value}`
//! - `POST api/2.0/runs/log-metric` — `{run_id, name, value, timestamp}`
//! - `POST api/2.0/runs/log-model` — `{run_id, model}`
//! - `POST api/2.0/model-versions/create` — `{run_id, name, model}`
//! - `POST api/2.0/runs/update` — `{run_id, status, ended_at}`
//!
//! All requests carry basic-auth credentials. A 4xx response maps to
//! [`TrackingError::Rejected`]; connection failures, timeouts and 5xx
//! responses map to [`TrackingError::Transport`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::json;
use url::Url;

use crate::config::TrackingCredentials;
use crate::model::LinearModel;

use super::{RunInfo, RunStatus, TrackingError, TrackingResult, TrackingStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RestStore {
    http: Client,
    base: Url,
    credentials: TrackingCredentials,
}

impl RestStore {
    pub fn new(base: Url, credentials: TrackingCredentials) -> TrackingResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TrackingError::Transport(e.to_string()))?;
        Ok(RestStore {
            http,
            base,
            credentials,
        })
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> TrackingResult<serde_json::Value> {
        let url = self
            .base
            .join(path)
            .map_err(|e| TrackingError::InvalidUri(e.to_string()))?;

        let response = self
            .http
            .post(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .json(body)
            .send()
            .map_err(|e| TrackingError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| TrackingError::Transport(e.to_string()))?;

        if let Some(err) = reply_error(status, &text) {
            return Err(err);
        }

        if text.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TrackingError::Serialization(e.to_string()))
    }
}

/// Maps a non-success response to the matching error kind
fn reply_error(status: StatusCode, body: &str) -> Option<TrackingError> {
    if status.is_client_error() {
        return Some(TrackingError::Rejected {
            status: status.as_u16(),
            message: body.trim().to_string(),
        });
    }
    if !status.is_success() {
        return Some(TrackingError::Transport(format!(
            "server returned {}",
            status
        )));
    }
    None
}

impl TrackingStore for RestStore {
    fn create_run(&self, experiment: &str) -> TrackingResult<RunInfo> {
        let started_at = Utc::now();
        let reply = self.post(
            "api/2.0/runs/create",
            &json!({ "experiment": experiment, "started_at": started_at }),
        )?;

        let run_id = reply
            .get("run_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                TrackingError::Serialization("reply to runs/create has no run_id".to_string())
            })?
            .to_string();

        Ok(RunInfo {
            run_id,
            experiment: experiment.to_string(),
            status: RunStatus::Running,
            started_at,
            ended_at: None,
        })
    }

    fn log_param(&self, run: &RunInfo, name: &str, value: &str) -> TrackingResult<()> {
        self.post(
            "api/2.0/runs/log-parameter",
            &json!({ "run_id": run.run_id, "name": name, "value": value }),
        )?;
        Ok(())
    }

    fn log_metric(
        &self,
        run: &RunInfo,
        name: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> TrackingResult<()> {
        self.post(
            "api/2.0/runs/log-metric",
            &json!({
                "run_id": run.run_id,
                "name": name,
                "value": value,
                "timestamp": timestamp,
            }),
        )?;
        Ok(())
    }

    fn log_model(&self, run: &RunInfo, model: &LinearModel) -> TrackingResult<()> {
        self.post(
            "api/2.0/runs/log-model",
            &json!({ "run_id": run.run_id, "model": model }),
        )?;
        Ok(())
    }

    fn register_model(
        &self,
        run: &RunInfo,
        model: &LinearModel,
        name: &str,
    ) -> TrackingResult<()> {
        self.post(
            "api/2.0/model-versions/create",
            &json!({ "run_id": run.run_id, "name": name, "model": model }),
        )?;
        Ok(())
    }

    fn update_run(&self, run: &RunInfo) -> TrackingResult<()> {
        self.post(
            "api/2.0/runs/update",
            &json!({
                "run_id": run.run_id,
                "status": run.status,
                "ended_at": run.ended_at,
            }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_error_mapping() {
        // 4xx is a rejection the evaluation stage may swallow
        let err = reply_error(StatusCode::FORBIDDEN, "no access").unwrap();
        assert!(matches!(
            err,
            TrackingError::Rejected { status: 403, .. }
        ));

        // 5xx is a transport-class failure and stays fatal
        let err = reply_error(StatusCode::INTERNAL_SERVER_ERROR, "").unwrap();
        assert!(matches!(err, TrackingError::Transport(_)));

        assert!(reply_error(StatusCode::OK, "{}").is_none());
    }
}
