//! Model server client implementation

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use common::error::{Error, Result};

/// Issues prediction requests against a served model
///
/// The seam between the canary comparator and the serving runtime; tests
/// substitute an in-memory implementation.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    /// Predicts for a batch of feature vectors
    ///
    /// With `version` set, the request is pinned to that served version;
    /// otherwise the server picks its current (highest) version.
    async fn predict(
        &self,
        version: Option<u32>,
        instances: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>>;
}

/// Prediction response body
#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f64>>,
}

/// HTTP client for the model serving collaborator
pub struct ModelServerClient {
    /// Underlying HTTP client with the request timeout applied
    http: reqwest::Client,

    /// Base URL of the server, e.g. `http://localhost:8501`
    base_url: String,

    /// Name the model is served under
    model_name: String,
}

impl ModelServerClient {
    /// Creates a new client with a bounded request timeout
    pub fn new(base_url: &str, model_name: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ExternalService(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
        })
    }

    /// Prediction endpoint URL, optionally pinned to a version
    fn predict_url(&self, version: Option<u32>) -> String {
        match version {
            Some(v) => format!(
                "{}/v1/models/{}/versions/{}:predict",
                self.base_url, self.model_name, v
            ),
            None => format!("{}/v1/models/{}:predict", self.base_url, self.model_name),
        }
    }

    /// Model status endpoint URL
    fn status_url(&self) -> String {
        format!("{}/v1/models/{}", self.base_url, self.model_name)
    }

    /// Fetches the server's status report for the model
    ///
    /// Returns the raw status document; its shape belongs to the serving
    /// collaborator, not to this client.
    pub async fn model_status(&self) -> Result<serde_json::Value> {
        let url = self.status_url();
        debug!("Fetching model status from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ExternalService(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        let body = response
            .json()
            .await
            .map_err(|e| Error::ExternalService(format!("Malformed status body: {}", e)))?;

        Ok(body)
    }
}

#[async_trait]
impl PredictionBackend for ModelServerClient {
    async fn predict(
        &self,
        version: Option<u32>,
        instances: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>> {
        let url = self.predict_url(version);
        debug!("Requesting {} predictions from {}", instances.len(), url);

        let response = self
            .http
            .post(&url)
            .json(&json!({ "instances": instances }))
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "POST {} returned {}: {}",
                url,
                status,
                body.trim()
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalService(format!("Malformed prediction body: {}", e)))?;

        Ok(parsed.predictions)
    }
}
