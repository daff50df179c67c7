//! Canary comparator implementation

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use common::error::{CanarySide, Error, Result};
use serving_client::PredictionBackend;

/// Result of comparing two served versions on the same input batch
#[derive(Debug, Clone, Serialize)]
pub struct CanaryReport {
    /// First version compared
    pub version_a: u32,

    /// Second version compared
    pub version_b: u32,

    /// Raw predictions from version A
    pub predictions_a: Vec<Vec<f64>>,

    /// Raw predictions from version B
    pub predictions_b: Vec<Vec<f64>>,

    /// Mean absolute elementwise difference over the flattened outputs
    pub avg_abs_diff: f64,
}

/// Compares predictions of two already-served model versions
pub struct CanaryComparator {
    /// Prediction endpoint both sides are queried through
    backend: Arc<dyn PredictionBackend>,
}

impl CanaryComparator {
    /// Creates a new comparator over a prediction backend
    pub fn new(backend: Arc<dyn PredictionBackend>) -> Self {
        Self { backend }
    }

    /// Compares two versions on the same input batch
    ///
    /// Both requests use identical input encoding. Fails with
    /// `CanaryUnavailable` naming the side whose call failed or returned an
    /// empty prediction set, and with `ShapeMismatch` when the two outputs
    /// flatten to different lengths; no average is computed in either case.
    pub async fn compare(
        &self,
        version_a: u32,
        version_b: u32,
        inputs: &[Vec<f64>],
    ) -> Result<CanaryReport> {
        if inputs.is_empty() {
            return Err(Error::Config(
                "canary input batch must not be empty".to_string(),
            ));
        }

        debug!(
            "Comparing versions {} and {} on {} inputs",
            version_a,
            version_b,
            inputs.len()
        );

        let predictions_a = self
            .fetch_side(CanarySide::VersionA, version_a, inputs)
            .await?;
        let predictions_b = self
            .fetch_side(CanarySide::VersionB, version_b, inputs)
            .await?;

        let flat_a = flatten(&predictions_a);
        let flat_b = flatten(&predictions_b);

        if flat_a.len() != flat_b.len() {
            return Err(Error::ShapeMismatch {
                left: flat_a.len(),
                right: flat_b.len(),
            });
        }

        let avg_abs_diff = flat_a
            .iter()
            .zip(flat_b.iter())
            .map(|(a, b)| (a - b).abs())
            .sum::<f64>()
            / flat_a.len() as f64;

        info!(
            "Canary drift between versions {} and {}: avg_abs_diff = {:.6}",
            version_a, version_b, avg_abs_diff
        );

        Ok(CanaryReport {
            version_a,
            version_b,
            predictions_a,
            predictions_b,
            avg_abs_diff,
        })
    }

    /// Queries one side and validates the prediction set
    async fn fetch_side(
        &self,
        side: CanarySide,
        version: u32,
        inputs: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>> {
        let predictions = self
            .backend
            .predict(Some(version), inputs)
            .await
            .map_err(|e| Error::CanaryUnavailable {
                side,
                reason: format!("version {}: {}", version, e),
            })?;

        if predictions.iter().map(|row| row.len()).sum::<usize>() == 0 {
            return Err(Error::CanaryUnavailable {
                side,
                reason: format!("version {} returned an empty prediction set", version),
            });
        }

        Ok(predictions)
    }
}

/// Flattens nested prediction rows to one numeric sequence
fn flatten(predictions: &[Vec<f64>]) -> Vec<f64> {
    predictions.iter().flatten().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned predictions per version; unknown versions fail
    struct StubBackend {
        served: HashMap<u32, Vec<Vec<f64>>>,
    }

    impl StubBackend {
        fn new(served: Vec<(u32, Vec<Vec<f64>>)>) -> Arc<Self> {
            Arc::new(Self {
                served: served.into_iter().collect(),
            })
        }
    }

    #[async_trait]
    impl PredictionBackend for StubBackend {
        async fn predict(
            &self,
            version: Option<u32>,
            _instances: &[Vec<f64>],
        ) -> Result<Vec<Vec<f64>>> {
            let version = version.expect("canary always pins a version");
            match self.served.get(&version) {
                Some(predictions) => Ok(predictions.clone()),
                None => Err(Error::ExternalService(format!(
                    "version {} is not served",
                    version
                ))),
            }
        }
    }

    fn batch() -> Vec<Vec<f64>> {
        vec![vec![0.1, -0.2], vec![1.0, 1.0], vec![-1.5, 0.3]]
    }

    #[tokio::test]
    async fn test_drift_matches_hand_computed_average() {
        let backend = StubBackend::new(vec![
            (5, vec![vec![0.2], vec![0.8], vec![0.5]]),
            (6, vec![vec![0.3], vec![0.7], vec![0.5]]),
        ]);
        let comparator = CanaryComparator::new(backend);

        let report = comparator.compare(5, 6, &batch()).await.unwrap();

        // (0.1 + 0.1 + 0.0) / 3
        assert!((report.avg_abs_diff - 0.0667).abs() < 1e-3);
        assert_eq!(report.predictions_a.len(), 3);
        assert_eq!(report.predictions_b.len(), 3);
    }

    #[tokio::test]
    async fn test_identical_versions_have_zero_drift() {
        let backend = StubBackend::new(vec![(4, vec![vec![0.42], vec![0.9], vec![0.1]])]);
        let comparator = CanaryComparator::new(backend);

        let report = comparator.compare(4, 4, &batch()).await.unwrap();
        assert_eq!(report.avg_abs_diff, 0.0);
    }

    #[tokio::test]
    async fn test_shape_mismatch_fails_without_averaging() {
        let backend = StubBackend::new(vec![
            (5, vec![vec![0.2, 0.8], vec![0.8, 0.2], vec![0.5, 0.5]]),
            (6, vec![vec![0.3], vec![0.7], vec![0.5]]),
        ]);
        let comparator = CanaryComparator::new(backend);

        let err = comparator.compare(5, 6, &batch()).await.unwrap_err();
        match err {
            Error::ShapeMismatch { left, right } => {
                assert_eq!(left, 6);
                assert_eq!(right, 3);
            }
            other => panic!("expected ShapeMismatch, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_failing_side_is_named() {
        let backend = StubBackend::new(vec![(5, vec![vec![0.2], vec![0.8], vec![0.5]])]);
        let comparator = CanaryComparator::new(backend);

        let err = comparator.compare(5, 9, &batch()).await.unwrap_err();
        match err {
            Error::CanaryUnavailable { side, .. } => {
                assert_eq!(side, CanarySide::VersionB);
            }
            other => panic!("expected CanaryUnavailable, got {}", other),
        }

        let err = comparator.compare(9, 5, &batch()).await.unwrap_err();
        match err {
            Error::CanaryUnavailable { side, .. } => {
                assert_eq!(side, CanarySide::VersionA);
            }
            other => panic!("expected CanaryUnavailable, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_prediction_set_is_unavailable() {
        let backend = StubBackend::new(vec![
            (5, vec![vec![0.2], vec![0.8], vec![0.5]]),
            (6, vec![]),
        ]);
        let comparator = CanaryComparator::new(backend);

        let err = comparator.compare(5, 6, &batch()).await.unwrap_err();
        assert!(err.is_canary_unavailable());
    }
}
