//! Advisory Engine
//!
//! Compares the live roast against a reference trajectory and returns a
//! banded corrective recommendation.
//!
//! The classifier sits behind the [`AdvisoryService`] boundary. Its band
//! thresholds are private to [`engine`]; the session only ever holds an
//! `Arc<dyn AdvisoryService>` obtained from [`connect`], the single
//! constructor for the one real implementation. Tests substitute their own
//! implementations of the trait to simulate latency and failures.

mod engine;
mod service;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AdvisoryConfig;
use crate::types::{AdvisoryRequest, Recommendation};

/// Failures at the advisory boundary. All of them are non-fatal to the
/// session: the previous recommendation stays on screen.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("advisory service unavailable: {0}")]
    Unavailable(String),
    #[error("advisory request for tick {tick} timed out after {timeout_ms} ms")]
    Timeout { tick: u64, timeout_ms: u64 },
}

/// Single-method advisory boundary.
///
/// `Ok(None)` means "no recommendation this cycle" (the reference has no
/// point at the requested tick). It is not an error.
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    async fn recommend(
        &self,
        request: AdvisoryRequest,
    ) -> Result<Option<Recommendation>, AdvisoryError>;

    /// Human-readable name for logging.
    fn service_name(&self) -> &'static str;
}

/// Open the advisory boundary with the given band configuration.
pub fn connect(cfg: &AdvisoryConfig) -> Arc<dyn AdvisoryService> {
    Arc::new(service::InProcessAdvisory::new(engine::AdvisoryEngine::new(cfg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionCode, ReferencePoint, ReferenceTrajectory};

    #[tokio::test]
    async fn test_connect_classifies_through_trait_object() {
        let service = connect(&AdvisoryConfig::default());
        assert_eq!(service.service_name(), "in-process");

        let reference = Arc::new(ReferenceTrajectory::new(
            "ref",
            "master",
            vec![ReferencePoint {
                tick: 9,
                temp: 80.0,
            }],
            Vec::new(),
        ));
        let rec = service
            .recommend(AdvisoryRequest {
                tick: 9,
                current_temp: 77.0,
                current_ror: Some(14.0),
                reference: Arc::clone(&reference),
            })
            .await
            .expect("in-process advisory never fails")
            .expect("tick 9 present");
        assert_eq!(rec.action, ActionCode::IncreaseGas);
        assert_eq!(rec.intensity, 90);

        let none = service
            .recommend(AdvisoryRequest {
                tick: 12,
                current_temp: 77.0,
                current_ror: None,
                reference,
            })
            .await
            .expect("in-process advisory never fails");
        assert!(none.is_none());
    }
}
