//! In-process advisory boundary

use async_trait::async_trait;
use tracing::debug;

use super::engine::AdvisoryEngine;
use super::{AdvisoryError, AdvisoryService};
use crate::types::{AdvisoryRequest, Recommendation};

/// Runs the classifier in the local process.
///
/// Only built by [`super::connect`]; the session sees it as
/// `Arc<dyn AdvisoryService>`.
pub(super) struct InProcessAdvisory {
    engine: AdvisoryEngine,
}

impl InProcessAdvisory {
    pub(super) fn new(engine: AdvisoryEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl AdvisoryService for InProcessAdvisory {
    async fn recommend(
        &self,
        request: AdvisoryRequest,
    ) -> Result<Option<Recommendation>, AdvisoryError> {
        let recommendation = self.engine.recommend(&request);
        if recommendation.is_none() {
            debug!(
                tick = request.tick,
                reference = %request.reference.id,
                "No reference point at tick, skipping advisory"
            );
        }
        Ok(recommendation)
    }

    fn service_name(&self) -> &'static str {
        "in-process"
    }
}
