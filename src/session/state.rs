//! Roast session state machine
//!
//! `RoastSession` is the single owned mutable struct for one roast. The
//! scheduler task holds it exclusively and drives it one tick at a time;
//! nothing else writes to it. Every method here is synchronous and free of
//! I/O so the tick step stays deterministic.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AdvisoryResponse;
use crate::config::{BatchConfig, RoastConfig};
use crate::milestones::MilestoneDetector;
use crate::physics_engine::ThermalModel;
use crate::telemetry::TelemetryRecorder;
use crate::types::{
    Actuators, AdvisoryRequest, BatchMetadata, EndReason, FinalizationStatus, FinalizationSummary,
    Milestone, MilestoneKind, Recommendation, ReferenceTrajectory, SessionSnapshot, SessionStatus,
};

/// What one call to [`RoastSession::step`] produced.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub tick: u64,
    pub bean_temp: f64,
    pub ror: Option<f64>,
    /// Set on the one tick Dry End fires
    pub dry_end: Option<Milestone>,
    /// Advisory request due on this tick, if any
    pub advisory: Option<AdvisoryRequest>,
    /// Set when this tick hit the tick cap and ended the session
    pub ended: Option<EndReason>,
}

/// Result of offering an advisory response to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryDisposition {
    /// Became the displayed recommendation
    Applied,
    /// Accepted, but the service had nothing to say this cycle
    NoRecommendation,
    /// Service failed; previous recommendation left in place
    Failed,
    /// A newer request is outstanding
    Stale,
    /// Session no longer Running
    SessionEnded,
}

pub struct RoastSession {
    id: Uuid,
    status: SessionStatus,
    tick: u64,
    bean_temp: f64,
    /// Settings applied on the most recent tick
    actuators: Actuators,
    thermal: ThermalModel,
    telemetry: TelemetryRecorder,
    milestones: MilestoneDetector,
    reference: Arc<ReferenceTrajectory>,
    metadata: BatchMetadata,
    max_ticks: u64,
    sync_interval: u64,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    end_reason: Option<EndReason>,
    last_requested_tick: Option<u64>,
    recommendation: Option<Recommendation>,
}

impl RoastSession {
    /// Start a session: Running at tick 0 with the charge sample recorded.
    pub fn start(
        config: &RoastConfig,
        reference: Arc<ReferenceTrajectory>,
        metadata: BatchMetadata,
        actuators: Actuators,
    ) -> Self {
        let thermal = ThermalModel::new(config.thermal.clone());
        let charge_temp = thermal.charge_temp();

        let mut telemetry = TelemetryRecorder::new(&config.telemetry);
        telemetry.record(0, charge_temp);
        let mut milestones = MilestoneDetector::new(config.milestones.dry_end_temp_c);
        milestones.record_charge(0, charge_temp);

        let id = Uuid::new_v4();
        info!(
            session_id = %id,
            reference = %reference.id,
            label = %metadata.label,
            "Session started at {:.1} C ({})",
            charge_temp,
            actuators
        );

        Self {
            id,
            status: SessionStatus::Running,
            tick: 0,
            bean_temp: charge_temp,
            actuators,
            thermal,
            telemetry,
            milestones,
            reference,
            metadata,
            max_ticks: config.session.max_ticks,
            sync_interval: config.advisory.sync_interval_ticks.max(1),
            started_at: Utc::now(),
            ended_at: None,
            end_reason: None,
            last_requested_tick: None,
            recommendation: None,
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance one tick with the operator's current settings.
    ///
    /// Returns `None` once the session has ended. Reaching the tick cap ends
    /// the session on that tick, and no advisory is requested for it.
    pub fn step(&mut self, actuators: Actuators) -> Option<TickOutcome> {
        if self.status != SessionStatus::Running {
            return None;
        }

        self.tick += 1;
        self.actuators = actuators;
        self.bean_temp = self.thermal.step(self.bean_temp, actuators);
        self.telemetry.record(self.tick, self.bean_temp);
        let ror = self.telemetry.current_ror();
        let dry_end = self.milestones.inspect(self.tick, self.bean_temp);

        if self.tick >= self.max_ticks {
            info!(tick = self.tick, "Tick limit reached");
            self.end(EndReason::MaxTicks);
            return Some(TickOutcome {
                tick: self.tick,
                bean_temp: self.bean_temp,
                ror,
                dry_end,
                advisory: None,
                ended: Some(EndReason::MaxTicks),
            });
        }

        let advisory = (self.tick % self.sync_interval == 0).then(|| {
            self.last_requested_tick = Some(self.tick);
            AdvisoryRequest {
                tick: self.tick,
                current_temp: self.bean_temp,
                current_ror: ror,
                reference: Arc::clone(&self.reference),
            }
        });

        Some(TickOutcome {
            tick: self.tick,
            bean_temp: self.bean_temp,
            ror,
            dry_end,
            advisory,
            ended: None,
        })
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Mark first crack at the current tick. `None` unless Running.
    pub fn mark_first_crack(&mut self) -> Option<Milestone> {
        (self.status == SessionStatus::Running)
            .then(|| self.milestones.mark_first_crack(self.tick, self.bean_temp))
    }

    /// Transition Running -> Ended. Returns false if already ended.
    pub fn end(&mut self, reason: EndReason) -> bool {
        if self.status != SessionStatus::Running {
            return false;
        }
        self.status = SessionStatus::Ended;
        self.ended_at = Some(Utc::now());
        self.end_reason = Some(reason);
        self.milestones.record_drop(self.tick, self.bean_temp);
        info!(
            session_id = %self.id,
            tick = self.tick,
            reason = %reason,
            "Session ended at {:.1} C",
            self.bean_temp
        );
        true
    }

    /// Offer an advisory response.
    ///
    /// Only the response for the most recently requested tick is considered,
    /// and only while Running. Anything else is dropped without touching the
    /// displayed recommendation.
    pub fn apply_advisory(&mut self, response: AdvisoryResponse) -> AdvisoryDisposition {
        if self.status != SessionStatus::Running {
            debug!(
                tick = response.tick,
                "Advisory response after session end discarded"
            );
            return AdvisoryDisposition::SessionEnded;
        }
        if self.last_requested_tick != Some(response.tick) {
            debug!(
                tick = response.tick,
                latest = ?self.last_requested_tick,
                "Stale advisory response discarded"
            );
            return AdvisoryDisposition::Stale;
        }

        match response.result {
            Ok(Some(rec)) => {
                debug!(
                    tick = rec.tick,
                    action = %rec.action,
                    intensity = rec.intensity,
                    "Advisory applied"
                );
                self.recommendation = Some(rec);
                AdvisoryDisposition::Applied
            }
            Ok(None) => AdvisoryDisposition::NoRecommendation,
            Err(e) => {
                warn!(
                    tick = response.tick,
                    "Advisory failed, keeping previous recommendation: {}",
                    e
                );
                AdvisoryDisposition::Failed
            }
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn bean_temp(&self) -> f64 {
        self.bean_temp
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn milestone(&self, kind: MilestoneKind) -> Option<&Milestone> {
        self.milestones.get(kind)
    }

    pub fn recommendation(&self) -> Option<&Recommendation> {
        self.recommendation.as_ref()
    }

    pub fn development_ratio(&self) -> f64 {
        self.milestones.development_ratio(self.tick)
    }

    /// Build the finalization summary. `None` while still Running.
    pub fn summary(&self, batch: &BatchConfig) -> Option<FinalizationSummary> {
        let (ended_at, end_reason) = self.ended_at.zip(self.end_reason)?;
        Some(self.build_summary(batch, ended_at, end_reason))
    }

    /// End the session if it is still running (as a drop) and build its summary.
    pub fn finish(&mut self, batch: &BatchConfig) -> FinalizationSummary {
        self.end(EndReason::Drop);
        let ended_at = self.ended_at.unwrap_or_else(Utc::now);
        let end_reason = self.end_reason.unwrap_or(EndReason::Drop);
        self.build_summary(batch, ended_at, end_reason)
    }

    fn build_summary(
        &self,
        batch: &BatchConfig,
        ended_at: DateTime<Utc>,
        end_reason: EndReason,
    ) -> FinalizationSummary {
        FinalizationSummary {
            session_id: self.id,
            reference_id: self.reference.id.clone(),
            metadata: self.metadata.clone(),
            started_at: self.started_at,
            ended_at,
            end_reason,
            total_ticks: self.tick,
            final_temp: self.bean_temp,
            mass_loss_estimate: batch.mass_loss_estimate(self.bean_temp),
            development_ratio: self.development_ratio(),
            milestones: self.milestones.to_vec(),
            telemetry: self.telemetry.samples().to_vec(),
            ror: self.telemetry.ror_series().to_vec(),
        }
    }

    pub fn snapshot(&self, finalization: FinalizationStatus) -> SessionSnapshot {
        SessionSnapshot {
            session_id: Some(self.id),
            status: self.status,
            tick: self.tick,
            bean_temp: self.bean_temp,
            ror: self.telemetry.current_ror(),
            actuators: self.actuators,
            milestones: self.milestones.to_vec(),
            development_ratio: self.development_ratio(),
            recommendation: self.recommendation.clone(),
            finalization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::AdvisoryError;
    use crate::types::{ActionCode, ReferencePoint};

    fn reference() -> Arc<ReferenceTrajectory> {
        let points = (0..=720)
            .map(|tick| ReferencePoint { tick, temp: 100.0 })
            .collect();
        Arc::new(ReferenceTrajectory::new("ref", "flat", points, Vec::new()))
    }

    fn session_with(config: &RoastConfig) -> RoastSession {
        RoastSession::start(
            config,
            reference(),
            BatchMetadata::default(),
            Actuators::new(75, 50),
        )
    }

    fn rec(tick: u64) -> Recommendation {
        Recommendation {
            tick,
            temp_delta: 0.0,
            action: ActionCode::Stable,
            intensity: 0,
            message: "on curve".to_string(),
            is_synchronized: true,
        }
    }

    fn response(tick: u64) -> AdvisoryResponse {
        AdvisoryResponse {
            tick,
            result: Ok(Some(rec(tick))),
        }
    }

    #[test]
    fn test_start_records_charge() {
        let session = session_with(&RoastConfig::default());
        assert_eq!(session.status(), SessionStatus::Running);
        assert_eq!(session.tick(), 0);
        assert_eq!(session.telemetry().len(), 1);
        let charge = session.milestone(MilestoneKind::Charge).expect("charge");
        assert_eq!(charge.tick, 0);
        assert!((charge.temp - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_step_matches_thermal_model() {
        let mut session = session_with(&RoastConfig::default());
        let out = session.step(Actuators::new(75, 50)).expect("running");
        assert_eq!(out.tick, 1);
        assert!((out.bean_temp - 25.8875).abs() < 1e-9);
        assert!(out.ror.is_none());
        assert!(out.advisory.is_none());
    }

    #[test]
    fn test_advisory_cadence() {
        let mut session = session_with(&RoastConfig::default());
        let requested: Vec<u64> = (0..9)
            .filter_map(|_| session.step(Actuators::new(75, 50)))
            .filter_map(|out| out.advisory.map(|r| r.tick))
            .collect();
        assert_eq!(requested, vec![3, 6, 9]);
    }

    #[test]
    fn test_tick_cap_ends_session() {
        let mut config = RoastConfig::default();
        config.session.max_ticks = 6;
        let mut session = session_with(&config);

        let mut last = None;
        while let Some(out) = session.step(Actuators::new(75, 50)) {
            last = Some(out);
        }
        let last = last.expect("at least one tick");
        assert_eq!(last.tick, 6);
        assert_eq!(last.ended, Some(EndReason::MaxTicks));
        assert!(last.advisory.is_none());
        assert_eq!(session.status(), SessionStatus::Ended);
        assert!(session.step(Actuators::new(75, 50)).is_none());

        let summary = session.summary(&config.batch).expect("ended");
        assert_eq!(summary.total_ticks, 6);
        assert_eq!(summary.telemetry.len(), 7);
        assert_eq!(summary.end_reason, EndReason::MaxTicks);
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut session = session_with(&RoastConfig::default());
        for _ in 0..6 {
            session.step(Actuators::new(75, 50));
        }
        // Requests went out for 3 and 6; 3 arrives late
        assert_eq!(
            session.apply_advisory(response(3)),
            AdvisoryDisposition::Stale
        );
        assert!(session.recommendation().is_none());
        assert_eq!(
            session.apply_advisory(response(6)),
            AdvisoryDisposition::Applied
        );
        assert_eq!(session.recommendation().map(|r| r.tick), Some(6));
    }

    #[test]
    fn test_failure_keeps_previous_recommendation() {
        let mut session = session_with(&RoastConfig::default());
        for _ in 0..3 {
            session.step(Actuators::new(75, 50));
        }
        session.apply_advisory(response(3));
        for _ in 0..3 {
            session.step(Actuators::new(75, 50));
        }
        let failed = AdvisoryResponse {
            tick: 6,
            result: Err(AdvisoryError::Unavailable("offline".to_string())),
        };
        assert_eq!(session.apply_advisory(failed), AdvisoryDisposition::Failed);
        assert_eq!(session.recommendation().map(|r| r.tick), Some(3));
    }

    #[test]
    fn test_response_after_end_discarded() {
        let mut session = session_with(&RoastConfig::default());
        for _ in 0..3 {
            session.step(Actuators::new(75, 50));
        }
        assert!(session.end(EndReason::Drop));
        assert!(!session.end(EndReason::Drop));
        assert_eq!(
            session.apply_advisory(response(3)),
            AdvisoryDisposition::SessionEnded
        );
        assert!(session.recommendation().is_none());
    }

    #[test]
    fn test_first_crack_only_while_running() {
        let mut session = session_with(&RoastConfig::default());
        for _ in 0..10 {
            session.step(Actuators::new(75, 50));
        }
        let fc = session.mark_first_crack().expect("running");
        assert_eq!(fc.tick, 10);
        session.end(EndReason::Drop);
        assert!(session.mark_first_crack().is_none());
        assert_eq!(
            session.milestone(MilestoneKind::FirstCrack).map(|m| m.tick),
            Some(10)
        );
        assert!((session.development_ratio() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_none_while_running() {
        let session = session_with(&RoastConfig::default());
        assert!(session.summary(&BatchConfig::default()).is_none());
    }
}
