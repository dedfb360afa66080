//! Roast Controller - session lifecycle and operator-facing handle

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::actuators::ActuatorPanel;
use super::scheduler::{SchedulerContext, SchedulerStats, SessionReport, TickScheduler};
use super::state::RoastSession;
use super::{SessionCommand, SessionError};
use crate::advisory::{self, AdvisoryService};
use crate::config::defaults::CHANNEL_CAPACITY;
use crate::config::RoastConfig;
use crate::storage::{BatchSink, ReferenceProvider};
use crate::types::{
    Actuators, BatchMetadata, BatchReceipt, FinalizationStatus, FinalizationSummary,
    SessionSnapshot,
};

/// A finished and saved batch.
#[derive(Debug, Clone)]
pub struct FinishedBatch {
    pub summary: FinalizationSummary,
    pub receipt: BatchReceipt,
    pub stats: SchedulerStats,
}

// ============================================================================
// Operator Handle
// ============================================================================

/// Cloneable handle for operator input while a session runs.
///
/// Actuator writes go straight to the shared panel and are picked up on the
/// next tick. First Crack and Drop are queued so they apply in order with
/// the ticks.
#[derive(Clone)]
pub struct OperatorHandle {
    session_id: Uuid,
    commands: mpsc::Sender<SessionCommand>,
    actuators: Arc<ActuatorPanel>,
    snapshot: Arc<ArcSwap<SessionSnapshot>>,
    cancel: CancellationToken,
}

impl OperatorHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn set_gas(&self, percent: u8) -> u8 {
        self.actuators.set_gas(percent)
    }

    pub fn set_airflow(&self, percent: u8) -> u8 {
        self.actuators.set_airflow(percent)
    }

    pub async fn mark_first_crack(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::MarkFirstCrack).await
    }

    /// Request a drop. The controller's `wait_finished` returns once the
    /// batch has been handed to the sink.
    pub async fn drop_batch(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Drop).await
    }

    /// Drop without waiting for channel capacity; used from signal handlers.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot.load_full()
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::NotRunning)
    }
}

// ============================================================================
// Controller
// ============================================================================

struct ActiveSession {
    operator: OperatorHandle,
    handle: JoinHandle<SessionReport>,
}

/// Owns the session lifecycle. At most one session runs at a time.
pub struct RoastController {
    config: RoastConfig,
    references: Arc<dyn ReferenceProvider>,
    sink: Arc<dyn BatchSink>,
    advisory: Arc<dyn AdvisoryService>,
    actuators: Arc<ActuatorPanel>,
    snapshot: Arc<ArcSwap<SessionSnapshot>>,
    tick_period: Duration,
    active: Option<ActiveSession>,
    /// Ended batches the sink has not accepted yet, oldest first
    unsaved: Vec<FinalizationSummary>,
}

impl RoastController {
    pub fn new(
        config: RoastConfig,
        references: Arc<dyn ReferenceProvider>,
        sink: Arc<dyn BatchSink>,
    ) -> Self {
        let advisory = advisory::connect(&config.advisory);
        let tick_period = Duration::from_millis(config.session.tick_period_ms.max(1));
        Self {
            config,
            references,
            sink,
            advisory,
            actuators: Arc::new(ActuatorPanel::default()),
            snapshot: Arc::new(ArcSwap::from_pointee(SessionSnapshot::default())),
            tick_period,
            active: None,
            unsaved: Vec::new(),
        }
    }

    /// Replace the advisory boundary (latency and failure simulation).
    pub fn with_advisory(mut self, service: Arc<dyn AdvisoryService>) -> Self {
        self.advisory = service;
        self
    }

    /// Override the wall-clock tick period from config.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period.max(Duration::from_millis(1));
        self
    }

    pub fn config(&self) -> &RoastConfig {
        &self.config
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Idle -> Running. Loads the reference once and starts the tick task.
    pub async fn start(
        &mut self,
        reference_id: &str,
        metadata: BatchMetadata,
    ) -> Result<Uuid, SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        // A session that hit the tick cap has finished but not been collected.
        if let Some(previous) = self.active.take() {
            if let Err(e) = self.collect(previous).await {
                warn!("Previous session: {}", e);
            }
        }

        let reference = self
            .references
            .load_reference(reference_id)
            .await
            .map_err(SessionError::Reference)?;
        info!(
            reference = %reference.id,
            points = reference.len(),
            "Reference loaded: {}",
            reference.label
        );

        let session = RoastSession::start(
            &self.config,
            Arc::new(reference),
            metadata,
            self.actuators.read(),
        );
        let session_id = session.id();

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let ctx = SchedulerContext {
            actuators: Arc::clone(&self.actuators),
            advisory: Arc::clone(&self.advisory),
            sink: Arc::clone(&self.sink),
            snapshot: Arc::clone(&self.snapshot),
            batch: self.config.batch.clone(),
            tick_period: self.tick_period,
            advisory_timeout: Duration::from_millis(self.config.advisory.timeout_ms),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(TickScheduler::new(session, ctx, rx).run());

        self.active = Some(ActiveSession {
            operator: OperatorHandle {
                session_id,
                commands: tx,
                actuators: Arc::clone(&self.actuators),
                snapshot: Arc::clone(&self.snapshot),
                cancel,
            },
            handle,
        });
        Ok(session_id)
    }

    /// Running -> Ended by operator drop; waits for finalization.
    pub async fn drop_batch(&mut self) -> Result<FinishedBatch, SessionError> {
        let active = self.active.take().ok_or(SessionError::NotRunning)?;
        // Send fails only if the task already ended on the tick cap.
        let _ = active.operator.drop_batch().await;
        self.collect(active).await
    }

    /// Wait for the running session to end by itself (tick cap or a drop
    /// sent through an [`OperatorHandle`]).
    pub async fn wait_finished(&mut self) -> Result<FinishedBatch, SessionError> {
        let active = self.active.take().ok_or(SessionError::NotRunning)?;
        self.collect(active).await
    }

    /// Re-send unsaved batches to the sink, oldest first.
    ///
    /// Stops at the first failure; that batch and the ones after it stay
    /// retained.
    pub async fn retry_finalize(&mut self) -> Result<Vec<BatchReceipt>, SessionError> {
        if self.unsaved.is_empty() {
            return Err(SessionError::NothingToRetry);
        }

        let mut receipts = Vec::with_capacity(self.unsaved.len());
        while let Some(summary) = self.unsaved.first() {
            let receipt = self
                .sink
                .finalize(&summary.batch_record())
                .await
                .map_err(SessionError::Persistence)?;
            info!(
                session_id = %summary.session_id,
                batch_id = %receipt.batch_id,
                "Retried batch saved"
            );
            self.mark_saved(summary.session_id, &receipt);
            self.unsaved.remove(0);
            receipts.push(receipt);
        }
        Ok(receipts)
    }

    async fn collect(&mut self, active: ActiveSession) -> Result<FinishedBatch, SessionError> {
        let report = active
            .handle
            .await
            .map_err(|e| SessionError::Scheduler(e.to_string()))?;

        match report.finalize {
            Ok(receipt) => Ok(FinishedBatch {
                summary: report.summary,
                receipt,
                stats: report.stats,
            }),
            Err(e) => {
                self.unsaved.push(report.summary);
                Err(SessionError::Persistence(e))
            }
        }
    }

    fn mark_saved(&self, session_id: Uuid, receipt: &BatchReceipt) {
        let current = self.snapshot.load_full();
        if current.session_id == Some(session_id) {
            let mut updated = (*current).clone();
            updated.finalization = FinalizationStatus::Saved {
                batch_id: receipt.batch_id.clone(),
            };
            self.snapshot.store(Arc::new(updated));
        }
    }

    // ========================================================================
    // Operator Input & Views
    // ========================================================================

    /// Actuator writes are accepted in any state and carry over to the
    /// next session.
    pub fn set_gas(&self, percent: u8) -> u8 {
        self.actuators.set_gas(percent)
    }

    pub fn set_airflow(&self, percent: u8) -> u8 {
        self.actuators.set_airflow(percent)
    }

    pub fn actuators(&self) -> Actuators {
        self.actuators.read()
    }

    pub async fn mark_first_crack(&self) -> Result<(), SessionError> {
        match &self.active {
            Some(active) => active.operator.mark_first_crack().await,
            None => Err(SessionError::NotRunning),
        }
    }

    /// Handle for a separate input task. `None` when no session was started.
    pub fn operator(&self) -> Option<OperatorHandle> {
        self.active.as_ref().map(|a| a.operator.clone())
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| !a.handle.is_finished())
    }

    /// Latest committed snapshot.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot.load_full()
    }

    /// Shared snapshot cell for readers that outlive a borrow of the controller.
    pub fn snapshot_source(&self) -> Arc<ArcSwap<SessionSnapshot>> {
        Arc::clone(&self.snapshot)
    }

    pub fn unsaved(&self) -> &[FinalizationSummary] {
        &self.unsaved
    }
}
