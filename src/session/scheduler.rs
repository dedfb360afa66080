//! Tick scheduler
//!
//! One periodic, cancelable tokio task per session. It owns the
//! [`RoastSession`] outright, so ticks, operator events and advisory
//! responses are applied strictly one at a time without locks. Readers see
//! the session only through the published [`SessionSnapshot`].
//!
//! Advisory calls are spawned off the loop with a timeout and report back on
//! a channel; a slow service never delays the next tick. When the loop
//! exits the receiver is dropped, so late responses have nowhere to land.

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::actuators::ActuatorPanel;
use super::state::{AdvisoryDisposition, RoastSession};
use super::{AdvisoryResponse, SessionCommand};
use crate::advisory::{AdvisoryError, AdvisoryService};
use crate::config::defaults::{CHANNEL_CAPACITY, PROGRESS_LOG_INTERVAL_TICKS};
use crate::config::BatchConfig;
use crate::storage::{BatchSink, StorageError};
use crate::types::{
    AdvisoryRequest, BatchReceipt, EndReason, FinalizationStatus, FinalizationSummary,
    SessionSnapshot, SessionStatus,
};

/// What the scheduler hands back when its task completes.
#[derive(Debug)]
pub struct SessionReport {
    pub summary: FinalizationSummary,
    pub finalize: Result<BatchReceipt, StorageError>,
    pub stats: SchedulerStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub advisories_requested: u64,
    pub advisories_applied: u64,
    pub advisories_discarded: u64,
    pub advisories_failed: u64,
}

/// Shared collaborators handed to the scheduler task.
pub struct SchedulerContext {
    pub actuators: Arc<ActuatorPanel>,
    pub advisory: Arc<dyn AdvisoryService>,
    pub sink: Arc<dyn BatchSink>,
    pub snapshot: Arc<ArcSwap<SessionSnapshot>>,
    pub batch: BatchConfig,
    pub tick_period: Duration,
    pub advisory_timeout: Duration,
    pub cancel: CancellationToken,
}

pub struct TickScheduler {
    session: RoastSession,
    ctx: SchedulerContext,
    commands: mpsc::Receiver<SessionCommand>,
    stats: SchedulerStats,
}

impl TickScheduler {
    pub fn new(
        session: RoastSession,
        ctx: SchedulerContext,
        commands: mpsc::Receiver<SessionCommand>,
    ) -> Self {
        Self {
            session,
            ctx,
            commands,
            stats: SchedulerStats::default(),
        }
    }

    /// Run until drop, tick cap or cancellation, then finalize exactly once.
    pub async fn run(mut self) -> SessionReport {
        let (advisory_tx, mut advisory_rx) = mpsc::channel::<AdvisoryResponse>(CHANNEL_CAPACITY);

        // First tick one period after start; tick 0 is the charge sample.
        let period = self.ctx.tick_period;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.publish(FinalizationStatus::NotReady);
        info!(
            session_id = %self.session.id(),
            period_ms = period.as_millis(),
            advisory = self.ctx.advisory.service_name(),
            "Tick scheduler running"
        );

        loop {
            tokio::select! {
                biased;

                () = self.ctx.cancel.cancelled() => {
                    info!("[Scheduler] Cancellation received, dropping batch");
                    self.session.end(EndReason::Drop);
                }
                Some(command) = self.commands.recv() => {
                    self.handle_command(command);
                }
                Some(response) = advisory_rx.recv() => {
                    self.handle_advisory(response);
                }
                _ = interval.tick() => {
                    self.handle_tick(&advisory_tx);
                }
            }

            self.publish(FinalizationStatus::NotReady);
            if self.session.status() == SessionStatus::Ended {
                break;
            }
        }

        drop(advisory_rx);
        self.finalize().await
    }

    fn handle_tick(&mut self, advisory_tx: &mpsc::Sender<AdvisoryResponse>) {
        let actuators = self.ctx.actuators.read();
        let Some(outcome) = self.session.step(actuators) else {
            return;
        };
        self.stats.ticks += 1;

        if is_progress_tick(outcome.tick) {
            debug!(
                tick = outcome.tick,
                temp = format!("{:.1}", outcome.bean_temp),
                ror = ?outcome.ror.map(|r| (r * 10.0).round() / 10.0),
                "{}",
                actuators
            );
        }

        if let Some(request) = outcome.advisory {
            self.stats.advisories_requested += 1;
            spawn_advisory(
                Arc::clone(&self.ctx.advisory),
                request,
                self.ctx.advisory_timeout,
                advisory_tx.clone(),
            );
        }
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::MarkFirstCrack => {
                if self.session.mark_first_crack().is_none() {
                    warn!("First Crack ignored: session not running");
                }
            }
            SessionCommand::Drop => {
                self.session.end(EndReason::Drop);
            }
        }
    }

    fn handle_advisory(&mut self, response: AdvisoryResponse) {
        match self.session.apply_advisory(response) {
            AdvisoryDisposition::Applied => self.stats.advisories_applied += 1,
            AdvisoryDisposition::NoRecommendation => {}
            AdvisoryDisposition::Failed => self.stats.advisories_failed += 1,
            AdvisoryDisposition::Stale | AdvisoryDisposition::SessionEnded => {
                self.stats.advisories_discarded += 1;
            }
        }
    }

    fn publish(&self, finalization: FinalizationStatus) {
        self.ctx
            .snapshot
            .store(Arc::new(self.session.snapshot(finalization)));
    }

    async fn finalize(mut self) -> SessionReport {
        let summary = self.session.finish(&self.ctx.batch);

        let finalize = self.ctx.sink.finalize(&summary.batch_record()).await;
        let status = match &finalize {
            Ok(receipt) => {
                info!(
                    batch_id = %receipt.batch_id,
                    sink = self.ctx.sink.backend_name(),
                    "Batch saved"
                );
                FinalizationStatus::Saved {
                    batch_id: receipt.batch_id.clone(),
                }
            }
            Err(e) => {
                error!(
                    sink = self.ctx.sink.backend_name(),
                    "Batch finalization failed, summary retained for retry: {}",
                    e
                );
                FinalizationStatus::Unsaved {
                    error: e.to_string(),
                }
            }
        };
        self.publish(status);

        SessionReport {
            summary,
            finalize,
            stats: self.stats,
        }
    }
}

fn is_progress_tick(tick: u64) -> bool {
    tick % PROGRESS_LOG_INTERVAL_TICKS == 0
}

/// Fire one advisory round trip off the tick loop.
fn spawn_advisory(
    service: Arc<dyn AdvisoryService>,
    request: AdvisoryRequest,
    timeout: Duration,
    tx: mpsc::Sender<AdvisoryResponse>,
) {
    let tick = request.tick;
    tokio::spawn(async move {
        let result = match tokio::time::timeout(timeout, service.recommend(request)).await {
            Ok(result) => result,
            Err(_) => Err(AdvisoryError::Timeout {
                tick,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };
        // Receiver is gone once the session has ended.
        if tx.send(AdvisoryResponse { tick, result }).await.is_err() {
            debug!(tick, "Advisory response arrived after session end");
        }
    });
}
