//! Session Lifecycle Controller
//!
//! `Idle --start--> Running --(drop | tick cap)--> Ended`
//!
//! - [`RoastController`]: start/drop/retry, owns the active session handle
//! - [`OperatorHandle`]: cloneable handle for actuator writes and events
//! - [`TickScheduler`]: the single periodic task that owns session state
//! - [`RoastSession`]: the pure state machine the scheduler drives

pub mod actuators;
pub mod controller;
pub mod scheduler;
pub mod state;

pub use actuators::ActuatorPanel;
pub use controller::{FinishedBatch, OperatorHandle, RoastController};
pub use scheduler::{SchedulerStats, SessionReport, TickScheduler};
pub use state::{AdvisoryDisposition, RoastSession, TickOutcome};

use thiserror::Error;

use crate::advisory::AdvisoryError;
use crate::storage::StorageError;
use crate::types::Recommendation;

/// Operator events that must be applied in order with the ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    MarkFirstCrack,
    Drop,
}

/// Advisory result tagged with the tick it was requested for.
#[derive(Debug)]
pub struct AdvisoryResponse {
    pub tick: u64,
    pub result: Result<Option<Recommendation>, AdvisoryError>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a session is already running")]
    AlreadyRunning,

    #[error("no session is running")]
    NotRunning,

    #[error("reference trajectory unavailable: {0}")]
    Reference(#[source] StorageError),

    #[error("batch was not saved: {0}")]
    Persistence(#[source] StorageError),

    #[error("no unsaved batch to retry")]
    NothingToRetry,

    #[error("tick scheduler stopped unexpectedly: {0}")]
    Scheduler(String),
}
