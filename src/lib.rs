//! Roast Control: live coffee roast control loop
//!
//! Simulates bean temperature from operator gas/airflow settings, records
//! telemetry and rate of rise, detects roast milestones, and periodically
//! compares the live curve against a reference roast to advise the operator.
//!
//! ## Architecture
//!
//! - **Physics Engine**: per-tick thermal model
//! - **Telemetry**: append-only sample series and windowed RoR
//! - **Milestones**: Charge, Dry End, First Crack, Drop; development ratio
//! - **Advisory**: reference-curve classifier behind the `AdvisoryService` boundary
//! - **Session**: lifecycle controller and the single tick scheduler task
//! - **Storage**: reference provider and batch sink contracts, in-memory and sled adapters

pub mod advisory;
pub mod config;
pub mod milestones;
pub mod operator;
pub mod physics_engine;
pub mod session;
pub mod storage;
pub mod telemetry;
pub mod types;

// Re-export configuration
pub use config::RoastConfig;

// Re-export commonly used types
pub use types::{
    ActionCode, Actuators, AdvisoryRequest, BatchMetadata, BatchReceipt, BatchRecord, EndReason,
    FinalizationStatus, FinalizationSummary, Milestone, MilestoneKind, Recommendation,
    ReferencePoint, ReferenceTrajectory, SessionSnapshot, SessionStatus, TelemetrySample,
};

// Re-export the session surface
pub use session::{OperatorHandle, RoastController, SessionError};

// Re-export boundaries
pub use advisory::{AdvisoryError, AdvisoryService};
pub use storage::{BatchSink, InMemoryStore, ReferenceProvider, SledStore, StorageError};
