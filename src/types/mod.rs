//! Shared data structures for the live roast control loop
//!
//! This module defines the records that flow between the loop components:
//! - Session: SessionStatus, Actuators, SessionSnapshot
//! - Telemetry: TelemetrySample, RorSample
//! - Milestones: MilestoneKind, Milestone
//! - Reference: ReferencePoint, ReferenceTrajectory (master curve)
//! - Advisory: AdvisoryRequest, ActionCode, Recommendation
//! - Batch: BatchMetadata, FinalizationSummary, BatchRecord, BatchReceipt

mod advisory;
mod batch;
mod milestone;
mod reference;
mod state;
mod telemetry;

pub use advisory::*;
pub use batch::*;
pub use milestone::*;
pub use reference::*;
pub use state::*;
pub use telemetry::*;
