//! Storage boundaries for the roast loop
//!
//! The loop talks to two external collaborators:
//! - a read-only [`ReferenceProvider`] consulted once per session start
//! - a write-only [`BatchSink`] that receives the finished batch
//!
//! Adapters:
//! - [`InMemoryStore`]: both traits, not durable; tests and `--ephemeral`
//! - [`SledStore`]: both traits on a local sled database; finalized batches
//!   become loadable references

pub mod persistence;
pub mod sled_store;

pub use persistence::{BatchSink, InMemoryStore, ReferenceProvider, StorageError};
pub use sled_store::SledStore;

use crate::config::RoastConfig;
use crate::physics_engine::ThermalModel;
use crate::types::{Actuators, Milestone, MilestoneKind, ReferencePoint, ReferenceTrajectory};

/// Id under which the simulated master curve is stored.
pub const SIMULATED_MASTER_ID: &str = "simulated-master";

/// Build a master curve by running the thermal model with fixed settings.
///
/// Used to seed an empty store so the demo always has a reference. The
/// Dry End event is placed at the first tick that crosses `dry_end_temp`.
pub fn simulated_master(
    model: &ThermalModel,
    actuators: Actuators,
    ticks: u64,
    dry_end_temp: f64,
) -> ReferenceTrajectory {
    let temps = model.project(actuators, ticks);
    let points: Vec<ReferencePoint> = temps
        .iter()
        .zip(0u64..)
        .map(|(&temp, tick)| ReferencePoint { tick, temp })
        .collect();

    let mut events = vec![Milestone {
        kind: MilestoneKind::Charge,
        tick: 0,
        temp: model.charge_temp(),
    }];
    if let Some(p) = points.iter().find(|p| p.temp >= dry_end_temp) {
        events.push(Milestone {
            kind: MilestoneKind::DryEnd,
            tick: p.tick,
            temp: p.temp,
        });
    }

    ReferenceTrajectory::new(
        SIMULATED_MASTER_ID,
        format!("Simulated master ({actuators})"),
        points,
        events,
    )
}

/// The simulated master for a deployment: the configured master settings
/// run for the full session length.
pub fn configured_master(config: &RoastConfig) -> ReferenceTrajectory {
    simulated_master(
        &ThermalModel::new(config.thermal.clone()),
        Actuators::new(
            config.reference.master_gas_power,
            config.reference.master_airflow,
        ),
        config.session.max_ticks,
        config.milestones.dry_end_temp_c,
    )
}
