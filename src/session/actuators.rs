//! Operator actuator panel
//!
//! The operator writes gas and airflow at arbitrary times; the tick step
//! reads whatever was last committed. Each field is a single atomic, so a
//! write is never observed half-done and nothing is queued.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::types::Actuators;

#[derive(Debug, Default)]
pub struct ActuatorPanel {
    gas_power: AtomicU8,
    airflow: AtomicU8,
}

impl ActuatorPanel {
    pub fn new(initial: Actuators) -> Self {
        Self {
            gas_power: AtomicU8::new(initial.gas_power.min(100)),
            airflow: AtomicU8::new(initial.airflow.min(100)),
        }
    }

    /// Set gas power, clamped to 100. Returns the stored value.
    pub fn set_gas(&self, percent: u8) -> u8 {
        let v = percent.min(100);
        self.gas_power.store(v, Ordering::Release);
        v
    }

    /// Set airflow, clamped to 100. Returns the stored value.
    pub fn set_airflow(&self, percent: u8) -> u8 {
        let v = percent.min(100);
        self.airflow.store(v, Ordering::Release);
        v
    }

    /// Latest committed settings.
    pub fn read(&self) -> Actuators {
        Actuators {
            gas_power: self.gas_power.load(Ordering::Acquire),
            airflow: self.airflow.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins_and_clamps() {
        let panel = ActuatorPanel::new(Actuators::new(75, 50));
        panel.set_gas(80);
        panel.set_gas(60);
        assert_eq!(panel.set_airflow(250), 100);
        assert_eq!(panel.read(), Actuators::new(60, 100));
    }
}
