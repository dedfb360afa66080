//! Bean temperature model
//!
//! One explicit Euler step per tick:
//!
//! ```text
//! heat_gain = gas_power * k_gas - airflow * k_air
//! heat_loss = temp^2 * k_loss
//! next      = temp + heat_gain - heat_loss
//! ```
//!
//! The quadratic loss stands in for radiative and convective losses. The
//! coefficients are calibrated to draw a plausible demo curve, not measured.

use crate::config::ThermalConfig;
use crate::types::Actuators;

/// Advance the bean temperature by one tick.
///
/// Pure and total: any finite input yields a finite output.
pub fn advance(current_temp: f64, gas_power: f64, airflow: f64, cfg: &ThermalConfig) -> f64 {
    let heat_gain = gas_power * cfg.k_gas - airflow * cfg.k_air;
    let heat_loss = current_temp * current_temp * cfg.k_loss;
    current_temp + heat_gain - heat_loss
}

/// Temperature at which gain and loss balance for fixed actuator settings.
///
/// Returns 0.0 when airflow outweighs gas (the model has no positive
/// equilibrium) or the loss coefficient is zero.
pub fn equilibrium_temp(gas_power: f64, airflow: f64, cfg: &ThermalConfig) -> f64 {
    let net_gain = gas_power * cfg.k_gas - airflow * cfg.k_air;
    if net_gain <= 0.0 || cfg.k_loss <= 0.0 {
        return 0.0;
    }
    (net_gain / cfg.k_loss).sqrt()
}

/// Thermal model bound to one calibration.
#[derive(Debug, Clone)]
pub struct ThermalModel {
    cfg: ThermalConfig,
}

impl ThermalModel {
    pub fn new(cfg: ThermalConfig) -> Self {
        Self { cfg }
    }

    pub fn charge_temp(&self) -> f64 {
        self.cfg.charge_temp_c
    }

    /// One tick with the given actuator settings.
    pub fn step(&self, current_temp: f64, actuators: Actuators) -> f64 {
        advance(
            current_temp,
            f64::from(actuators.gas_power),
            f64::from(actuators.airflow),
            &self.cfg,
        )
    }

    pub fn equilibrium(&self, actuators: Actuators) -> f64 {
        equilibrium_temp(
            f64::from(actuators.gas_power),
            f64::from(actuators.airflow),
            &self.cfg,
        )
    }

    /// Temperatures for ticks `0..=ticks` with constant settings, starting at charge.
    pub fn project(&self, actuators: Actuators, ticks: u64) -> Vec<f64> {
        let mut temps = Vec::with_capacity(usize::try_from(ticks).unwrap_or(0) + 1);
        let mut temp = self.cfg.charge_temp_c;
        temps.push(temp);
        for _ in 0..ticks {
            temp = self.step(temp, actuators);
            temps.push(temp);
        }
        temps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_step_from_charge() {
        let cfg = ThermalConfig::default();
        // gain = 75*0.016 - 50*0.006 = 0.9, loss = 25^2 * 0.00002 = 0.0125
        let next = advance(25.0, 75.0, 50.0, &cfg);
        assert!((next - 25.8875).abs() < 1e-9, "got {next}");
    }

    #[test]
    fn test_no_input_cools() {
        let cfg = ThermalConfig::default();
        let next = advance(200.0, 0.0, 0.0, &cfg);
        assert!(next < 200.0);
    }

    #[test]
    fn test_airflow_only_cools_faster() {
        let cfg = ThermalConfig::default();
        let still = advance(180.0, 0.0, 0.0, &cfg);
        let fan = advance(180.0, 0.0, 100.0, &cfg);
        assert!(fan < still);
    }

    #[test]
    fn test_equilibrium_is_fixed_point() {
        let cfg = ThermalConfig::default();
        let eq = equilibrium_temp(75.0, 50.0, &cfg);
        // sqrt(0.9 / 0.00002) ~= 212.13
        assert!((eq - 212.132).abs() < 0.01, "got {eq}");
        assert!((advance(eq, 75.0, 50.0, &cfg) - eq).abs() < 1e-9);
    }

    #[test]
    fn test_equilibrium_negative_gain_is_zero() {
        let cfg = ThermalConfig::default();
        assert_eq!(equilibrium_temp(10.0, 100.0, &cfg), 0.0);
    }

    #[test]
    fn test_projection_is_deterministic_and_bounded() {
        let model = ThermalModel::new(ThermalConfig::default());
        let settings = Actuators::new(75, 50);
        let a = model.project(settings, 720);
        let b = model.project(settings, 720);
        assert_eq!(a.len(), 721);
        assert_eq!(a, b);
        let eq = model.equilibrium(settings);
        assert!(
            a.windows(2).all(|w| w[1] > w[0]),
            "heating curve must rise monotonically"
        );
        assert!(a.iter().all(|&t| t < eq));
    }
}
