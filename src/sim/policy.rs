use crate::env::ObservationInfo;

/// Chooses an action from the current observation.
pub trait Policy {
    /// Returns an action in `[-1, 1]`: -1 charges at full power, +1
    /// discharges at full power.
    fn action(&mut self, info: &ObservationInfo) -> f64;

    fn name(&self) -> &str;
}

/// Always returns the same action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantPolicy {
    pub action: f64,
}

impl ConstantPolicy {
    pub fn new(action: f64) -> Self {
        Self { action }
    }

    /// Charges at full power every step.
    pub fn full_charge() -> Self {
        Self::new(-1.0)
    }
}

impl Policy for ConstantPolicy {
    fn action(&mut self, _info: &ObservationInfo) -> f64 {
        self.action
    }

    fn name(&self) -> &str {
        "constant"
    }
}

/// Price-threshold arbitrage.
///
/// Charges when `lmp + moer` is at or below `charge_below`, discharges when
/// it is at or above `discharge_above`, and idles in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceThresholdPolicy {
    pub charge_below: f64,
    pub discharge_above: f64,
}

impl PriceThresholdPolicy {
    /// # Panics
    ///
    /// Panics if `charge_below > discharge_above`.
    pub fn new(charge_below: f64, discharge_above: f64) -> Self {
        assert!(
            charge_below <= discharge_above,
            "charge threshold must not exceed discharge threshold"
        );
        Self {
            charge_below,
            discharge_above,
        }
    }
}

impl Policy for PriceThresholdPolicy {
    fn action(&mut self, info: &ObservationInfo) -> f64 {
        let signal = info.locational_marginal_price + info.marginal_operating_emissions_rate;
        if signal >= self.discharge_above {
            1.0
        } else if signal <= self.charge_below {
            -1.0
        } else {
            0.0
        }
    }

    fn name(&self) -> &str {
        "threshold"
    }
}
