// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use crate::error::{QuartzError, QuartzResult};
use serde::{Deserialize, Serialize};

/// Physical battery parameters and current charge, as reported by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    /// Usable energy capacity (kWh)
    pub capacity: f64,
    /// Charge/discharge power cap (kW)
    pub power_limit: f64,
    /// Charging efficiency, in (0, 1]
    pub charge_efficiency: f64,
    /// Discharging efficiency, in (0, 1]
    pub discharge_efficiency: f64,
    /// State of charge as a fraction of capacity, in [0, 1]
    pub current_charge: f64,
}

impl Battery {
    /// Check every field against its domain.
    pub fn validate(&self) -> QuartzResult<()> {
        positive("capacity", self.capacity)?;
        positive("power_limit", self.power_limit)?;
        efficiency("charge_efficiency", self.charge_efficiency)?;
        efficiency("discharge_efficiency", self.discharge_efficiency)?;
        state_of_charge("current_charge", self.current_charge)?;
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> QuartzResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(QuartzError::InvalidArgument(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

fn efficiency(name: &str, value: f64) -> QuartzResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(QuartzError::InvalidArgument(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}

/// Validate a state of charge fraction.
pub fn state_of_charge(name: &str, value: f64) -> QuartzResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(QuartzError::InvalidArgument(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery() -> Battery {
        Battery {
            capacity: 100.0,
            power_limit: 25.0,
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,
            current_charge: 0.5,
        }
    }

    #[test]
    fn test_valid_battery() {
        assert!(battery().validate().is_ok());
        let full = Battery {
            charge_efficiency: 1.0,
            discharge_efficiency: 1.0,
            current_charge: 1.0,
            ..battery()
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn test_out_of_domain_fields() {
        let cases = [
            Battery { capacity: 0.0, ..battery() },
            Battery { power_limit: -5.0, ..battery() },
            Battery { charge_efficiency: 0.0, ..battery() },
            Battery { discharge_efficiency: 1.2, ..battery() },
            Battery { current_charge: 1.01, ..battery() },
            Battery { capacity: f64::NAN, ..battery() },
            Battery { current_charge: f64::NAN, ..battery() },
        ];
        for case in cases {
            assert!(
                matches!(case.validate(), Err(QuartzError::InvalidArgument(_))),
                "{case:?} should be rejected"
            );
        }
    }
}
