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

//! Per-step decision inputs.

use crate::battery::{Battery, state_of_charge};
use crate::error::{QuartzError, QuartzResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Number of quarter-hour control intervals in a day.
pub const STEPS_PER_DAY: u8 = 96;

/// Everything the caller knows at the start of a control interval.
///
/// Price and forecast sequences cover the next 96 quarters. Only the first
/// forecast entries drive the policy lookup; the rest is accepted so callers
/// can pass their full step data unchanged.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    /// Local wall-clock time at the start of the interval
    pub timestamp: NaiveDateTime,
    pub battery: &'a Battery,
    /// Load over the previous quarter (kWh)
    pub actual_previous_load: f64,
    /// PV production over the previous quarter (kWh)
    pub actual_previous_pv_production: f64,
    pub price_buy: &'a [f64],
    pub price_sell: &'a [f64],
    pub load_forecast: &'a [f64],
    pub pv_forecast: &'a [f64],
}

impl StepInput<'_> {
    /// Net demand forecast for the coming quarter (load minus PV).
    pub fn forecast_noise_15(&self) -> QuartzResult<f64> {
        let load = next_quarter("load_forecast", self.load_forecast)?;
        let pv = next_quarter("pv_forecast", self.pv_forecast)?;
        Ok(load - pv)
    }
}

fn next_quarter(name: &str, series: &[f64]) -> QuartzResult<f64> {
    match series.first() {
        Some(value) if value.is_finite() => Ok(*value),
        Some(value) => Err(QuartzError::InvalidArgument(format!(
            "{name}[0] must be finite, got {value}"
        ))),
        None => Err(QuartzError::InvalidArgument(format!("{name} is empty"))),
    }
}

/// The three values a policy lookup needs for one control step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Quarter of the day, 1..=96
    pub time_step: u8,
    pub current_soc: f64,
    pub forecast_noise_15: f64,
}

impl DecisionContext {
    pub fn new(time_step: u8, current_soc: f64, forecast_noise_15: f64) -> QuartzResult<Self> {
        if !(1..=STEPS_PER_DAY).contains(&time_step) {
            return Err(QuartzError::InvalidArgument(format!(
                "time_step must be in [1, {STEPS_PER_DAY}], got {time_step}"
            )));
        }
        state_of_charge("current_soc", current_soc)?;
        if !forecast_noise_15.is_finite() {
            return Err(QuartzError::InvalidArgument(format!(
                "forecast_noise_15 must be finite, got {forecast_noise_15}"
            )));
        }
        Ok(Self {
            time_step,
            current_soc,
            forecast_noise_15,
        })
    }
}
