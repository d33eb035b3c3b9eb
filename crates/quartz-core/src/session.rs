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

//! Explicit per-battery session state.
//!
//! Setup calls fill the session in order (site, battery, period); each step
//! clears everything that depends on it.

use crate::tiers::PriceTierClassifier;
use chrono::NaiveDateTime;
use quartz_types::{PeriodId, QuartzError, QuartzResult, TierId};

#[derive(Debug, Clone)]
pub struct SiteContext {
    pub site_id: String,
    pub classifier: PriceTierClassifier,
}

#[derive(Debug, Clone)]
pub struct BatteryContext {
    pub battery_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodState {
    pub period_id: PeriodId,
    pub price_tier: TierId,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    site: Option<SiteContext>,
    battery: Option<BatteryContext>,
    period: Option<PeriodState>,
    last_timestamp: Option<NaiveDateTime>,
}

impl SessionState {
    pub fn site(&self) -> QuartzResult<&SiteContext> {
        self.site.as_ref().ok_or(QuartzError::NotReady("no site selected"))
    }

    pub fn battery(&self) -> QuartzResult<&BatteryContext> {
        self.battery
            .as_ref()
            .ok_or(QuartzError::NotReady("no battery configured"))
    }

    pub fn period(&self) -> QuartzResult<&PeriodState> {
        self.period
            .as_ref()
            .ok_or(QuartzError::NotReady("no period started"))
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.last_timestamp
    }

    pub(crate) fn set_site(&mut self, site: SiteContext) {
        *self = Self {
            site: Some(site),
            ..Self::default()
        };
    }

    pub(crate) fn set_battery(&mut self, battery: BatteryContext) {
        self.battery = Some(battery);
        self.period = None;
        self.last_timestamp = None;
    }

    pub(crate) fn set_period(&mut self, period: PeriodState) {
        self.period = Some(period);
        self.last_timestamp = None;
    }

    pub(crate) fn record_step(&mut self, timestamp: NaiveDateTime) {
        self.last_timestamp = Some(timestamp);
    }

    pub(crate) fn end_period(&mut self) {
        self.period = None;
        self.last_timestamp = None;
    }
}
