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

//! In-process scripted solver for tests.
//!
//! `ScriptedSolver` records every call and answers deterministically. Its
//! policy payload is a small JSON document, so persisted artifacts can be
//! reopened from disk the same way a real solver would.

use crate::client::{SolverClient, TierTable};
use parking_lot::Mutex;
use quartz_types::{
    Battery, DecisionContext, Namespace, PeriodId, PolicyArtifact, PolicyKey, QuartzError,
    QuartzResult,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// One recorded solver call.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverCall {
    SetPaths { data_root: PathBuf, store_root: PathBuf },
    UpdateSite(String),
    UpdateBattery(String),
    UpdatePeriod(PeriodId),
    ComputePolicy(Namespace, PolicyKey),
    LoadPolicy(Namespace, PolicyKey, PathBuf),
    GetSoc(Namespace, PolicyKey, DecisionContext),
    Finish,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScriptedTable {
    site_id: String,
    battery_id: String,
    key: PolicyKey,
    base_soc: f64,
}

impl ScriptedTable {
    fn belongs_to(&self, namespace: &Namespace) -> bool {
        self.site_id == namespace.site_id() && self.battery_id == namespace.battery_id()
    }
}

#[derive(Debug)]
pub struct ScriptedSolver {
    site_id: String,
    tiers: TierTable,
    soc_override: Mutex<Option<f64>>,
    unavailable: AtomicBool,
    fail_compute: AtomicBool,
    calls: Mutex<Vec<SolverCall>>,
}

impl ScriptedSolver {
    /// Solver that knows a single site with the given tier table.
    pub fn new(site_id: &str, tiers: &[&[u32]]) -> Self {
        Self {
            site_id: site_id.to_owned(),
            tiers: tiers
                .iter()
                .map(|tier| tier.iter().copied().map(PeriodId).collect())
                .collect(),
            soc_override: Mutex::new(None),
            unavailable: AtomicBool::new(false),
            fail_compute: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make `get_soc` answer `value` regardless of inputs.
    pub fn answer_soc(&self, value: f64) {
        *self.soc_override.lock() = Some(value);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_fail_compute(&self, fail: bool) {
        self.fail_compute.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SolverCall> {
        self.calls.lock().clone()
    }

    pub fn compute_count(&self) -> usize {
        self.count(|call| matches!(call, SolverCall::ComputePolicy(..)))
    }

    pub fn load_count(&self) -> usize {
        self.count(|call| matches!(call, SolverCall::LoadPolicy(..)))
    }

    pub fn count(&self, predicate: impl Fn(&SolverCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    /// Deterministic lookup the scripted policies implement.
    pub fn expected_soc(key: &PolicyKey, context: &DecisionContext) -> f64 {
        lookup(base_soc(key), context)
    }

    fn record(&self, call: SolverCall) -> QuartzResult<()> {
        self.calls.lock().push(call);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QuartzError::ServiceUnavailable(
                "scripted solver is offline".to_owned(),
            ));
        }
        Ok(())
    }
}

fn base_soc(key: &PolicyKey) -> f64 {
    f64::from(key.price_tier.number()) * 0.1
}

fn lookup(base_soc: f64, context: &DecisionContext) -> f64 {
    base_soc + f64::from(context.time_step) * 0.001 - context.forecast_noise_15 * 0.01
        + context.current_soc * 0.1
}

fn decode(payload: &[u8]) -> Result<ScriptedTable, serde_json::Error> {
    serde_json::from_slice(payload)
}

impl SolverClient for ScriptedSolver {
    fn set_paths(&self, data_root: &Path, store_root: &Path) -> QuartzResult<()> {
        self.record(SolverCall::SetPaths {
            data_root: data_root.to_path_buf(),
            store_root: store_root.to_path_buf(),
        })
    }

    fn update_site(&self, site_id: &str) -> QuartzResult<TierTable> {
        self.record(SolverCall::UpdateSite(site_id.to_owned()))?;
        if site_id != self.site_id {
            return Err(QuartzError::NotFound(format!("site {site_id}")));
        }
        Ok(self.tiers.clone())
    }

    fn update_battery(&self, battery_id: &str, battery: &Battery) -> QuartzResult<()> {
        self.record(SolverCall::UpdateBattery(battery_id.to_owned()))?;
        battery.validate()
    }

    fn update_period(&self, period_id: PeriodId) -> QuartzResult<()> {
        self.record(SolverCall::UpdatePeriod(period_id))
    }

    fn compute_policy(
        &self,
        namespace: &Namespace,
        key: &PolicyKey,
    ) -> QuartzResult<PolicyArtifact> {
        self.record(SolverCall::ComputePolicy(namespace.clone(), *key))?;
        if self.fail_compute.load(Ordering::SeqCst) {
            return Err(QuartzError::ComputeFailed(format!(
                "scripted failure for {key}"
            )));
        }
        let table = ScriptedTable {
            site_id: namespace.site_id().to_owned(),
            battery_id: namespace.battery_id().to_owned(),
            key: *key,
            base_soc: base_soc(key),
        };
        let payload = serde_json::to_vec(&table)
            .map_err(|e| QuartzError::ComputeFailed(e.to_string()))?;
        Ok(PolicyArtifact::new(*key, payload))
    }

    fn load_policy(
        &self,
        namespace: &Namespace,
        key: &PolicyKey,
        path: &Path,
    ) -> QuartzResult<PolicyArtifact> {
        self.record(SolverCall::LoadPolicy(
            namespace.clone(),
            *key,
            path.to_path_buf(),
        ))?;
        let payload = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => QuartzError::NotFound(path.display().to_string()),
            _ => QuartzError::Io(e),
        })?;
        let table = decode(&payload).map_err(|e| QuartzError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if table.key != *key || !table.belongs_to(namespace) {
            return Err(QuartzError::Corrupt {
                path: path.to_path_buf(),
                reason: format!(
                    "file holds policy {} of site {} battery {}, expected {key} of {namespace}",
                    table.key, table.site_id, table.battery_id
                ),
            });
        }
        Ok(PolicyArtifact::new(*key, payload))
    }

    fn get_soc(
        &self,
        namespace: &Namespace,
        artifact: &PolicyArtifact,
        context: &DecisionContext,
    ) -> QuartzResult<f64> {
        self.record(SolverCall::GetSoc(
            namespace.clone(),
            *artifact.key(),
            *context,
        ))?;
        if let Some(value) = *self.soc_override.lock() {
            return Ok(value);
        }
        let table = decode(artifact.payload()).map_err(|e| {
            QuartzError::InvalidArgument(format!("not a scripted policy: {e}"))
        })?;
        if !table.belongs_to(namespace) {
            return Err(QuartzError::InvalidArgument(format!(
                "policy of site {} battery {} queried for {namespace}",
                table.site_id, table.battery_id
            )));
        }
        Ok(lookup(table.base_soc, context))
    }

    fn finish(&self) -> QuartzResult<()> {
        self.record(SolverCall::Finish)
    }
}
