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

use quartz_types::{
    Battery, DecisionContext, Namespace, PeriodId, PolicyArtifact, PolicyKey, QuartzResult,
};
use std::path::Path;
use std::sync::Arc;

/// Ordered tier table: the list at index `i` holds the periods of tier `i + 1`.
pub type TierTable = Vec<Vec<PeriodId>>;

/// Synchronous request/response port to the policy solver.
///
/// Calls block until the solver answers; a control interval is minutes long,
/// so a round trip per step is acceptable.
pub trait SolverClient: Send + Sync {
    /// Register the training data root and the policy store root.
    fn set_paths(&self, data_root: &Path, store_root: &Path) -> QuartzResult<()>;

    /// Select a site and return its price tier table.
    fn update_site(&self, site_id: &str) -> QuartzResult<TierTable>;

    fn update_battery(&self, battery_id: &str, battery: &Battery) -> QuartzResult<()>;

    fn update_period(&self, period_id: PeriodId) -> QuartzResult<()>;

    /// Solve the policy for one bucket of one battery. This is the expensive call.
    ///
    /// Policy calls name their namespace explicitly, so several sessions may
    /// share one solver without seeing each other's battery.
    fn compute_policy(
        &self,
        namespace: &Namespace,
        key: &PolicyKey,
    ) -> QuartzResult<PolicyArtifact>;

    /// Reopen a previously published policy.
    fn load_policy(
        &self,
        namespace: &Namespace,
        key: &PolicyKey,
        path: &Path,
    ) -> QuartzResult<PolicyArtifact>;

    /// Target state of charge for the end of the coming quarter.
    fn get_soc(
        &self,
        namespace: &Namespace,
        artifact: &PolicyArtifact,
        context: &DecisionContext,
    ) -> QuartzResult<f64>;

    fn finish(&self) -> QuartzResult<()> {
        Ok(())
    }
}

impl<T: SolverClient + ?Sized> SolverClient for Arc<T> {
    fn set_paths(&self, data_root: &Path, store_root: &Path) -> QuartzResult<()> {
        (**self).set_paths(data_root, store_root)
    }

    fn update_site(&self, site_id: &str) -> QuartzResult<TierTable> {
        (**self).update_site(site_id)
    }

    fn update_battery(&self, battery_id: &str, battery: &Battery) -> QuartzResult<()> {
        (**self).update_battery(battery_id, battery)
    }

    fn update_period(&self, period_id: PeriodId) -> QuartzResult<()> {
        (**self).update_period(period_id)
    }

    fn compute_policy(
        &self,
        namespace: &Namespace,
        key: &PolicyKey,
    ) -> QuartzResult<PolicyArtifact> {
        (**self).compute_policy(namespace, key)
    }

    fn load_policy(
        &self,
        namespace: &Namespace,
        key: &PolicyKey,
        path: &Path,
    ) -> QuartzResult<PolicyArtifact> {
        (**self).load_policy(namespace, key, path)
    }

    fn get_soc(
        &self,
        namespace: &Namespace,
        artifact: &PolicyArtifact,
        context: &DecisionContext,
    ) -> QuartzResult<f64> {
        (**self).get_soc(namespace, artifact, context)
    }

    fn finish(&self) -> QuartzResult<()> {
        (**self).finish()
    }
}
