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

//! Compute-once policy cache for one battery.

use crate::store::{ArtifactStore, PublishOutcome};
use quartz_solver::SolverClient;
use quartz_types::{Namespace, PolicyArtifact, PolicyKey, QuartzError, QuartzResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Maps policy keys to artifacts, solving each bucket at most once.
///
/// Artifacts are looked up in memory first, then on disk, and only computed
/// by the solver when neither has them. Buckets recur across many days, so
/// after a short warm-up every lookup is a reuse.
#[derive(Debug)]
pub struct PolicyCache {
    store: Arc<ArtifactStore>,
    namespace: Namespace,
    resident: HashMap<PolicyKey, Arc<PolicyArtifact>>,
}

impl PolicyCache {
    pub fn new(store: Arc<ArtifactStore>, namespace: Namespace) -> Self {
        Self {
            store,
            namespace,
            resident: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn resident_len(&self) -> usize {
        self.resident.len()
    }

    pub fn get_or_build<C>(&mut self, solver: &C, key: &PolicyKey) -> QuartzResult<Arc<PolicyArtifact>>
    where
        C: SolverClient + ?Sized,
    {
        if let Some(artifact) = self.resident.get(key) {
            return Ok(Arc::clone(artifact));
        }

        let artifact = match self.load_stored(solver, key)? {
            Some(artifact) => artifact,
            None => self.build(solver, key)?,
        };

        let artifact = Arc::new(artifact);
        self.resident.insert(*key, Arc::clone(&artifact));
        Ok(artifact)
    }

    fn build<C>(&self, solver: &C, key: &PolicyKey) -> QuartzResult<PolicyArtifact>
    where
        C: SolverClient + ?Sized,
    {
        info!("Computing policy {} for {}", key, self.namespace);
        let artifact = solver.compute_policy(&self.namespace, key).inspect_err(|e| {
            error!("Policy computation for {} failed: {}", key, e);
        })?;
        if artifact.key() != key {
            return Err(QuartzError::ComputeFailed(format!(
                "solver answered policy {} for request {key}",
                artifact.key()
            )));
        }

        match self.store.publish(&self.namespace, key, artifact.payload())? {
            PublishOutcome::Published => {
                info!(
                    "Published policy {} to {}",
                    key,
                    self.store.artifact_path(&self.namespace, key).display()
                );
                Ok(artifact)
            }
            PublishOutcome::AlreadyPresent => {
                warn!(
                    "Policy {} was published concurrently, using the stored copy",
                    key
                );
                self.load(solver, key)
            }
        }
    }

    /// Stored artifact for `key`, or `None` when there is none to load.
    ///
    /// A file that vanishes between the existence check and the load (for
    /// instance discarded as corrupt by another process) counts as a miss.
    fn load_stored<C>(&self, solver: &C, key: &PolicyKey) -> QuartzResult<Option<PolicyArtifact>>
    where
        C: SolverClient + ?Sized,
    {
        if !self.store.exists(&self.namespace, key) {
            return Ok(None);
        }
        match self.load(solver, key) {
            Ok(artifact) => Ok(Some(artifact)),
            Err(QuartzError::NotFound(detail)) => {
                warn!("Stored policy {} disappeared ({}), rebuilding", key, detail);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn load<C>(&self, solver: &C, key: &PolicyKey) -> QuartzResult<PolicyArtifact>
    where
        C: SolverClient + ?Sized,
    {
        let path = self.store.artifact_path(&self.namespace, key);
        debug!("Reusing stored policy {}", path.display());

        match solver.load_policy(&self.namespace, key, &path) {
            Ok(artifact) => Ok(artifact),
            Err(e @ QuartzError::Corrupt { .. }) => {
                error!("{}; discarding it so the next lookup rebuilds", e);
                self.store.discard(&self.namespace, key)?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_solver::testing::{ScriptedSolver, SolverCall};
    use quartz_solver::TierTable;
    use quartz_types::{Battery, DayType, DecisionContext, PeriodId, Season, TierId};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn key(tier: u32, day_type: DayType) -> PolicyKey {
        PolicyKey::new(TierId::new(tier).unwrap(), Season::Winter, day_type)
    }

    /// Deletes the artifact right before the wrapped solver reads it, like a
    /// concurrent process discarding it.
    struct DeletedBeforeLoad<'a>(&'a ScriptedSolver);

    impl SolverClient for DeletedBeforeLoad<'_> {
        fn set_paths(&self, data_root: &Path, store_root: &Path) -> QuartzResult<()> {
            self.0.set_paths(data_root, store_root)
        }

        fn update_site(&self, site_id: &str) -> QuartzResult<TierTable> {
            self.0.update_site(site_id)
        }

        fn update_battery(&self, battery_id: &str, battery: &Battery) -> QuartzResult<()> {
            self.0.update_battery(battery_id, battery)
        }

        fn update_period(&self, period_id: PeriodId) -> QuartzResult<()> {
            self.0.update_period(period_id)
        }

        fn compute_policy(
            &self,
            namespace: &Namespace,
            key: &PolicyKey,
        ) -> QuartzResult<PolicyArtifact> {
            self.0.compute_policy(namespace, key)
        }

        fn load_policy(
            &self,
            namespace: &Namespace,
            key: &PolicyKey,
            path: &Path,
        ) -> QuartzResult<PolicyArtifact> {
            fs::remove_file(path)?;
            self.0.load_policy(namespace, key, path)
        }

        fn get_soc(
            &self,
            namespace: &Namespace,
            artifact: &PolicyArtifact,
            context: &DecisionContext,
        ) -> QuartzResult<f64> {
            self.0.get_soc(namespace, artifact, context)
        }
    }

    fn cache(root: &Path) -> PolicyCache {
        let store = Arc::new(ArtifactStore::open(root).unwrap());
        PolicyCache::new(store, Namespace::new("1", "1").unwrap())
    }

    #[test]
    fn test_second_lookup_does_not_recompute() {
        let dir = tempdir().unwrap();
        let solver = ScriptedSolver::new("1", &[&[1], &[2]]);
        let mut cache = cache(dir.path());
        let k = key(1, DayType::Weekday);

        let first = cache.get_or_build(&solver, &k).unwrap();
        let second = cache.get_or_build(&solver, &k).unwrap();

        assert_eq!(solver.compute_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_fresh_cache_reuses_persisted_artifact() {
        let dir = tempdir().unwrap();
        let solver = ScriptedSolver::new("1", &[&[1]]);
        let k = key(1, DayType::Weekend);

        let built = cache(dir.path()).get_or_build(&solver, &k).unwrap();
        let reopened = cache(dir.path()).get_or_build(&solver, &k).unwrap();

        assert_eq!(solver.compute_count(), 1);
        assert_eq!(solver.load_count(), 1);
        assert_eq!(built.payload(), reopened.payload());

        let context = DecisionContext::new(30, 0.6, -0.4).unwrap();
        let ns = Namespace::new("1", "1").unwrap();
        let a = solver.get_soc(&ns, &built, &context).unwrap();
        let b = solver.get_soc(&ns, &reopened, &context).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_distinct_keys_are_built_separately() {
        let dir = tempdir().unwrap();
        let solver = ScriptedSolver::new("1", &[&[1], &[2]]);
        let mut cache = cache(dir.path());

        cache.get_or_build(&solver, &key(1, DayType::Weekday)).unwrap();
        cache.get_or_build(&solver, &key(1, DayType::Weekend)).unwrap();
        cache.get_or_build(&solver, &key(2, DayType::Weekday)).unwrap();

        assert_eq!(solver.compute_count(), 3);
        assert_eq!(cache.resident_len(), 3);
    }

    #[test]
    fn test_failed_compute_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let solver = ScriptedSolver::new("1", &[&[1]]);
        let mut cache = cache(dir.path());
        let k = key(1, DayType::Weekday);

        solver.set_fail_compute(true);
        let result = cache.get_or_build(&solver, &k);
        assert!(matches!(result, Err(QuartzError::ComputeFailed(_))));
        assert!(!cache.store.exists(&cache.namespace, &k));
        assert_eq!(cache.resident_len(), 0);

        solver.set_fail_compute(false);
        cache.get_or_build(&solver, &k).unwrap();
        assert_eq!(solver.compute_count(), 2);
    }

    #[test]
    fn test_unavailable_solver_propagates() {
        let dir = tempdir().unwrap();
        let solver = ScriptedSolver::new("1", &[&[1]]);
        let mut cache = cache(dir.path());

        solver.set_unavailable(true);
        let result = cache.get_or_build(&solver, &key(1, DayType::Weekday));
        assert!(matches!(result, Err(QuartzError::ServiceUnavailable(_))));
    }

    #[test]
    fn test_corrupt_artifact_is_discarded_and_rebuilt() {
        let dir = tempdir().unwrap();
        let solver = ScriptedSolver::new("1", &[&[1]]);
        let mut cache = cache(dir.path());
        let k = key(1, DayType::Weekday);

        let path = cache.store.artifact_path(&cache.namespace, &k);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{ truncated").unwrap();

        let result = cache.get_or_build(&solver, &k);
        assert!(matches!(result, Err(QuartzError::Corrupt { .. })));
        assert!(!path.exists());

        cache.get_or_build(&solver, &k).unwrap();
        assert_eq!(solver.compute_count(), 1);
        assert!(path.exists());
    }

    #[test]
    fn test_artifact_vanishing_before_load_is_rebuilt() {
        let dir = tempdir().unwrap();
        let solver = ScriptedSolver::new("1", &[&[1]]);
        let k = key(1, DayType::Weekend);

        cache(dir.path()).get_or_build(&solver, &k).unwrap();
        assert_eq!(solver.compute_count(), 1);

        let mut fresh = cache(dir.path());
        let artifact = fresh
            .get_or_build(&DeletedBeforeLoad(&solver), &k)
            .unwrap();

        assert_eq!(artifact.key(), &k);
        assert_eq!(solver.load_count(), 1);
        assert_eq!(solver.compute_count(), 2);
        assert!(fresh.store.exists(fresh.namespace(), &k));
    }

    #[test]
    fn test_lost_race_uses_stored_copy() {
        let dir = tempdir().unwrap();
        let solver = ScriptedSolver::new("1", &[&[1]]);
        let k = key(1, DayType::Weekday);

        // Another process publishes between our existence check and our publish
        let mut ours = cache(dir.path());
        let winner = solver.compute_policy(&ours.namespace, &k).unwrap();
        let outcome = ours
            .store
            .publish(&ours.namespace, &k, winner.payload())
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Published);

        let artifact = ours.build(&solver, &k).unwrap();
        assert_eq!(artifact.payload(), winner.payload());
        assert!(solver
            .calls()
            .iter()
            .any(|call| matches!(call, SolverCall::LoadPolicy(..))));

        ours.get_or_build(&solver, &k).unwrap();
        assert_eq!(solver.load_count(), 2);
    }
}
