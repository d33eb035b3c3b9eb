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

//! Per-step decision engine.
//!
//! One engine drives one battery session. Setup happens in order:
//! `set_site` → `set_battery` → `set_period`. After that,
//! `propose_state_of_charge` is called once per quarter-hour with
//! non-decreasing timestamps.
//!
//! The engine is `Idle` until the first decision of a period, when it
//! resolves the day's policy bucket and obtains its artifact
//! (`BucketActive`). The artifact is reused until the date changes.

use crate::cache::PolicyCache;
use crate::config::{ControlSettings, QuartzConfig, StorageSettings};
use crate::resolver;
use crate::session::{BatteryContext, PeriodState, SessionState, SiteContext};
use crate::store::ArtifactStore;
use crate::tiers::PriceTierClassifier;
use chrono::{NaiveDate, NaiveDateTime};
use quartz_solver::{HttpSolverClient, SolverClient};
use quartz_types::{
    Battery, DecisionContext, Namespace, PeriodId, PolicyArtifact, PolicyKey, QuartzError,
    QuartzResult, StepInput, TierId, validate_id,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The policy in force for the current day.
#[derive(Debug, Clone)]
pub struct ActiveBucket {
    pub key: PolicyKey,
    pub day: NaiveDate,
    pub artifact: Arc<PolicyArtifact>,
}

#[derive(Debug, Clone, Default)]
pub enum EnginePhase {
    #[default]
    Idle,
    BucketActive(ActiveBucket),
}

#[derive(Debug)]
pub struct DecisionEngine<C: SolverClient> {
    solver: C,
    store: Arc<ArtifactStore>,
    control: ControlSettings,
    session: SessionState,
    cache: Option<PolicyCache>,
    phase: EnginePhase,
}

impl DecisionEngine<HttpSolverClient> {
    /// Engine talking to the HTTP solver described by `config`.
    pub fn from_config(config: &QuartzConfig) -> QuartzResult<Self> {
        let solver = config.solver.build_client()?;
        Self::new(solver, &config.storage, config.control.clone())
    }
}

impl<C: SolverClient> DecisionEngine<C> {
    /// Open the policy store and register the data and store roots with the solver.
    pub fn new(solver: C, storage: &StorageSettings, control: ControlSettings) -> QuartzResult<Self> {
        let store = Arc::new(ArtifactStore::open(&storage.store_root)?);
        Self::with_store(solver, store, &storage.data_root, control)
    }

    /// Like [`DecisionEngine::new`], sharing a store with other sessions.
    pub fn with_store(
        solver: C,
        store: Arc<ArtifactStore>,
        data_root: &Path,
        control: ControlSettings,
    ) -> QuartzResult<Self> {
        solver.set_paths(data_root, store.root())?;
        Ok(Self {
            solver,
            store,
            control,
            session: SessionState::default(),
            cache: None,
            phase: EnginePhase::Idle,
        })
    }

    pub fn set_site(&mut self, site_id: &str) -> QuartzResult<()> {
        validate_id("site id", site_id)?;
        let table = self.solver.update_site(site_id)?;
        let classifier = PriceTierClassifier::new(&table)?;
        self.store.ensure_site(site_id)?;

        info!(
            "Site {} selected: {} price tiers, {} periods",
            site_id,
            classifier.tier_count(),
            classifier.period_count()
        );

        self.session.set_site(SiteContext {
            site_id: site_id.to_owned(),
            classifier,
        });
        self.cache = None;
        self.phase = EnginePhase::Idle;
        Ok(())
    }

    pub fn set_battery(&mut self, battery: &Battery, battery_id: &str) -> QuartzResult<()> {
        let namespace = Namespace::new(&self.session.site()?.site_id, battery_id)?;
        battery.validate()?;
        self.solver.update_battery(battery_id, battery)?;
        self.store.ensure_namespace(&namespace)?;

        info!(
            "Battery {} configured: {} kWh, {} kW, efficiency {}/{}",
            battery_id,
            battery.capacity,
            battery.power_limit,
            battery.charge_efficiency,
            battery.discharge_efficiency
        );

        self.cache = Some(PolicyCache::new(Arc::clone(&self.store), namespace));
        self.session.set_battery(BatteryContext {
            battery_id: battery_id.to_owned(),
        });
        self.phase = EnginePhase::Idle;
        Ok(())
    }

    /// Start a billing period. The next decision resolves a fresh bucket.
    pub fn set_period(&mut self, period_id: PeriodId) -> QuartzResult<()> {
        self.session.battery()?;
        let price_tier = self.session.site()?.classifier.tier_of(period_id)?;
        self.solver.update_period(period_id)?;

        info!("Period {} started in price tier {}", period_id, price_tier);
        self.session.set_period(PeriodState {
            period_id,
            price_tier,
        });
        self.phase = EnginePhase::Idle;
        Ok(())
    }

    /// Target state of charge, in [0, 1], for the end of the coming quarter.
    pub fn propose_state_of_charge(&mut self, input: &StepInput<'_>) -> QuartzResult<f64> {
        let period = *self.session.period()?;

        if self.control.require_monotonic_time
            && let Some(last) = self.session.last_timestamp()
            && input.timestamp < last
        {
            return Err(QuartzError::InvalidArgument(format!(
                "decision at {} is earlier than the previous one at {last}",
                input.timestamp
            )));
        }

        let context = DecisionContext::new(
            resolver::time_step_of(input.timestamp.time())?,
            input.battery.current_charge,
            input.forecast_noise_15()?,
        )?;

        let artifact = self.active_artifact(input.timestamp, period.price_tier)?;
        let namespace = self.namespace()?;
        let raw = self.solver.get_soc(namespace, &artifact, &context)?;
        let target = self.clamp_target(raw, artifact.key())?;

        debug!(
            "Step {} ({}): soc {:.3} noise {:.3} -> target {:.3}",
            context.time_step,
            artifact.key(),
            context.current_soc,
            context.forecast_noise_15,
            target
        );

        self.session.record_step(input.timestamp);
        Ok(target)
    }

    /// End the solver session. Setup must start again from `set_period`.
    pub fn finish(&mut self) -> QuartzResult<()> {
        self.solver.finish()?;
        self.session.end_period();
        self.phase = EnginePhase::Idle;
        Ok(())
    }

    pub fn solver(&self) -> &C {
        &self.solver
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn phase(&self) -> &EnginePhase {
        &self.phase
    }

    pub fn active_key(&self) -> Option<&PolicyKey> {
        match &self.phase {
            EnginePhase::BucketActive(active) => Some(&active.key),
            EnginePhase::Idle => None,
        }
    }

    pub fn cache(&self) -> Option<&PolicyCache> {
        self.cache.as_ref()
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    fn namespace(&self) -> QuartzResult<&Namespace> {
        self.cache
            .as_ref()
            .map(PolicyCache::namespace)
            .ok_or(QuartzError::NotReady("no battery configured"))
    }

    fn active_artifact(
        &mut self,
        timestamp: NaiveDateTime,
        price_tier: TierId,
    ) -> QuartzResult<Arc<PolicyArtifact>> {
        let day = timestamp.date();
        if let EnginePhase::BucketActive(active) = &self.phase
            && active.day == day
        {
            return Ok(Arc::clone(&active.artifact));
        }

        let key = resolver::resolve(timestamp, price_tier)?;
        let cache = self
            .cache
            .as_mut()
            .ok_or(QuartzError::NotReady("no battery configured"))?;
        let artifact = cache.get_or_build(&self.solver, &key)?;

        info!("Policy {} active for {} on {}", key, cache.namespace(), day);
        self.phase = EnginePhase::BucketActive(ActiveBucket {
            key,
            day,
            artifact: Arc::clone(&artifact),
        });
        Ok(artifact)
    }

    fn clamp_target(&self, raw: f64, key: &PolicyKey) -> QuartzResult<f64> {
        if !raw.is_finite() {
            return Err(QuartzError::ComputeFailed(format!(
                "solver returned non-finite target {raw} for policy {key}"
            )));
        }
        let target = raw.clamp(0.0, 1.0);
        if (raw - target).abs() > self.control.clamp_tolerance {
            warn!(
                "Solver target {} for policy {} is outside [0, 1], clamped to {}",
                raw, key, target
            );
        }
        Ok(target)
    }
}
