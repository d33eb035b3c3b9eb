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

//! Quartz core: policy cache and decision engine.
//!
//! ## Flow per control step
//!
//! 1. [`resolver`] maps the date and active price tier to a [`PolicyKey`]
//! 2. [`PolicyCache`] returns the bucket's artifact, computing and
//!    publishing it through [`ArtifactStore`] only the first time
//! 3. [`DecisionEngine`] derives the quarter-hour step and forecast noise
//!    and asks the solver for a target state of charge, clamped to [0, 1]
//!
//! [`PolicyKey`]: quartz_types::PolicyKey

pub mod cache;
pub mod config;
pub mod engine;
pub mod resolver;
pub mod session;
pub mod store;
pub mod tiers;

pub use cache::PolicyCache;
pub use config::{ControlSettings, QuartzConfig, SolverSettings, StorageSettings};
pub use engine::{ActiveBucket, DecisionEngine, EnginePhase};
pub use resolver::{day_type, resolve, season, time_step, time_step_of};
pub use session::{BatteryContext, PeriodState, SessionState, SiteContext};
pub use store::{ArtifactStore, PublishOutcome};
pub use tiers::PriceTierClassifier;
