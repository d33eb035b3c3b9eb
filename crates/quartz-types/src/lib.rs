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

//! Shared types for the Quartz quarter-hour battery controller.
//!
//! Quartz picks a target state of charge every 15 minutes from precomputed
//! decision policies, one per (price tier, season, day type) bucket.

pub mod battery;
pub mod decision;
pub mod error;
pub mod namespace;
pub mod policy;

pub use battery::Battery;
pub use decision::{DecisionContext, STEPS_PER_DAY, StepInput};
pub use error::{QuartzError, QuartzResult};
pub use namespace::{Namespace, validate_id};
pub use policy::{DayType, PeriodId, PolicyArtifact, PolicyKey, Season, TierId};
