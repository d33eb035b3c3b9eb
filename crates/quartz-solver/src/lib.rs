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

//! Quartz solver client.
//!
//! The numeric solver that turns historical load/PV data into a decision
//! policy runs as a separate service. This crate defines the port Quartz
//! talks to it through and the HTTP transport for it.
//!
//! ## Operations
//!
//! - `set_paths`: tell the solver where training data and policies live
//! - `update_site` / `update_battery` / `update_period`: session setup
//! - `compute_policy` / `load_policy`: obtain a policy artifact for a bucket
//! - `get_soc`: look up the target state of charge for one control step
//! - `finish`: end the session

pub mod client;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{SolverClient, TierTable};
pub use http::HttpSolverClient;
