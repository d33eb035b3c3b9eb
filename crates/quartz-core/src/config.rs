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

use anyhow::{Context, Result, bail};
use quartz_solver::HttpSolverClient;
use quartz_solver::http::{DEFAULT_BASE_URL, DEFAULT_COMPUTE_TIMEOUT, DEFAULT_TIMEOUT};
use quartz_types::QuartzResult;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuartzConfig {
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub control: ControlSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Deadline for every solver call except policy computation (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Deadline for computing one policy (seconds)
    #[serde(default = "default_compute_timeout_secs")]
    pub compute_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSettings {
    /// Training data shared with the solver
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    /// Root of the policy artifact store
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlSettings {
    /// Clamping a solver answer by more than this is logged as a warning
    #[serde(default = "default_clamp_tolerance")]
    pub clamp_tolerance: f64,
    /// Reject decision calls whose timestamp goes backwards
    #[serde(default = "default_true")]
    pub require_monotonic_time: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_compute_timeout_secs() -> u64 {
    DEFAULT_COMPUTE_TIMEOUT.as_secs()
}

fn default_data_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./policies")
}

fn default_clamp_tolerance() -> f64 {
    1e-6
}

fn default_true() -> bool {
    true
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            compute_timeout_secs: default_compute_timeout_secs(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            store_root: default_store_root(),
        }
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            clamp_tolerance: default_clamp_tolerance(),
            require_monotonic_time: true,
        }
    }
}

impl SolverSettings {
    pub fn build_client(&self) -> QuartzResult<HttpSolverClient> {
        HttpSolverClient::with_timeouts(
            &self.base_url,
            Duration::from_secs(self.timeout_secs),
            Duration::from_secs(self.compute_timeout_secs),
        )
    }
}

impl QuartzConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.solver.base_url.trim().is_empty() {
            bail!("solver.base_url must be set");
        }
        if self.solver.timeout_secs == 0 || self.solver.compute_timeout_secs == 0 {
            bail!("solver timeouts must be at least one second");
        }
        if !(self.control.clamp_tolerance.is_finite() && self.control.clamp_tolerance >= 0.0) {
            bail!("control.clamp_tolerance must be a non-negative number");
        }
        if self.storage.store_root.as_os_str().is_empty() {
            bail!("storage.store_root must be set");
        }
        Ok(())
    }
}
