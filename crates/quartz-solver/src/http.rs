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

//! HTTP transport for the solver service.
//!
//! The solver exposes one GET endpoint per operation and takes its
//! arguments as query parameters. Policies travel as raw bytes, state of
//! charge values and tier tables as JSON.

use crate::client::{SolverClient, TierTable};
use quartz_types::{
    Battery, DecisionContext, Namespace, PeriodId, PolicyArtifact, PolicyKey, QuartzError,
    QuartzResult,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Solving a bucket takes minutes, not seconds.
pub const DEFAULT_COMPUTE_TIMEOUT: Duration = Duration::from_secs(600);

/// Solver client speaking the query-string HTTP protocol.
#[derive(Clone)]
pub struct HttpSolverClient {
    base_url: String,
    client: Client,
    timeout: Duration,
    compute_timeout: Duration,
}

impl std::fmt::Debug for HttpSolverClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSolverClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("compute_timeout", &self.compute_timeout)
            .finish_non_exhaustive()
    }
}

impl HttpSolverClient {
    pub fn new(base_url: impl Into<String>) -> QuartzResult<Self> {
        Self::with_timeouts(base_url, DEFAULT_TIMEOUT, DEFAULT_COMPUTE_TIMEOUT)
    }

    /// Create a client with custom deadlines.
    ///
    /// `timeout` applies to every call except `compute_policy`, which uses
    /// `compute_timeout`. A call that exceeds its deadline fails with
    /// `ComputeFailed`.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        timeout: Duration,
        compute_timeout: Duration,
    ) -> QuartzResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            QuartzError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;

        let base_url = base_url.into().trim_end_matches('/').to_owned();
        info!("Solver client targeting {}", base_url);

        Ok(Self {
            base_url,
            client,
            timeout,
            compute_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        self.client.get(format!("{}/{endpoint}", self.base_url))
    }

    fn send(&self, op: &'static str, request: RequestBuilder) -> QuartzResult<Response> {
        debug!("Solver request: {}", op);
        request.send().map_err(|e| {
            error!("Solver {} request failed: {}", op, e);
            transport_error(op, &e)
        })
    }

    /// Send and require a 2xx answer.
    fn call(&self, op: &'static str, request: RequestBuilder) -> QuartzResult<Response> {
        let response = self.send(op, request)?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(status_error(op, response))
    }
}

fn transport_error(op: &str, err: &reqwest::Error) -> QuartzError {
    if err.is_timeout() {
        QuartzError::ComputeFailed(format!("{op}: solver did not answer before the deadline"))
    } else {
        QuartzError::ServiceUnavailable(format!("{op}: {err}"))
    }
}

fn status_error(op: &str, response: Response) -> QuartzError {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    error!("Solver {} returned {}: {}", op, status, body);

    let detail = format!("{op}: solver returned {status}: {body}");
    match status {
        StatusCode::NOT_FOUND => QuartzError::NotFound(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            QuartzError::InvalidArgument(detail)
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            QuartzError::ServiceUnavailable(detail)
        }
        _ => QuartzError::ComputeFailed(detail),
    }
}

fn malformed(op: &str, err: &reqwest::Error) -> QuartzError {
    QuartzError::ComputeFailed(format!("{op}: malformed solver response: {err}"))
}

fn key_query(key: &PolicyKey) -> [(&'static str, String); 3] {
    [
        ("price_tier", key.price_tier.to_string()),
        ("season", key.season.code().to_owned()),
        ("day_type", key.day_type.code().to_owned()),
    ]
}

/// The solver keeps one active battery, so policy calls always name theirs.
fn namespace_query(namespace: &Namespace) -> [(&'static str, &str); 2] {
    [
        ("site", namespace.site_id()),
        ("battery", namespace.battery_id()),
    ]
}

impl SolverClient for HttpSolverClient {
    fn set_paths(&self, data_root: &Path, store_root: &Path) -> QuartzResult<()> {
        let request = self.get("set_paths").query(&[
            ("data", data_root.display().to_string()),
            ("store", store_root.display().to_string()),
        ]);
        self.call("set_paths", request)?;
        Ok(())
    }

    fn update_site(&self, site_id: &str) -> QuartzResult<TierTable> {
        let request = self.get("update_site").query(&[("site", site_id)]);
        let table: TierTable = self
            .call("update_site", request)?
            .json()
            .map_err(|e| malformed("update_site", &e))?;
        debug!("Site {} has {} price tiers", site_id, table.len());
        Ok(table)
    }

    fn update_battery(&self, battery_id: &str, battery: &Battery) -> QuartzResult<()> {
        let request = self.get("update_battery").query(&[
            ("id", battery_id.to_owned()),
            ("capacity", battery.capacity.to_string()),
            ("power", battery.power_limit.to_string()),
            ("rc", battery.charge_efficiency.to_string()),
            ("rd", battery.discharge_efficiency.to_string()),
        ]);
        self.call("update_battery", request)?;
        Ok(())
    }

    fn update_period(&self, period_id: PeriodId) -> QuartzResult<()> {
        let request = self
            .get("update_period")
            .query(&[("period", period_id.to_string())]);
        self.call("update_period", request)?;
        Ok(())
    }

    fn compute_policy(
        &self,
        namespace: &Namespace,
        key: &PolicyKey,
    ) -> QuartzResult<PolicyArtifact> {
        let request = self
            .get("compute_policy")
            .query(&namespace_query(namespace))
            .query(&key_query(key))
            .timeout(self.compute_timeout);
        let payload = self
            .call("compute_policy", request)?
            .bytes()
            .map_err(|e| malformed("compute_policy", &e))?;
        if payload.is_empty() {
            return Err(QuartzError::ComputeFailed(format!(
                "compute_policy: solver returned an empty policy for {key}"
            )));
        }
        info!(
            "Solver computed policy {} for {} ({} bytes)",
            key,
            namespace,
            payload.len()
        );
        Ok(PolicyArtifact::new(*key, payload.to_vec()))
    }

    fn load_policy(
        &self,
        namespace: &Namespace,
        key: &PolicyKey,
        path: &Path,
    ) -> QuartzResult<PolicyArtifact> {
        let request = self
            .get("load_policy")
            .query(&namespace_query(namespace))
            .query(&key_query(key))
            .query(&[("path", path.display().to_string())]);
        let response = self.send("load_policy", request)?;

        match response.status() {
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                let reason = response.text().unwrap_or_default();
                return Err(QuartzError::Corrupt {
                    path: path.to_path_buf(),
                    reason,
                });
            }
            status if !status.is_success() => return Err(status_error("load_policy", response)),
            _ => {}
        }

        let payload = response.bytes().map_err(|e| malformed("load_policy", &e))?;
        if payload.is_empty() {
            return Err(QuartzError::Corrupt {
                path: path.to_path_buf(),
                reason: "solver returned an empty policy".to_owned(),
            });
        }
        Ok(PolicyArtifact::new(*key, payload.to_vec()))
    }

    fn get_soc(
        &self,
        namespace: &Namespace,
        artifact: &PolicyArtifact,
        context: &DecisionContext,
    ) -> QuartzResult<f64> {
        let request = self
            .get("compute_soc")
            .query(&namespace_query(namespace))
            .query(&key_query(artifact.key()))
            .query(&[
                ("time_step", context.time_step.to_string()),
                ("current_soc", context.current_soc.to_string()),
                ("forecast_noise_15", context.forecast_noise_15.to_string()),
            ]);
        let soc: f64 = self
            .call("compute_soc", request)?
            .json()
            .map_err(|e| malformed("compute_soc", &e))?;
        Ok(soc)
    }

    fn finish(&self) -> QuartzResult<()> {
        self.call("finish", self.get("finish"))?;
        info!("Solver session finished");
        Ok(())
    }
}
