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

//! Site and battery scoping of stored policies.

use crate::error::{QuartzError, QuartzResult};

/// One battery at one site. Policies are computed, stored and queried
/// per namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    site_id: String,
    battery_id: String,
}

impl Namespace {
    pub fn new(site_id: &str, battery_id: &str) -> QuartzResult<Self> {
        validate_id("site id", site_id)?;
        validate_id("battery id", battery_id)?;
        Ok(Self {
            site_id: site_id.to_owned(),
            battery_id: battery_id.to_owned(),
        })
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn battery_id(&self) -> &str {
        &self.battery_id
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "site {} battery {}", self.site_id, self.battery_id)
    }
}

/// Ids become directory names, so they must be a single plain path component.
pub fn validate_id(what: &str, id: &str) -> QuartzResult<()> {
    let plain = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if plain {
        Ok(())
    } else {
        Err(QuartzError::InvalidArgument(format!(
            "{what} '{id}' must be non-empty and use only letters, digits, '-', '_' or '.'"
        )))
    }
}
