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

//! Policy bucket identifiers and the artifacts they address.

use crate::error::{QuartzError, QuartzResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a fixed-price interval (billing period).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(pub u32);

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PeriodId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// 1-based price tier, numbered by position in the site's tier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TierId(u32);

impl TierId {
    /// Tier for the list at `index` (0-based) in a tier table.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(1)))
    }

    pub fn new(number: u32) -> QuartzResult<Self> {
        if number == 0 {
            return Err(QuartzError::InvalidArgument(
                "price tiers are numbered from 1".to_owned(),
            ));
        }
        Ok(Self(number))
    }

    #[must_use]
    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TierId {
    type Err = QuartzError;

    fn from_str(s: &str) -> QuartzResult<Self> {
        let number = s
            .parse::<u32>()
            .map_err(|_| QuartzError::InvalidArgument(format!("invalid price tier '{s}'")))?;
        Self::new(number)
    }
}

impl From<TierId> for String {
    fn from(tier: TierId) -> Self {
        tier.to_string()
    }
}

impl TryFrom<String> for TierId {
    type Error = QuartzError;

    fn try_from(value: String) -> QuartzResult<Self> {
        value.parse()
    }
}

/// Tariff season. May through September is summer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "w")]
    Winter,
    #[serde(rename = "s")]
    Summer,
}

impl Season {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Winter => "w",
            Self::Summer => "s",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Season {
    type Err = QuartzError;

    fn from_str(s: &str) -> QuartzResult<Self> {
        match s {
            "w" => Ok(Self::Winter),
            "s" => Ok(Self::Summer),
            other => Err(QuartzError::InvalidArgument(format!(
                "unknown season code '{other}', expected 'w' or 's'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Weekday => "weekday",
            Self::Weekend => "weekend",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DayType {
    type Err = QuartzError;

    fn from_str(s: &str) -> QuartzResult<Self> {
        match s {
            "weekday" => Ok(Self::Weekday),
            "weekend" => Ok(Self::Weekend),
            other => Err(QuartzError::InvalidArgument(format!(
                "unknown day type '{other}', expected 'weekday' or 'weekend'"
            ))),
        }
    }
}

/// Address of one reusable decision policy: (price tier, season, day type).
///
/// The textual encoding (`2_s_weekday`) is stable and is used as the artifact
/// file stem, so changing it orphans every persisted policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyKey {
    pub price_tier: TierId,
    pub season: Season,
    pub day_type: DayType,
}

impl PolicyKey {
    #[must_use]
    pub fn new(price_tier: TierId, season: Season, day_type: DayType) -> Self {
        Self {
            price_tier,
            season,
            day_type,
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}_{}_{}", self.price_tier, self.season, self.day_type)
    }
}

impl fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for PolicyKey {
    type Err = QuartzError;

    fn from_str(s: &str) -> QuartzResult<Self> {
        let mut parts = s.splitn(3, '_');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(tier), Some(season), Some(day_type)) => Ok(Self {
                price_tier: tier.parse()?,
                season: season.parse()?,
                day_type: day_type.parse()?,
            }),
            _ => Err(QuartzError::InvalidArgument(format!(
                "malformed policy key '{s}'"
            ))),
        }
    }
}

/// Solver-produced decision table for one bucket.
///
/// The payload is opaque to Quartz: it is persisted and handed back to the
/// solver byte for byte.
#[derive(Clone, PartialEq, Eq)]
pub struct PolicyArtifact {
    key: PolicyKey,
    payload: Vec<u8>,
}

impl PolicyArtifact {
    #[must_use]
    pub fn new(key: PolicyKey, payload: Vec<u8>) -> Self {
        Self { key, payload }
    }

    #[must_use]
    pub fn key(&self) -> &PolicyKey {
        &self.key
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl fmt::Debug for PolicyArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyArtifact")
            .field("key", &self.key)
            .field("payload_bytes", &self.payload.len())
            .finish()
    }
}
