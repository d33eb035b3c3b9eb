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

//! Price-period classification.
//!
//! A site's tariff groups its billing periods into price tiers. The table
//! arrives once per site as an ordered list of period lists; tier numbers are
//! the 1-based list positions.

use quartz_types::{PeriodId, QuartzError, QuartzResult, TierId};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PriceTierClassifier {
    tiers: HashMap<PeriodId, TierId>,
    tier_count: usize,
}

impl PriceTierClassifier {
    /// Build the period → tier map, rejecting periods listed in more than one tier.
    pub fn new(table: &[Vec<PeriodId>]) -> QuartzResult<Self> {
        let mut tiers = HashMap::new();
        for (index, periods) in table.iter().enumerate() {
            let tier = TierId::from_index(index);
            for &period in periods {
                if let Some(previous) = tiers.insert(period, tier) {
                    return Err(QuartzError::Configuration(format!(
                        "period {period} is listed in both tier {previous} and tier {tier}"
                    )));
                }
            }
        }

        Ok(Self {
            tiers,
            tier_count: table.len(),
        })
    }

    pub fn tier_of(&self, period: PeriodId) -> QuartzResult<TierId> {
        self.tiers.get(&period).copied().ok_or_else(|| {
            QuartzError::Configuration(format!("period {period} is not in any price tier"))
        })
    }

    pub fn tier_count(&self) -> usize {
        self.tier_count
    }

    pub fn period_count(&self) -> usize {
        self.tiers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(tiers: &[&[u32]]) -> Vec<Vec<PeriodId>> {
        tiers
            .iter()
            .map(|t| t.iter().copied().map(PeriodId).collect())
            .collect()
    }

    #[test]
    fn test_period_maps_to_one_based_tier() {
        let classifier = PriceTierClassifier::new(&table(&[&[1, 2, 3], &[4, 5, 6]])).unwrap();

        assert_eq!(classifier.tier_of(PeriodId(5)).unwrap().to_string(), "2");
        assert_eq!(classifier.tier_of(PeriodId(1)).unwrap().number(), 1);
        assert_eq!(classifier.tier_count(), 2);
        assert_eq!(classifier.period_count(), 6);
    }

    #[test]
    fn test_unmapped_period_is_configuration_error() {
        let classifier = PriceTierClassifier::new(&table(&[&[1, 2], &[3]])).unwrap();
        let err = classifier.tier_of(PeriodId(9)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_duplicate_period_rejected_eagerly() {
        let result = PriceTierClassifier::new(&table(&[&[1, 2], &[2, 3]]));
        assert!(matches!(result, Err(QuartzError::Configuration(_))));
    }

    #[test]
    fn test_empty_tier_keeps_numbering() {
        let classifier = PriceTierClassifier::new(&table(&[&[], &[7]])).unwrap();
        assert_eq!(classifier.tier_of(PeriodId(7)).unwrap().number(), 2);
    }
}
