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

//! Calendar → policy bucket and wall clock → control step.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};
use quartz_types::{DayType, PolicyKey, QuartzError, QuartzResult, STEPS_PER_DAY, Season, TierId};

const MINUTES_PER_STEP: u32 = 15;

/// Season for a calendar month (1-12). October through April is winter.
pub fn season(month: u32) -> QuartzResult<Season> {
    match month {
        1..=4 | 10..=12 => Ok(Season::Winter),
        5..=9 => Ok(Season::Summer),
        _ => Err(QuartzError::Configuration(format!(
            "month must be in 1..=12, got {month}"
        ))),
    }
}

/// Day type for a weekday index counted from Monday = 0.
pub fn day_type(weekday: u32) -> QuartzResult<DayType> {
    match weekday {
        0..=4 => Ok(DayType::Weekday),
        5 | 6 => Ok(DayType::Weekend),
        _ => Err(QuartzError::Configuration(format!(
            "weekday index must be in 0..=6, got {weekday}"
        ))),
    }
}

/// Policy bucket for a moment under the given price tier. Time of day is ignored.
pub fn resolve(timestamp: NaiveDateTime, price_tier: TierId) -> QuartzResult<PolicyKey> {
    let date = timestamp.date();
    Ok(PolicyKey::new(
        price_tier,
        season(date.month())?,
        day_type(date.weekday().num_days_from_monday())?,
    ))
}

/// 1-based quarter-hour index: `4 * hour + minute / 15 + 1`.
pub fn time_step(hour: u32, minute: u32) -> QuartzResult<u8> {
    if hour > 23 || minute > 59 {
        return Err(QuartzError::InvalidArgument(format!(
            "invalid time of day {hour:02}:{minute:02}"
        )));
    }
    #[expect(clippy::integer_division)]
    let step = 4 * hour + minute / MINUTES_PER_STEP + 1;
    let step = u8::try_from(step).map_err(|_| {
        QuartzError::InvalidArgument(format!("time step {step} out of range"))
    })?;
    debug_assert!((1..=STEPS_PER_DAY).contains(&step));
    Ok(step)
}

/// Quarter-hour index of a wall-clock time. Seconds are ignored.
pub fn time_step_of(time: NaiveTime) -> QuartzResult<u8> {
    time_step(time.hour(), time.minute())
}
