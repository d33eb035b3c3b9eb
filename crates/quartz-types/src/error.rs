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

//! Error taxonomy shared by every Quartz crate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuartzError {
    /// Site or session configuration that can never succeed as given.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("solver unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("policy computation failed: {0}")]
    ComputeFailed(String),

    #[error("corrupt policy artifact at {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// A call was issued before the setup step it depends on.
    #[error("session not ready: {0}")]
    NotReady(&'static str),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuartzError {
    /// Configuration errors are surfaced immediately and must not be retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type QuartzResult<T> = Result<T, QuartzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(QuartzError::Configuration("period 9 in no tier".to_owned()).is_fatal());
        assert!(!QuartzError::ServiceUnavailable("refused".to_owned()).is_fatal());
        assert!(!QuartzError::ComputeFailed("solver exited".to_owned()).is_fatal());
        assert!(!QuartzError::NotReady("site not set").is_fatal());
    }

    #[test]
    fn test_corrupt_message_names_path() {
        let err = QuartzError::Corrupt {
            path: PathBuf::from("/tmp/site_1/battery_2/2_s_weekday.policy"),
            reason: "truncated".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "corrupt policy artifact at /tmp/site_1/battery_2/2_s_weekday.policy: truncated"
        );
    }
}
