// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Session configuration shared by every connector

use crate::common::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Time pending outbound messages survive a close (zero = dropped at once)
    pub linger: Duration,

    /// Largest message accepted in either direction (None = unlimited)
    pub max_message_size: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            linger: Duration::ZERO,
            max_message_size: Some(16 * 1024 * 1024),
        }
    }
}

impl SessionConfig {
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = Some(size);
        self
    }

    pub fn with_unlimited_message_size(mut self) -> Self {
        self.max_message_size = None;
        self
    }

    pub fn validate(&self) -> TransportResult<()> {
        if self.max_message_size == Some(0) {
            return Err(TransportError::InvalidConfig(
                "maximum message size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Reject messages above the configured limit
    pub fn check_size(&self, size: usize) -> TransportResult<()> {
        match self.max_message_size {
            Some(max_size) if size > max_size => {
                Err(TransportError::MessageTooLarge { size, max_size })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit() {
        let config = SessionConfig::default().with_max_message_size(4);
        assert!(config.check_size(4).is_ok());
        assert!(matches!(
            config.check_size(5),
            Err(TransportError::MessageTooLarge { size: 5, max_size: 4 })
        ));
        assert!(SessionConfig::default()
            .with_unlimited_message_size()
            .check_size(usize::MAX)
            .is_ok());
    }

    #[test]
    fn test_zero_size_limit_invalid() {
        let config = SessionConfig::default().with_max_message_size(0);
        assert!(config.validate().is_err());
    }
}
