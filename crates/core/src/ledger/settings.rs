//! Engine tuning derived from configuration.

use std::time::Duration;

use bursary_shared::LedgerConfig;

/// Runtime settings for the ledger engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Re-runs allowed after a retryable conflict.
    pub max_conflict_retries: u32,
    /// Time budget of one atomic scope.
    pub scope_timeout: Duration,
    /// Minimum trimmed length of a reversal reason.
    pub min_reversal_reason_len: usize,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerSettings {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            max_conflict_retries: config.max_conflict_retries,
            scope_timeout: Duration::from_millis(config.scope_timeout_ms),
            min_reversal_reason_len: config.min_reversal_reason_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config() {
        let settings = LedgerSettings::default();
        assert_eq!(settings.max_conflict_retries, 3);
        assert_eq!(settings.scope_timeout, Duration::from_secs(10));
        assert_eq!(settings.min_reversal_reason_len, 10);
    }
}
