//! Scoring engine configuration

use serde::Deserialize;

use super::error::ValidationError;

/// What to do when a computation targets a locked period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LockedPeriodPolicy {
    /// Fail with `PeriodLocked`. Cached scores are still returned for
    /// non-forced single-user requests.
    #[default]
    Reject,
    /// Recompute anyway and mark the score as locked.
    Recompute,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Stamped on every score written
    #[serde(default = "default_computation_version")]
    pub computation_version: String,

    /// Upper bound on concurrent per-user computations in a batch
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default)]
    pub locked_period_policy: LockedPeriodPolicy,

    /// Score change (in points) beyond which a trend is improving or declining
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold: f64,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.computation_version.trim().is_empty() {
            return Err(ValidationError::MissingRequired("HR_SCORING__SCORING__COMPUTATION_VERSION"));
        }
        if self.max_concurrency == 0 || self.max_concurrency > 64 {
            return Err(ValidationError::InvalidConcurrency);
        }
        if !self.trend_threshold.is_finite() || self.trend_threshold < 0.0 {
            return Err(ValidationError::InvalidTrendThreshold);
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            computation_version: default_computation_version(),
            max_concurrency: default_max_concurrency(),
            locked_period_policy: LockedPeriodPolicy::default(),
            trend_threshold: default_trend_threshold(),
        }
    }
}

fn default_computation_version() -> String {
    "1.0".to_string()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_trend_threshold() -> f64 {
    5.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ScoringConfig::default();
        assert_eq!(config.computation_version, "1.0");
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.locked_period_policy, LockedPeriodPolicy::Reject);
        assert_eq!(config.trend_threshold, 5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = ScoringConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidConcurrency));
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let config = ScoringConfig {
            trend_threshold: -1.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTrendThreshold));
    }

    #[test]
    fn policy_deserializes_from_lowercase() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"locked_period_policy": "recompute"}"#).unwrap();
        assert_eq!(config.locked_period_policy, LockedPeriodPolicy::Recompute);
        assert_eq!(config.max_concurrency, 4);
    }
}
