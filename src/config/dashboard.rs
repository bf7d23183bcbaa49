//! Dashboard configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Dashboard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Maximum lookback of the daily evolution series, in days, when no
    /// explicit range start is requested. Caps the series length.
    #[serde(default = "default_max_lookback_days")]
    pub max_lookback_days: i64,
}

impl DashboardConfig {
    /// Validate dashboard configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_lookback_days <= 0 {
            return Err(ValidationError::InvalidLookback);
        }
        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            max_lookback_days: default_max_lookback_days(),
        }
    }
}

fn default_max_lookback_days() -> i64 {
    730
}
