use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard cap on a single name, as a fraction of account value.
pub const MAX_SINGLE_NAME_ALLOCATION: f64 = 0.30;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Unknown sizing method: {0}")]
    UnknownSizingMethod(String),
}

/// How a target share count is derived from account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SizingMethod {
    /// Size so that a full stop-out loses `risk_pct` of the account.
    #[default]
    RiskParity,
    /// Split levered capital evenly across `max_positions` slots.
    EqualWeight,
    /// Spend a fixed fraction of the account on every name.
    FixedFraction,
}

impl SizingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizingMethod::RiskParity => "risk_parity",
            SizingMethod::EqualWeight => "equal_weight",
            SizingMethod::FixedFraction => "fixed_fraction",
        }
    }
}

impl fmt::Display for SizingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizingMethod {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "risk_parity" | "atr" => Ok(SizingMethod::RiskParity),
            "equal_weight" => Ok(SizingMethod::EqualWeight),
            "fixed_fraction" => Ok(SizingMethod::FixedFraction),
            other => Err(RiskError::UnknownSizingMethod(other.to_string())),
        }
    }
}

/// Inputs to [`crate::sizing::position_size`] that do not change bar to bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingParams {
    pub method: SizingMethod,
    /// Slots used by equal-weight sizing.
    pub max_positions: usize,
    pub max_leverage: f64,
    /// Fraction of account value lost if the stop is hit (e.g. 0.02 = 2%).
    pub risk_pct: f64,
    /// Stop distance in ATR multiples.
    pub stop_mult: f64,
    /// Fraction of account value per name for fixed-fraction sizing.
    pub fixed_pct: f64,
}

impl Default for SizingParams {
    fn default() -> Self {
        Self {
            method: SizingMethod::RiskParity,
            max_positions: 10,
            max_leverage: 1.0,
            risk_pct: 0.02,
            stop_mult: 3.0,
            fixed_pct: 0.10,
        }
    }
}

impl SizingParams {
    pub fn with_method(mut self, method: SizingMethod) -> Self {
        self.method = method;
        self
    }
}

/// One step of a [`StopPolicy`]: once open profit reaches `profit_atr`
/// ATRs, the trailing stop uses `mult` instead of the base multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopTier {
    pub profit_atr: f64,
    pub mult: f64,
}

/// ATR trailing-stop policy with profit-dependent tightening.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StopPolicy {
    pub base_mult: f64,
    pub tiers: Vec<StopTier>,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            base_mult: 3.5,
            tiers: vec![
                StopTier { profit_atr: 3.0, mult: 3.0 },
                StopTier { profit_atr: 6.0, mult: 2.5 },
            ],
        }
    }
}
