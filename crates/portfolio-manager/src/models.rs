use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Account-level limits applied by [`crate::PortfolioManager`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioLimits {
    pub max_leverage: f64,
    pub max_positions: usize,
    /// Default fraction of account value risked per trade.
    pub risk_pct: f64,
    /// Default stop distance in ATR multiples.
    pub stop_mult: f64,
    pub fixed_pct: f64,
    /// Fraction of cash held back for slippage and commissions.
    pub cash_buffer_pct: f64,
    /// Rebalance orders worth this much or less are dropped.
    pub min_trade_value: f64,
}

impl Default for PortfolioLimits {
    fn default() -> Self {
        Self {
            max_leverage: 1.0,
            max_positions: 10,
            risk_pct: 0.02,
            stop_mult: 3.0,
            fixed_pct: 0.10,
            cash_buffer_pct: 0.02,
            min_trade_value: 500.0,
        }
    }
}

/// Per-call overrides for [`crate::PortfolioManager::calculate_position_size`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SizingOverrides {
    pub risk_pct: Option<f64>,
    pub stop_mult: Option<f64>,
    pub fixed_pct: Option<f64>,
}

/// Signed share change for one ticker: positive buys, negative sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceOrder {
    pub ticker: String,
    pub delta: i64,
}

/// Mutable state of one open position, owned by [`crate::PositionBook`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub ticker: String,
    pub size: u64,
    /// Share-weighted average fill price.
    pub entry_price: f64,
    /// Highest close (or fill) seen since the position was opened.
    pub highest_price: f64,
    /// Full size the position is pyramided towards.
    pub target_size: u64,
    /// Indices of take-profit tiers already executed.
    pub tiers_taken: Vec<usize>,
    pub opened_on: Option<NaiveDate>,
}

impl PositionState {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size as f64 * price
    }

    /// Open return relative to the average entry price.
    pub fn open_return(&self, price: f64) -> f64 {
        if self.entry_price <= 0.0 {
            return 0.0;
        }
        price / self.entry_price - 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub ticker: String,
    pub side: FillSide,
    pub quantity: u64,
    pub price: f64,
    pub date: Option<NaiveDate>,
}

/// Partial-entry pyramiding: buy `entry_fraction` of the full size first,
/// add the rest once price moves `add_trigger_atr` ATRs in favour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidPolicy {
    pub entry_fraction: f64,
    pub add_trigger_atr: f64,
}

impl Default for PyramidPolicy {
    fn default() -> Self {
        Self {
            entry_fraction: 0.5,
            add_trigger_atr: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitTier {
    /// Open gain (0.10 = +10%) at which the tier fires.
    pub gain_pct: f64,
    /// Fraction of the current size sold when it fires.
    pub exit_fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeProfitPolicy {
    pub tiers: Vec<TakeProfitTier>,
}

impl Default for TakeProfitPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                TakeProfitTier {
                    gain_pct: 0.10,
                    exit_fraction: 1.0 / 3.0,
                },
                TakeProfitTier {
                    gain_pct: 0.20,
                    exit_fraction: 0.5,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitExit {
    pub tier: usize,
    pub shares: u64,
}

/// Last-place elimination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationPolicy {
    /// Holdings scoring at or above this are never rotated out.
    pub score_floor: f64,
    /// Holdings trading above their moving average are kept.
    pub protect_above_ma: bool,
    /// Holdings up at least this much since entry are kept.
    pub winner_return: f64,
    /// Consecutive weak days required before a holding may be replaced.
    pub weakness_days: u32,
    /// A challenger must outscore the incumbent by at least this much.
    pub min_score_edge: f64,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            score_floor: 60.0,
            protect_above_ma: true,
            winner_return: 0.15,
            weakness_days: 3,
            min_score_edge: 10.0,
        }
    }
}

/// What rotation needs to know about a current holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingView {
    pub ticker: String,
    pub score: f64,
    pub above_ma: bool,
    pub open_return: f64,
    pub weak_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenger {
    pub ticker: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldReason {
    NoHoldings,
    GoodEnough,
    WinnerProtected,
    NotConfirmedWeak,
    NoChallenger,
    EdgeTooSmall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationDecision {
    Hold(HoldReason),
    Rotate { sell: String, buy: String },
}
