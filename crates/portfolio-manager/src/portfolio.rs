use std::collections::HashMap;

use risk_manager::{SizingMethod, SizingParams};

use crate::models::*;
use crate::rebalancing::RebalanceCalculator;

/// Applies account-level risk policy on top of the stateless sizing rules.
#[derive(Debug, Clone)]
pub struct PortfolioManager {
    initial_capital: f64,
    limits: PortfolioLimits,
    pyramid: PyramidPolicy,
}

impl PortfolioManager {
    pub fn new(initial_capital: f64, max_leverage: f64, max_positions: usize) -> Self {
        Self {
            initial_capital,
            limits: PortfolioLimits {
                max_leverage,
                max_positions,
                ..PortfolioLimits::default()
            },
            pyramid: PyramidPolicy::default(),
        }
    }

    pub fn with_limits(initial_capital: f64, limits: PortfolioLimits) -> Self {
        Self {
            initial_capital,
            limits,
            pyramid: PyramidPolicy::default(),
        }
    }

    pub fn with_pyramid(mut self, pyramid: PyramidPolicy) -> Self {
        self.pyramid = pyramid;
        self
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn limits(&self) -> &PortfolioLimits {
        &self.limits
    }

    pub fn pyramid(&self) -> &PyramidPolicy {
        &self.pyramid
    }

    /// Sizing parameters built from the manager's defaults and per-call overrides.
    pub fn sizing_params(&self, method: SizingMethod, overrides: SizingOverrides) -> SizingParams {
        SizingParams {
            method,
            max_positions: self.limits.max_positions,
            max_leverage: self.limits.max_leverage,
            risk_pct: overrides.risk_pct.unwrap_or(self.limits.risk_pct),
            stop_mult: overrides.stop_mult.unwrap_or(self.limits.stop_mult),
            fixed_pct: overrides.fixed_pct.unwrap_or(self.limits.fixed_pct),
        }
    }

    /// Full position size in shares for one name.
    pub fn calculate_position_size(
        &self,
        account_value: f64,
        price: f64,
        atr: f64,
        method: SizingMethod,
        overrides: SizingOverrides,
    ) -> u64 {
        let params = self.sizing_params(method, overrides);
        risk_manager::position_size(account_value, price, atr, &params)
    }

    /// Size of the first fill when the position is pyramided in.
    pub fn first_entry_size(
        &self,
        account_value: f64,
        price: f64,
        atr: f64,
        method: SizingMethod,
        overrides: SizingOverrides,
    ) -> (u64, u64) {
        let full = self.calculate_position_size(account_value, price, atr, method, overrides);
        (self.pyramid.initial_entry(full), full)
    }

    /// True when the purchase fits in cash after holding back the buffer.
    pub fn check_cash_availability(&self, current_cash: f64, estimated_cost: f64) -> bool {
        let buffer = current_cash * self.limits.cash_buffer_pct;
        current_cash - buffer >= estimated_cost
    }

    pub fn get_max_purchasable(&self, current_cash: f64, price: f64) -> u64 {
        if !price.is_finite() || price <= 0.0 || !current_cash.is_finite() || current_cash <= 0.0 {
            return 0;
        }
        (current_cash / price).floor() as u64
    }

    pub fn check_leverage_limit(
        &self,
        gross_exposure: f64,
        net_equity: f64,
        new_position_value: f64,
    ) -> bool {
        risk_manager::check_leverage_limit(
            gross_exposure,
            net_equity,
            new_position_value,
            self.limits.max_leverage,
        )
    }

    /// Share deltas that move current holdings towards `ideal_weights`.
    pub fn get_rebalance_targets(
        &self,
        current_positions: &HashMap<String, u64>,
        ideal_weights: &[(String, f64)],
        account_value: f64,
        price_map: &HashMap<String, f64>,
    ) -> Vec<RebalanceOrder> {
        RebalanceCalculator::new(self.limits.min_trade_value).calculate(
            current_positions,
            ideal_weights,
            account_value,
            price_map,
        )
    }
}

impl Default for PortfolioManager {
    fn default() -> Self {
        Self::with_limits(100_000.0, PortfolioLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_defaults() {
        let pm = PortfolioManager::new(100_000.0, 1.0, 10);
        let base = pm.calculate_position_size(
            100_000.0,
            50.0,
            2.0,
            SizingMethod::RiskParity,
            SizingOverrides::default(),
        );
        assert_eq!(base, 333);

        let tighter = pm.calculate_position_size(
            100_000.0,
            50.0,
            2.0,
            SizingMethod::RiskParity,
            SizingOverrides {
                risk_pct: Some(0.01),
                ..SizingOverrides::default()
            },
        );
        assert_eq!(tighter, 166);
    }

    #[test]
    fn test_cash_buffer() {
        let pm = PortfolioManager::default();
        assert!(pm.check_cash_availability(10_000.0, 9_799.0));
        assert!(!pm.check_cash_availability(10_000.0, 9_850.0));
        assert!(!pm.check_cash_availability(0.0, 1.0));
    }

    #[test]
    fn test_max_purchasable() {
        let pm = PortfolioManager::default();
        assert_eq!(pm.get_max_purchasable(10_000.0, 33.0), 303);
        assert_eq!(pm.get_max_purchasable(10_000.0, 0.0), 0);
        assert_eq!(pm.get_max_purchasable(10_000.0, -1.0), 0);
    }

    #[test]
    fn test_first_entry_is_half() {
        let pm = PortfolioManager::default();
        let (first, full) = pm.first_entry_size(
            100_000.0,
            50.0,
            2.0,
            SizingMethod::RiskParity,
            SizingOverrides::default(),
        );
        assert_eq!(full, 333);
        assert_eq!(first, 166);
    }

    #[test]
    fn test_leverage_uses_manager_limit() {
        let pm = PortfolioManager::new(100_000.0, 1.5, 10);
        assert!(pm.check_leverage_limit(100_000.0, 100_000.0, 50_000.0));
        assert!(!pm.check_leverage_limit(100_000.0, 100_000.0, 50_001.0));
    }
}
