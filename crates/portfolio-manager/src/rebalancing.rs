use std::collections::HashMap;

use tracing::debug;

use crate::models::RebalanceOrder;

pub struct RebalanceCalculator {
    min_trade_value: f64,
}

impl RebalanceCalculator {
    pub fn new(min_trade_value: f64) -> Self {
        Self { min_trade_value }
    }

    /// Calculate share deltas needed to reach target weights.
    ///
    /// Orders come out in the order of `targets`. Tickers without a positive
    /// price are skipped, as are changes worth `min_trade_value` or less.
    pub fn calculate(
        &self,
        positions: &HashMap<String, u64>,
        targets: &[(String, f64)],
        account_value: f64,
        prices: &HashMap<String, f64>,
    ) -> Vec<RebalanceOrder> {
        let mut orders = Vec::new();

        for (ticker, weight) in targets {
            let price = match prices.get(ticker) {
                Some(&p) if p.is_finite() && p > 0.0 => p,
                _ => {
                    debug!(%ticker, "no usable price, skipping rebalance");
                    continue;
                }
            };

            let target_value = account_value * weight;
            let target_shares = (target_value / price).trunc();
            let target_shares = if target_shares.is_finite() {
                target_shares as i64
            } else {
                continue;
            };

            let current = positions.get(ticker).copied().unwrap_or(0) as i64;
            let delta = target_shares - current;
            if delta == 0 {
                continue;
            }

            if (delta as f64 * price).abs() > self.min_trade_value {
                orders.push(RebalanceOrder {
                    ticker: ticker.clone(),
                    delta,
                });
            }
        }

        orders
    }
}
