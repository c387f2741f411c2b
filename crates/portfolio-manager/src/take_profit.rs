use tracing::debug;

use crate::models::{PositionState, TakeProfitExit, TakeProfitPolicy};

impl TakeProfitPolicy {
    /// First untaken tier whose gain has been reached at `close`, with the
    /// number of shares to sell. Each tier fires at most once per position.
    pub fn check(&self, position: &PositionState, close: f64) -> Option<TakeProfitExit> {
        if position.size == 0 || position.entry_price <= 0.0 || !close.is_finite() {
            return None;
        }
        let gain = position.open_return(close);

        let (tier, spec) = self
            .tiers
            .iter()
            .enumerate()
            .find(|(i, t)| !position.tiers_taken.contains(i) && gain >= t.gain_pct)?;

        let raw = (position.size as f64 * spec.exit_fraction + 1e-9).floor();
        let shares = if raw.is_finite() && raw >= 1.0 {
            (raw as u64).min(position.size)
        } else {
            1
        };

        debug!(
            ticker = %position.ticker,
            tier,
            gain,
            shares,
            "take-profit tier reached"
        );
        Some(TakeProfitExit { tier, shares })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(size: u64, tiers_taken: Vec<usize>) -> PositionState {
        PositionState {
            ticker: "AAPL".to_string(),
            size,
            entry_price: 100.0,
            highest_price: 100.0,
            target_size: size,
            tiers_taken,
            opened_on: None,
        }
    }

    #[test]
    fn test_no_exit_below_first_tier() {
        let policy = TakeProfitPolicy::default();
        assert!(policy.check(&position(300, vec![]), 109.0).is_none());
    }

    #[test]
    fn test_first_tier_sells_a_third() {
        let policy = TakeProfitPolicy::default();
        let exit = policy.check(&position(300, vec![]), 111.0).unwrap();
        assert_eq!(exit, TakeProfitExit { tier: 0, shares: 100 });
    }

    #[test]
    fn test_tiers_fire_once_in_order() {
        let policy = TakeProfitPolicy::default();
        // first tier already taken, 25% gain -> second tier on remaining size
        let exit = policy.check(&position(200, vec![0]), 125.0).unwrap();
        assert_eq!(exit, TakeProfitExit { tier: 1, shares: 100 });

        assert!(policy.check(&position(100, vec![0, 1]), 150.0).is_none());
    }

    #[test]
    fn test_small_position_sells_at_least_one() {
        let policy = TakeProfitPolicy::default();
        let exit = policy.check(&position(2, vec![]), 111.0).unwrap();
        assert_eq!(exit.shares, 1);
        let exit = policy.check(&position(1, vec![0]), 121.0).unwrap();
        assert_eq!(exit.shares, 1);
    }
}
