use crate::models::{PositionState, PyramidPolicy};

impl PyramidPolicy {
    /// Shares for the first fill out of a fully sized position of `full` shares.
    pub fn initial_entry(&self, full: u64) -> u64 {
        if full == 0 {
            return 0;
        }
        let fraction = self.entry_fraction.clamp(0.0, 1.0);
        let first = (full as f64 * fraction).floor() as u64;
        first.clamp(1, full)
    }

    /// Close at which the remaining size may be added.
    pub fn add_trigger_price(&self, entry_price: f64, atr: f64) -> f64 {
        entry_price + self.add_trigger_atr * atr
    }

    /// Shares to add now, or 0 when the position is complete or price has
    /// not moved far enough in its favour.
    pub fn add_on(&self, position: &PositionState, close: f64, atr: Option<f64>) -> u64 {
        let remaining = position.target_size.saturating_sub(position.size);
        if remaining == 0 {
            return 0;
        }
        let Some(atr) = atr.filter(|a| a.is_finite() && *a > 0.0) else {
            return 0;
        };
        if close >= self.add_trigger_price(position.entry_price, atr) {
            remaining
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(size: u64, target: u64) -> PositionState {
        PositionState {
            ticker: "AAPL".to_string(),
            size,
            entry_price: 100.0,
            highest_price: 100.0,
            target_size: target,
            tiers_taken: Vec::new(),
            opened_on: None,
        }
    }

    #[test]
    fn test_initial_entry_fraction() {
        let policy = PyramidPolicy::default();
        assert_eq!(policy.initial_entry(333), 166);
        assert_eq!(policy.initial_entry(1), 1);
        assert_eq!(policy.initial_entry(0), 0);

        let all_in = PyramidPolicy {
            entry_fraction: 1.0,
            ..PyramidPolicy::default()
        };
        assert_eq!(all_in.initial_entry(333), 333);
    }

    #[test]
    fn test_add_on_waits_for_trigger() {
        let policy = PyramidPolicy::default();
        let p = position(166, 333);
        // trigger = 100 + 1 * 2 = 102
        assert_eq!(policy.add_on(&p, 101.9, Some(2.0)), 0);
        assert_eq!(policy.add_on(&p, 102.0, Some(2.0)), 167);
        assert_eq!(policy.add_on(&p, 150.0, None), 0);
    }

    #[test]
    fn test_add_on_complete_position() {
        let policy = PyramidPolicy::default();
        assert_eq!(policy.add_on(&position(333, 333), 150.0, Some(2.0)), 0);
    }
}
