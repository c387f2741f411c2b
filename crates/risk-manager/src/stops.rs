use crate::models::StopPolicy;
use crate::sizing;

impl StopPolicy {
    /// ATR multiplier in force for a position that entered at `entry_price`
    /// and has since printed `highest_price`.
    ///
    /// Open profit is measured in ATRs; the tightest tier whose threshold
    /// has been reached wins, otherwise `base_mult` applies.
    pub fn multiplier(&self, entry_price: f64, highest_price: f64, atr: f64) -> f64 {
        if !atr.is_finite() || atr <= 0.0 {
            return self.base_mult;
        }
        let profit_atr = (highest_price - entry_price) / atr;

        self.tiers
            .iter()
            .filter(|tier| profit_atr >= tier.profit_atr)
            .map(|tier| tier.mult)
            .fold(self.base_mult, f64::min)
    }

    /// Current trailing stop level, or `None` without a usable ATR.
    pub fn stop_price(&self, entry_price: f64, highest_price: f64, atr: Option<f64>) -> Option<f64> {
        let atr = atr.filter(|a| *a > 0.0)?;
        let mult = self.multiplier(entry_price, highest_price, atr);
        Some(sizing::stop_price(highest_price, atr, mult))
    }

    pub fn should_exit(
        &self,
        close: f64,
        entry_price: f64,
        highest_price: f64,
        atr: Option<f64>,
    ) -> bool {
        let Some(atr_value) = atr.filter(|a| *a > 0.0) else {
            return false;
        };
        let mult = self.multiplier(entry_price, highest_price, atr_value);
        sizing::should_trigger_stop_loss(close, highest_price, atr, mult)
    }
}
