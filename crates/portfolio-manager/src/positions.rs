use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::{PortfolioError, PortfolioResult};
use crate::models::{Fill, FillSide, PositionState};

/// Open positions keyed by ticker.
///
/// A position exists from its first buy fill until a sell brings its size
/// back to zero; there is no flat-but-present state.
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    positions: BTreeMap<String, PositionState>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ticker: &str) -> Option<&PositionState> {
        self.positions.get(ticker)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PositionState> {
        self.positions.values()
    }

    /// Share counts per ticker, the shape rebalancing expects.
    pub fn holdings(&self) -> HashMap<String, u64> {
        self.positions
            .values()
            .map(|p| (p.ticker.clone(), p.size))
            .collect()
    }

    /// Apply an executed fill. Returns the position after the fill, or
    /// `None` when the fill closed it.
    pub fn apply_fill(&mut self, fill: &Fill) -> PortfolioResult<Option<&PositionState>> {
        if !fill.price.is_finite() || fill.price <= 0.0 {
            return Err(PortfolioError::InvalidPrice {
                ticker: fill.ticker.clone(),
                price: fill.price,
            });
        }
        if fill.quantity == 0 {
            return Err(PortfolioError::ZeroQuantity(fill.ticker.clone()));
        }

        match fill.side {
            FillSide::Buy => Ok(Some(self.buy(fill))),
            FillSide::Sell => self.sell(fill),
        }
    }

    fn buy(&mut self, fill: &Fill) -> &PositionState {
        let position = self
            .positions
            .entry(fill.ticker.clone())
            .or_insert_with(|| {
                debug!(ticker = %fill.ticker, price = fill.price, "opening position");
                PositionState {
                    ticker: fill.ticker.clone(),
                    size: 0,
                    entry_price: fill.price,
                    highest_price: fill.price,
                    target_size: 0,
                    tiers_taken: Vec::new(),
                    opened_on: fill.date,
                }
            });

        let old_cost = position.size as f64 * position.entry_price;
        let new_size = position.size + fill.quantity;
        position.entry_price = (old_cost + fill.quantity as f64 * fill.price) / new_size as f64;
        position.size = new_size;
        position.highest_price = position.highest_price.max(fill.price);
        position.target_size = position.target_size.max(new_size);
        position
    }

    fn sell(&mut self, fill: &Fill) -> PortfolioResult<Option<&PositionState>> {
        let held = match self.positions.get(&fill.ticker) {
            Some(p) => p.size,
            None => return Err(PortfolioError::NoPosition(fill.ticker.clone())),
        };
        if fill.quantity > held {
            return Err(PortfolioError::Oversell {
                ticker: fill.ticker.clone(),
                requested: fill.quantity,
                held,
            });
        }

        if fill.quantity == held {
            debug!(ticker = %fill.ticker, price = fill.price, "position closed");
            self.positions.remove(&fill.ticker);
            return Ok(None);
        }

        Ok(self.positions.get_mut(&fill.ticker).map(|position| {
            position.size -= fill.quantity;
            &*position
        }))
    }

    /// Set the full size a pyramided position is building towards.
    pub fn set_target(&mut self, ticker: &str, target_size: u64) -> PortfolioResult<()> {
        let position = self
            .positions
            .get_mut(ticker)
            .ok_or_else(|| PortfolioError::NoPosition(ticker.to_string()))?;
        position.target_size = target_size.max(position.size);
        Ok(())
    }

    /// Record that take-profit tier `tier` has fired for `ticker`.
    pub fn mark_tier_taken(&mut self, ticker: &str, tier: usize) -> PortfolioResult<()> {
        let position = self
            .positions
            .get_mut(ticker)
            .ok_or_else(|| PortfolioError::NoPosition(ticker.to_string()))?;
        if !position.tiers_taken.contains(&tier) {
            position.tiers_taken.push(tier);
        }
        Ok(())
    }

    /// Ratchet the highest price with today's close. Unknown tickers are ignored.
    pub fn mark(&mut self, ticker: &str, close: f64) {
        if let Some(position) = self.positions.get_mut(ticker) {
            if close.is_finite() && close > position.highest_price {
                position.highest_price = close;
            }
        }
    }

    /// Total market value of all positions at `prices`; missing prices
    /// fall back to the entry price.
    pub fn gross_exposure(&self, prices: &HashMap<String, f64>) -> f64 {
        self.positions
            .values()
            .map(|p| {
                let price = prices.get(&p.ticker).copied().unwrap_or(p.entry_price);
                p.market_value(price)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fill(side: FillSide, quantity: u64, price: f64) -> Fill {
        Fill {
            ticker: "AAPL".to_string(),
            side,
            quantity,
            price,
            date: None,
        }
    }

    #[test]
    fn test_lifecycle_create_mutate_destroy() {
        let mut book = PositionBook::new();
        assert!(!book.contains("AAPL"));

        book.apply_fill(&fill(FillSide::Buy, 100, 50.0)).unwrap();
        assert_eq!(book.get("AAPL").unwrap().size, 100);

        book.apply_fill(&fill(FillSide::Buy, 100, 60.0)).unwrap();
        let p = book.get("AAPL").unwrap();
        assert_eq!(p.size, 200);
        assert_relative_eq!(p.entry_price, 55.0);
        assert_relative_eq!(p.highest_price, 60.0);

        let after = book.apply_fill(&fill(FillSide::Sell, 50, 70.0)).unwrap();
        assert_eq!(after.unwrap().size, 150);

        let closed = book.apply_fill(&fill(FillSide::Sell, 150, 70.0)).unwrap();
        assert!(closed.is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn test_structural_errors() {
        let mut book = PositionBook::new();
        assert!(matches!(
            book.apply_fill(&fill(FillSide::Sell, 1, 50.0)),
            Err(PortfolioError::NoPosition(_))
        ));
        assert!(matches!(
            book.apply_fill(&fill(FillSide::Buy, 10, 0.0)),
            Err(PortfolioError::InvalidPrice { .. })
        ));
        assert!(matches!(
            book.apply_fill(&fill(FillSide::Buy, 0, 10.0)),
            Err(PortfolioError::ZeroQuantity(_))
        ));

        book.apply_fill(&fill(FillSide::Buy, 10, 50.0)).unwrap();
        assert!(matches!(
            book.apply_fill(&fill(FillSide::Sell, 11, 50.0)),
            Err(PortfolioError::Oversell { held: 10, .. })
        ));
        assert_eq!(book.get("AAPL").unwrap().size, 10);
    }

    #[test]
    fn test_mark_only_ratchets_up() {
        let mut book = PositionBook::new();
        book.apply_fill(&fill(FillSide::Buy, 10, 50.0)).unwrap();
        book.mark("AAPL", 58.0);
        book.mark("AAPL", 52.0);
        book.mark("MSFT", 999.0);
        assert_relative_eq!(book.get("AAPL").unwrap().highest_price, 58.0);
        assert!(!book.contains("MSFT"));
    }

    #[test]
    fn test_tiers_recorded_once() {
        let mut book = PositionBook::new();
        book.apply_fill(&fill(FillSide::Buy, 10, 50.0)).unwrap();
        book.mark_tier_taken("AAPL", 0).unwrap();
        book.mark_tier_taken("AAPL", 0).unwrap();
        assert_eq!(book.get("AAPL").unwrap().tiers_taken, vec![0]);
        assert!(book.mark_tier_taken("MSFT", 0).is_err());
    }
}
