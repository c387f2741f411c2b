use tracing::{debug, info};

use crate::models::{Challenger, HoldReason, HoldingView, RotationDecision, RotationPolicy};

impl RotationPolicy {
    /// Last-place elimination.
    ///
    /// The lowest-scoring holding is the only rotation candidate. It is kept
    /// if it is good enough, else if it is a protected winner, else if its
    /// weakness is not yet confirmed; the checks run in that order and the
    /// first one that holds decides. Otherwise it is swapped for the best
    /// challenger not already held, provided the score edge is large enough.
    pub fn evaluate(&self, holdings: &[HoldingView], challengers: &[Challenger]) -> RotationDecision {
        let Some(incumbent) = holdings
            .iter()
            .reduce(|worst, h| if h.score < worst.score { h } else { worst })
        else {
            return RotationDecision::Hold(HoldReason::NoHoldings);
        };

        if incumbent.score >= self.score_floor || (self.protect_above_ma && incumbent.above_ma) {
            return RotationDecision::Hold(HoldReason::GoodEnough);
        }
        if incumbent.open_return >= self.winner_return {
            return RotationDecision::Hold(HoldReason::WinnerProtected);
        }
        if incumbent.weak_days < self.weakness_days {
            return RotationDecision::Hold(HoldReason::NotConfirmedWeak);
        }

        let best = challengers
            .iter()
            .filter(|c| !holdings.iter().any(|h| h.ticker == c.ticker))
            .reduce(|best, c| if c.score > best.score { c } else { best });
        let Some(best) = best else {
            return RotationDecision::Hold(HoldReason::NoChallenger);
        };

        let edge = best.score - incumbent.score;
        if edge < self.min_score_edge {
            debug!(
                incumbent = %incumbent.ticker,
                challenger = %best.ticker,
                edge,
                "challenger edge too small"
            );
            return RotationDecision::Hold(HoldReason::EdgeTooSmall);
        }

        info!(
            sell = %incumbent.ticker,
            buy = %best.ticker,
            edge,
            "rotating last-place holding"
        );
        RotationDecision::Rotate {
            sell: incumbent.ticker.clone(),
            buy: best.ticker.clone(),
        }
    }
}
