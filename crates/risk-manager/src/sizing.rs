use tracing::debug;

use crate::models::{SizingMethod, SizingParams, MAX_SINGLE_NAME_ALLOCATION};

/// Number of shares to buy for one name.
///
/// Risk parity sizes the position so a stop-out (`atr * stop_mult` below
/// entry) costs exactly `risk_pct` of the account: higher-ATR names get
/// fewer shares. Every method is then capped so the position is worth at
/// most 30% of the account.
///
/// Malformed inputs (non-positive price or ATR, non-finite values) yield 0;
/// the result is always a finite, non-negative share count.
pub fn position_size(account_value: f64, price: f64, atr: f64, params: &SizingParams) -> u64 {
    if !price.is_finite() || price <= 0.0 {
        return 0;
    }
    if !account_value.is_finite() || account_value <= 0.0 {
        return 0;
    }

    let raw = match params.method {
        SizingMethod::RiskParity => {
            if !atr.is_finite() || atr <= 0.0 {
                return 0;
            }
            let risk_amount = account_value * params.risk_pct;
            let stop_distance = atr * params.stop_mult;
            if !stop_distance.is_finite() || stop_distance <= 0.0 {
                return 0;
            }
            risk_amount / stop_distance
        }
        SizingMethod::EqualWeight => {
            if params.max_positions == 0 {
                return 0;
            }
            let allocation_pct = 1.0 / params.max_positions as f64;
            account_value * allocation_pct * params.max_leverage / price
        }
        SizingMethod::FixedFraction => account_value * params.fixed_pct / price,
    };

    let mut shares = if raw.is_finite() && raw > 0.0 {
        raw.floor()
    } else {
        0.0
    };

    let max_allocation = account_value * MAX_SINGLE_NAME_ALLOCATION;
    if shares * price > max_allocation {
        let capped = (max_allocation / price).floor();
        debug!(
            method = %params.method,
            requested = shares,
            capped,
            "position capped at single-name allocation limit"
        );
        shares = capped;
    }

    if shares.is_finite() && shares > 0.0 {
        shares as u64
    } else {
        0
    }
}

/// Price below which a long position should be closed.
pub fn stop_price(highest_price: f64, atr: f64, stop_atr_mult: f64) -> f64 {
    highest_price - atr * stop_atr_mult
}

/// Trailing ATR stop check. A close exactly on the stop line does not
/// trigger; a missing or non-positive ATR never triggers.
pub fn should_trigger_stop_loss(
    close: f64,
    highest_price: f64,
    atr: Option<f64>,
    stop_atr_mult: f64,
) -> bool {
    match atr {
        Some(atr) if atr > 0.0 => close < stop_price(highest_price, atr, stop_atr_mult),
        _ => false,
    }
}

/// Gross leverage check for opening `new_position_value` more exposure.
///
/// Leverage is gross exposure over net equity; the check passes when the
/// projected ratio stays within `max_leverage`. Non-positive equity always
/// fails.
pub fn check_leverage_limit(
    gross_exposure: f64,
    net_equity: f64,
    new_position_value: f64,
    max_leverage: f64,
) -> bool {
    if !net_equity.is_finite() || net_equity <= 0.0 {
        return false;
    }
    let projected = (gross_exposure.abs() + new_position_value.abs()) / net_equity;
    projected.is_finite() && projected <= max_leverage
}
