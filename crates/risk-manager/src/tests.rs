#[cfg(test)]
mod risk_manager_tests {
    use crate::models::*;
    use crate::sizing::*;

    fn params(method: SizingMethod) -> SizingParams {
        SizingParams::default().with_method(method)
    }

    // =========================================================================
    // Position sizing
    // =========================================================================

    #[test]
    fn test_risk_parity_sizes_from_atr() {
        let p = SizingParams {
            risk_pct: 0.02,
            stop_mult: 3.0,
            ..SizingParams::default()
        };
        // 100k * 2% = 2000 risk, stop 6 points away -> 333 shares
        assert_eq!(position_size(100_000.0, 50.0, 2.0, &p), 333);
    }

    #[test]
    fn test_risk_parity_higher_atr_means_fewer_shares() {
        let p = params(SizingMethod::RiskParity);
        let calm = position_size(100_000.0, 50.0, 1.5, &p);
        let volatile = position_size(100_000.0, 50.0, 4.0, &p);
        assert!(volatile < calm, "calm={} volatile={}", calm, volatile);
    }

    #[test]
    fn test_risk_parity_capped_at_thirty_percent() {
        let p = params(SizingMethod::RiskParity);
        // tiny ATR would ask for thousands of shares
        let shares = position_size(100_000.0, 100.0, 0.1, &p);
        assert_eq!(shares, 300);
    }

    #[test]
    fn test_equal_weight_splits_levered_capital() {
        let p = SizingParams {
            method: SizingMethod::EqualWeight,
            max_positions: 10,
            max_leverage: 1.0,
            ..SizingParams::default()
        };
        assert_eq!(position_size(100_000.0, 100.0, 0.0, &p), 100);

        let levered = SizingParams {
            max_leverage: 2.0,
            ..p.clone()
        };
        assert_eq!(position_size(100_000.0, 100.0, 0.0, &levered), 200);
    }

    #[test]
    fn test_equal_weight_with_no_slots_is_zero() {
        let p = SizingParams {
            method: SizingMethod::EqualWeight,
            max_positions: 0,
            ..SizingParams::default()
        };
        assert_eq!(position_size(100_000.0, 100.0, 2.0, &p), 0);
    }

    #[test]
    fn test_fixed_fraction_spends_fixed_share_of_account() {
        let p = SizingParams {
            method: SizingMethod::FixedFraction,
            fixed_pct: 0.10,
            ..SizingParams::default()
        };
        assert_eq!(position_size(100_000.0, 50.0, 0.0, &p), 200);

        let greedy = SizingParams {
            fixed_pct: 0.9,
            ..p
        };
        assert_eq!(position_size(100_000.0, 50.0, 0.0, &greedy), 600);
    }

    #[test]
    fn test_bad_inputs_size_to_zero() {
        let p = params(SizingMethod::RiskParity);
        assert_eq!(position_size(100_000.0, 0.0, 2.0, &p), 0);
        assert_eq!(position_size(100_000.0, -5.0, 2.0, &p), 0);
        assert_eq!(position_size(100_000.0, 50.0, 0.0, &p), 0);
        assert_eq!(position_size(100_000.0, 50.0, -1.0, &p), 0);
        assert_eq!(position_size(100_000.0, f64::NAN, 2.0, &p), 0);
        assert_eq!(position_size(f64::INFINITY, 50.0, 2.0, &p), 0);
        assert_eq!(position_size(100_000.0, 50.0, f64::NAN, &p), 0);
        assert_eq!(position_size(-100.0, 50.0, 2.0, &p), 0);
    }

    #[test]
    fn test_every_method_respects_allocation_cap() {
        let methods = [
            SizingMethod::RiskParity,
            SizingMethod::EqualWeight,
            SizingMethod::FixedFraction,
        ];
        let accounts = [1_000.0, 25_000.0, 100_000.0, 3_000_000.0];
        let prices = [0.5, 7.25, 50.0, 333.0, 4_100.0];
        let atrs = [0.01, 0.3, 2.0, 15.0];

        for method in methods {
            let p = SizingParams {
                method,
                max_positions: 1,
                max_leverage: 3.0,
                fixed_pct: 1.0,
                ..SizingParams::default()
            };
            for &account in &accounts {
                for &price in &prices {
                    for &atr in &atrs {
                        let shares = position_size(account, price, atr, &p);
                        let value = shares as f64 * price;
                        assert!(
                            value <= account * MAX_SINGLE_NAME_ALLOCATION + 1e-6,
                            "{} sized {} shares at {} on {} account",
                            method,
                            shares,
                            price,
                            account
                        );
                    }
                }
            }
        }
    }

    // =========================================================================
    // Stop loss
    // =========================================================================

    #[test]
    fn test_stop_on_the_line_does_not_trigger() {
        // stop = 100 - 2 * 3 = 94
        assert!(!should_trigger_stop_loss(94.0, 100.0, Some(2.0), 3.0));
        assert!(should_trigger_stop_loss(93.99, 100.0, Some(2.0), 3.0));
        assert!(!should_trigger_stop_loss(99.0, 100.0, Some(2.0), 3.0));
    }

    #[test]
    fn test_stop_without_atr_never_triggers() {
        assert!(!should_trigger_stop_loss(1.0, 100.0, None, 3.0));
        assert!(!should_trigger_stop_loss(1.0, 100.0, Some(0.0), 3.0));
        assert!(!should_trigger_stop_loss(1.0, 100.0, Some(-2.0), 3.0));
    }

    #[test]
    fn test_stop_boundary_across_inputs() {
        for &(highest, atr, mult) in &[(100.0, 2.0, 3.0), (57.3, 1.1, 2.5), (812.0, 14.0, 3.5)] {
            let line = stop_price(highest, atr, mult);
            assert!(!should_trigger_stop_loss(line, highest, Some(atr), mult));
            assert!(should_trigger_stop_loss(line - 0.01, highest, Some(atr), mult));
        }
    }

    // =========================================================================
    // Leverage
    // =========================================================================

    #[test]
    fn test_leverage_within_limit() {
        assert!(check_leverage_limit(50_000.0, 100_000.0, 40_000.0, 1.0));
        assert!(check_leverage_limit(50_000.0, 100_000.0, 50_000.0, 1.0));
        assert!(!check_leverage_limit(50_000.0, 100_000.0, 60_000.0, 1.0));
        assert!(check_leverage_limit(150_000.0, 100_000.0, 40_000.0, 2.0));
    }

    #[test]
    fn test_leverage_fails_without_equity() {
        assert!(!check_leverage_limit(0.0, 0.0, 1.0, 10.0));
        assert!(!check_leverage_limit(0.0, -5_000.0, 1.0, 10.0));
    }

    // =========================================================================
    // Models
    // =========================================================================

    #[test]
    fn test_sizing_method_parses_aliases() {
        assert_eq!("risk_parity".parse::<SizingMethod>().unwrap(), SizingMethod::RiskParity);
        assert_eq!("ATR".parse::<SizingMethod>().unwrap(), SizingMethod::RiskParity);
        assert_eq!(" equal_weight ".parse::<SizingMethod>().unwrap(), SizingMethod::EqualWeight);
        assert_eq!("fixed_fraction".parse::<SizingMethod>().unwrap(), SizingMethod::FixedFraction);
        assert!(matches!(
            "kelly".parse::<SizingMethod>(),
            Err(RiskError::UnknownSizingMethod(_))
        ));
    }

    #[test]
    fn test_sizing_params_fill_defaults_from_json() {
        let p: SizingParams = serde_json::from_str(r#"{"method": "equal_weight", "max_positions": 5}"#).unwrap();
        assert_eq!(p.method, SizingMethod::EqualWeight);
        assert_eq!(p.max_positions, 5);
        assert_eq!(p.risk_pct, 0.02);
        assert_eq!(p.stop_mult, 3.0);
    }

    #[test]
    fn test_stop_policy_defaults() {
        let policy = StopPolicy::default();
        assert_eq!(policy.base_mult, 3.5);
        assert_eq!(policy.tiers.len(), 2);
    }
}
