use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OptimizerError;
use crate::models::MetricVector;
use crate::simulation::{AnalyzerKey, SimulationRun};

const TRADING_DAYS: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

/// Scalar performance metrics that can be pulled out of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[serde(rename = "sharperatio", alias = "sharpe")]
    SharpeRatio,
    #[serde(alias = "value")]
    FinalValue,
    #[serde(alias = "max_drawdown")]
    Drawdown,
    Cagr,
    Calmar,
    Sortino,
    WinRate,
    ProfitFactor,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::SharpeRatio,
        Metric::FinalValue,
        Metric::Drawdown,
        Metric::Cagr,
        Metric::Calmar,
        Metric::Sortino,
        Metric::WinRate,
        Metric::ProfitFactor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::SharpeRatio => "sharperatio",
            Metric::FinalValue => "final_value",
            Metric::Drawdown => "drawdown",
            Metric::Cagr => "cagr",
            Metric::Calmar => "calmar",
            Metric::Sortino => "sortino",
            Metric::WinRate => "win_rate",
            Metric::ProfitFactor => "profit_factor",
        }
    }

    /// Metrics where a smaller number is the better result.
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Metric::Drawdown)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sharperatio" | "sharpe" | "sharpe_ratio" => Ok(Metric::SharpeRatio),
            "final_value" | "value" => Ok(Metric::FinalValue),
            "drawdown" | "max_drawdown" => Ok(Metric::Drawdown),
            "cagr" => Ok(Metric::Cagr),
            "calmar" => Ok(Metric::Calmar),
            "sortino" => Ok(Metric::Sortino),
            "win_rate" | "winrate" => Ok(Metric::WinRate),
            "profit_factor" => Ok(Metric::ProfitFactor),
            other => Err(OptimizerError::UnknownMetric(other.to_string())),
        }
    }
}

/// Compute `metric` for a finished run.
///
/// Returns `None` whenever the inputs cannot support the number (missing
/// analyzer, too few returns, zero denominators); never panics on bad data.
pub fn extract_metric<R: SimulationRun + ?Sized>(run: &R, metric: Metric) -> Option<f64> {
    let value = match metric {
        Metric::SharpeRatio => run.analyzer(AnalyzerKey::SharpeRatio),
        Metric::FinalValue => Some(run.final_value()),
        Metric::Drawdown => run.analyzer(AnalyzerKey::MaxDrawdownPct),
        Metric::Cagr => cagr(run.return_series()),
        Metric::Calmar => calmar(run),
        Metric::Sortino => sortino(run.return_series()),
        Metric::WinRate => win_rate(run),
        Metric::ProfitFactor => profit_factor(run),
    };
    value.filter(|v| v.is_finite())
}

/// Every metric named by `keys`, keyed by the name as given (lowercased).
///
/// Names that do not parse are recorded as missing.
pub fn extract_metric_vector<'a, R, I>(run: &R, keys: I) -> MetricVector
where
    R: SimulationRun + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .map(|name| {
            let key = name.trim().to_lowercase();
            let value = key.parse::<Metric>().ok().and_then(|m| extract_metric(run, m));
            (key, value)
        })
        .collect()
}

fn cagr(returns: &[(chrono::NaiveDate, f64)]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let growth: f64 = returns.iter().map(|(_, r)| 1.0 + r).product();
    let (first, last) = (returns.first()?.0, returns.last()?.0);
    let days = (last - first).num_days();
    let years = if days > 0 { days as f64 / DAYS_PER_YEAR } else { 0.0 };
    if years <= 0.0 {
        return None;
    }
    Some(growth.powf(1.0 / years) - 1.0)
}

fn calmar<R: SimulationRun + ?Sized>(run: &R) -> Option<f64> {
    let cagr = extract_metric(run, Metric::Cagr)?;
    let max_dd = extract_metric(run, Metric::Drawdown)?;
    if max_dd == 0.0 {
        return None;
    }
    Some(cagr / (max_dd.abs() / 100.0))
}

fn sortino(returns: &[(chrono::NaiveDate, f64)]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().map(|(_, r)| r).sum::<f64>() / n;

    let downside: Vec<f64> = returns
        .iter()
        .map(|(_, r)| *r)
        .filter(|r| *r < 0.0)
        .collect();
    if downside.len() < 2 {
        return None;
    }
    let d_mean = downside.iter().sum::<f64>() / downside.len() as f64;
    let d_var = downside.iter().map(|r| (r - d_mean).powi(2)).sum::<f64>()
        / (downside.len() - 1) as f64;
    let d_std = d_var.sqrt();
    if d_std == 0.0 {
        return None;
    }

    Some(mean * TRADING_DAYS / (d_std * TRADING_DAYS.sqrt()))
}

fn win_rate<R: SimulationRun + ?Sized>(run: &R) -> Option<f64> {
    let closed = run.analyzer(AnalyzerKey::ClosedTrades)?;
    if closed == 0.0 {
        return None;
    }
    let won = run.analyzer(AnalyzerKey::WonTrades).unwrap_or(0.0);
    Some(won / closed)
}

fn profit_factor<R: SimulationRun + ?Sized>(run: &R) -> Option<f64> {
    let gross_profit = run.analyzer(AnalyzerKey::GrossProfit).unwrap_or(0.0);
    let gross_loss = run.analyzer(AnalyzerKey::GrossLoss).unwrap_or(0.0);
    if gross_loss == 0.0 {
        return if gross_profit != 0.0 {
            Some(gross_profit)
        } else {
            None
        };
    }
    Some(gross_profit / gross_loss.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::RunReport;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(n as i64)
    }

    fn with_returns(rets: &[f64]) -> RunReport {
        RunReport::new(100_000.0).with_returns(
            rets.iter()
                .enumerate()
                .map(|(i, r)| (day(i as u32), *r))
                .collect(),
        )
    }

    #[test]
    fn test_metric_names_and_aliases() {
        assert_eq!("SharpeRatio".parse::<Metric>().unwrap(), Metric::SharpeRatio);
        assert_eq!("sharpe".parse::<Metric>().unwrap(), Metric::SharpeRatio);
        assert_eq!("max_drawdown".parse::<Metric>().unwrap(), Metric::Drawdown);
        assert_eq!(" value ".parse::<Metric>().unwrap(), Metric::FinalValue);
        assert!(matches!(
            "omega".parse::<Metric>(),
            Err(OptimizerError::UnknownMetric(_))
        ));
        for m in Metric::ALL {
            assert_eq!(m.as_str().parse::<Metric>().unwrap(), m);
        }
    }

    #[test]
    fn test_analyzer_metrics() {
        let run = RunReport::new(123_456.0)
            .with_analyzer(AnalyzerKey::SharpeRatio, 1.25)
            .with_analyzer(AnalyzerKey::MaxDrawdownPct, 15.5);
        assert_eq!(extract_metric(&run, Metric::SharpeRatio), Some(1.25));
        assert_eq!(extract_metric(&run, Metric::Drawdown), Some(15.5));
        assert_eq!(extract_metric(&run, Metric::FinalValue), Some(123_456.0));

        let bare = RunReport::new(1.0);
        assert_eq!(extract_metric(&bare, Metric::SharpeRatio), None);
        assert_eq!(extract_metric(&bare, Metric::Drawdown), None);
    }

    #[test]
    fn test_cagr_needs_two_returns_and_elapsed_time() {
        assert_eq!(extract_metric(&with_returns(&[0.01]), Metric::Cagr), None);

        let same_day = RunReport::new(1.0).with_returns(vec![(day(0), 0.01), (day(0), 0.02)]);
        assert_eq!(extract_metric(&same_day, Metric::Cagr), None);

        // 21% total over two calendar years
        let run = RunReport::new(1.0).with_returns(vec![(day(0), 0.0), (day(730), 0.21)]);
        let expected = 1.21f64.powf(365.25 / 730.0) - 1.0;
        assert_relative_eq!(extract_metric(&run, Metric::Cagr).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_calmar() {
        let run = RunReport::new(1.0)
            .with_returns(vec![(day(0), 0.0), (day(730), 0.21)])
            .with_analyzer(AnalyzerKey::MaxDrawdownPct, 20.0);
        let cagr = extract_metric(&run, Metric::Cagr).unwrap();
        assert_relative_eq!(extract_metric(&run, Metric::Calmar).unwrap(), cagr / 0.2);

        let flat = run.clone().with_analyzer(AnalyzerKey::MaxDrawdownPct, 0.0);
        assert_eq!(extract_metric(&flat, Metric::Calmar), None);
    }

    #[test]
    fn test_sortino() {
        let run = with_returns(&[0.02, -0.01, 0.03, -0.03]);
        let mean = 0.01 / 4.0;
        // downside [-0.01, -0.03]: sample std = 0.0141421...
        let d_std = (2.0f64 * 0.01f64.powi(2)).sqrt();
        let expected = mean * 252.0 / (d_std * 252.0f64.sqrt());
        assert_relative_eq!(extract_metric(&run, Metric::Sortino).unwrap(), expected, epsilon = 1e-9);

        assert_eq!(extract_metric(&with_returns(&[0.01, 0.02, 0.03]), Metric::Sortino), None);
        assert_eq!(extract_metric(&with_returns(&[0.01, -0.02, -0.02]), Metric::Sortino), None);
    }

    #[test]
    fn test_trade_metrics() {
        let run = RunReport::new(1.0)
            .with_analyzer(AnalyzerKey::ClosedTrades, 8.0)
            .with_analyzer(AnalyzerKey::WonTrades, 6.0)
            .with_analyzer(AnalyzerKey::GrossProfit, 3_000.0)
            .with_analyzer(AnalyzerKey::GrossLoss, -1_200.0);
        assert_relative_eq!(extract_metric(&run, Metric::WinRate).unwrap(), 0.75);
        assert_relative_eq!(extract_metric(&run, Metric::ProfitFactor).unwrap(), 2.5);

        let no_trades = RunReport::new(1.0).with_analyzer(AnalyzerKey::ClosedTrades, 0.0);
        assert_eq!(extract_metric(&no_trades, Metric::WinRate), None);
        assert_eq!(extract_metric(&no_trades, Metric::ProfitFactor), None);

        let no_losses = RunReport::new(1.0).with_analyzer(AnalyzerKey::GrossProfit, 900.0);
        assert_eq!(extract_metric(&no_losses, Metric::ProfitFactor), Some(900.0));
    }

    #[test]
    fn test_metric_vector_keys() {
        let run = RunReport::new(10.0).with_analyzer(AnalyzerKey::SharpeRatio, 0.8);
        let v = extract_metric_vector(&run, ["SharpeRatio", "final_value", "bogus"]);
        assert_eq!(v.get("sharperatio"), Some(&Some(0.8)));
        assert_eq!(v.get("final_value"), Some(&Some(10.0)));
        assert_eq!(v.get("bogus"), Some(&None));
    }
}
