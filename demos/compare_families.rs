//! Compare SARIMA, SARIMA with a regressor, VAR and the naive benchmarks on
//! a synthetic monthly series.
//!
//! Run with: RUST_LOG=sarima_select=debug cargo run --example compare_families

use sarima_select::models::var::{VarConfig, VarEngine};
use sarima_select::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sarima_select=info".into()),
        )
        .init();

    println!("=== sarima-select: family comparison ===\n");

    // 1. Synthetic data: a seasonal target driven by a leading indicator
    let n = 120;
    let mut state: u64 = 2024;
    let mut noise = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    };
    let mut indicator = vec![0.0; n];
    for t in 1..n {
        indicator[t] = 0.7 * indicator[t - 1] + 2.0 * noise();
    }
    let target: Vec<f64> = (0..n)
        .map(|t| {
            200.0
                + 0.8 * t as f64
                + 12.0 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin()
                + 1.5 * indicator[t]
                + noise()
        })
        .collect();

    let target = Series::new(target, 12).unwrap();
    let indicator_series = Series::new(indicator.clone(), 12).unwrap();
    let regressors = RegressorMatrix::single("indicator", indicator).unwrap();
    println!("Target: {} observations, period {}", target.len(), target.period());

    // 2. Stationarity and automatic order selection on the full series
    println!("\n--- Automatic SARIMA ---");
    let config = AutoArimaConfig::default()
        .with_max_orders(3, 3)
        .with_seasonal_orders(1, 1);
    let result = AutoArima::new(config.clone()).fit(&target, Some(&regressors)).unwrap();
    println!(
        "Differencing: d={}, D={}",
        result.differencing.d, result.differencing.seasonal_d
    );
    println!("Selected: {}", result.order());
    println!("AIC: {:.2}  BIC: {:.2}", result.best().aic(), result.best().bic());
    println!(
        "Candidates tried: {} ({} failed)",
        result.search.attempted, result.search.failed
    );
    println!(
        "Ljung-Box p-value: {:.4}, flagged ACF lags: {:?}",
        result.diagnostics.ljung_box.p_value, result.diagnostics.flagged_lags
    );

    // 3. VAR on the differenced pair with a Granger test
    println!("\n--- VAR on first differences ---");
    let diffs = vec![
        target.difference(1).unwrap(),
        indicator_series.difference(1).unwrap(),
    ];
    let var = VarEngine::new(VarConfig::default().with_max_lag(6))
        .fit(&diffs)
        .unwrap();
    println!(
        "Lag order: {}, max eigenvalue modulus: {:.4}, stable: {}",
        var.lag(),
        var.max_modulus(),
        var.is_stable()
    );
    match var.granger_causality(1, 0) {
        Ok(test) => println!(
            "indicator -> target: F = {:.3}, p = {:.4} ({:?})",
            test.f_statistic, test.p_value, test.conclusion
        ),
        Err(err) => println!("Granger test failed: {}", err),
    }

    // 4. Holdout comparison across families
    println!("\n--- Holdout comparison (12 periods) ---");
    let companions = vec![indicator_series];
    let input = ComparisonInput::new(&target, 12)
        .with_regressors(&regressors)
        .with_companions(&companions);
    let families = [
        Family::Sarima,
        Family::SarimaWithRegressor { column: 0 },
        Family::Var {
            difference: true,
            allow_unstable: false,
        },
        Family::Benchmark(Benchmark::Naive),
        Family::Benchmark(Benchmark::SeasonalNaive),
    ];
    let comparator = ModelComparator::new(ComparatorConfig::default().with_arima(config));
    let comparison = comparator.compare(&input, &families).unwrap();

    println!("{:<16} {:>10} {:>10}  model", "family", "MAE", "MAPE %");
    for outcome in &comparison.outcomes {
        match &outcome.result {
            Ok(record) => println!(
                "{:<16} {:>10.3} {:>10.3}  {}",
                outcome.family.to_string(),
                record.mae(),
                record.mape().unwrap_or(f64::NAN),
                record.label
            ),
            Err(err) => println!("{:<16} failed: {}", outcome.family.to_string(), err),
        }
    }
    println!("\nWinner: {}", comparison.best().family);
}
