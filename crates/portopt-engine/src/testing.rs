//! Deterministic return tables shared by the unit tests.

use chrono::{Duration, NaiveDate};
use ndarray::Array2;
use portopt_data::ReturnTable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn table(tickers: &[&str], values: Array2<f64>) -> ReturnTable {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let dates = (0..values.nrows())
        .map(|t| start + Duration::days(t as i64))
        .collect();
    ReturnTable::new(tickers.iter().map(|s| s.to_string()).collect(), dates, values).unwrap()
}

/// Four assets with distinct drifts, two loosely related factors.
pub(crate) fn sample_returns() -> ReturnTable {
    let mut rng = StdRng::seed_from_u64(7);
    let drift = [0.0020, 0.0012, 0.0008, 0.0004];
    let mut values: Array2<f64> = Array2::zeros((500, 4));
    for mut row in values.rows_mut() {
        let f1: f64 = rng.gen_range(-1.0..1.0);
        let f2: f64 = rng.gen_range(-1.0..1.0);
        let e: Vec<f64> = (0..4).map(|_| rng.gen_range(-1.0..1.0)).collect();
        row[0] = drift[0] + 0.012 * f1 + 0.006 * e[0];
        row[1] = drift[1] + 0.010 * f1 + 0.008 * e[1];
        row[2] = drift[2] + 0.006 * f2 + 0.004 * e[2];
        row[3] = drift[3] + 0.004 * f2 + 0.002 * f1 + 0.003 * e[3];
    }
    table(&["AAA", "BBB", "CCC", "DDD"], values)
}

/// Two tight blocks: a volatile pair driven by one factor and a quiet pair
/// driven by another.
pub(crate) fn block_returns() -> ReturnTable {
    let mut rng = StdRng::seed_from_u64(11);
    let mut values: Array2<f64> = Array2::zeros((400, 4));
    for mut row in values.rows_mut() {
        let f1: f64 = rng.gen_range(-1.0..1.0);
        let f2: f64 = rng.gen_range(-1.0..1.0);
        let e: Vec<f64> = (0..4).map(|_| rng.gen_range(-1.0..1.0)).collect();
        row[0] = 0.020 * f1 + 0.002 * e[0];
        row[1] = 0.018 * f1 + 0.003 * e[1];
        row[2] = 0.005 * f2 + 0.0005 * e[2];
        row[3] = 0.004 * f2 + 0.0006 * e[3];
    }
    table(&["HI1", "HI2", "LO1", "LO2"], values)
}
