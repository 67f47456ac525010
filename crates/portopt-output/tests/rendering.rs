//! Every chart of one allocation rendered into a single sink.

use chrono::{Duration, NaiveDate};
use ndarray::Array2;
use portopt_data::{Frequency, ReturnTable};
use portopt_risk::correlation::pearson;
use portopt_risk::{
    Dendrogram, HistoricalRiskScorer, Merge, PerformanceStats, RiskMeasure, RiskParams, Weights,
    risk_contributions,
};
use portopt_output::{
    AllocationReport, Chart, ContributionChart, DrawdownChart, ExportFormat, Exporter,
    HeatmapChart, HistogramChart, MemorySink, PerformanceReport, PieChart, WeightsTable, draw,
};

fn returns() -> ReturnTable {
    let tickers: Vec<String> = ["AAA", "BBB", "CCC"].iter().map(|s| s.to_string()).collect();
    let n = 40;
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let dates = (0..n).map(|i| start + Duration::days(i as i64)).collect();
    let values = Array2::from_shape_fn((n, 3), |(t, j)| {
        0.012 * (t as f64 * (0.5 + 0.4 * j as f64)).sin() + 0.001 * j as f64
    });
    ReturnTable::new(tickers, dates, values).unwrap()
}

#[test]
fn test_all_charts_reach_the_sink() {
    let table = returns();
    let weights = Weights::from_parts(table.tickers(), &[0.5, 0.3, 0.2]);
    let params = RiskParams::default();
    let series = table.portfolio_returns(&weights.aligned(table.tickers())).to_vec();
    let mut sink = MemorySink::default();

    let pie = PieChart::new(&weights, "Max Sharpe").unwrap();
    draw(&pie, None, &mut sink).unwrap();

    let hist = HistogramChart::new(&series, "Max Sharpe", &params).unwrap();
    draw(&hist, None, &mut sink).unwrap();

    let dd = DrawdownChart::new(table.dates(), &series, "Max Sharpe", &params).unwrap();
    draw(&dd, None, &mut sink).unwrap();

    let scorer = HistoricalRiskScorer::new(params);
    let contributions = risk_contributions(
        &scorer,
        &table,
        &weights.aligned(table.tickers()),
        RiskMeasure::Mv,
        0.0,
    )
    .unwrap();
    let rc = ContributionChart::new(
        table.tickers(),
        &contributions,
        RiskMeasure::Mv,
        Frequency::Daily,
        "Max Sharpe",
    )
    .unwrap();
    draw(&rc, None, &mut sink).unwrap();

    let tree = Dendrogram::new(
        table.tickers().to_vec(),
        vec![
            Merge { left: 0, right: 1, height: 0.4, size: 2 },
            Merge { left: 2, right: 3, height: 0.9, size: 3 },
        ],
        None,
    )
    .unwrap();
    let heat = HeatmapChart::new(&pearson(table.values()), &tree, "Max Sharpe").unwrap();
    draw(&heat, None, &mut sink).unwrap();

    assert_eq!(sink.names(), vec!["pie", "hist", "dd", "rc", "heat"]);
    assert!(sink.json("pie").unwrap().contains("Portfolio - Max Sharpe"));
    assert!(sink.json("rc").unwrap().contains("Risk (MV) Contribution per Asset"));
    assert_eq!(heat.title(), "Portfolio - Max Sharpe<br>Assets Clustergram");
}

#[test]
fn test_console_and_export_agree() {
    let table = returns();
    let weights = Weights::from_parts(table.tickers(), &[0.5, 0.3, 0.2]);
    let stats = PerformanceStats::compute(
        &weights,
        &table,
        Frequency::Daily,
        0.0,
        RiskMeasure::Cvar,
        &RiskParams::default(),
    )
    .unwrap();

    let rendered = WeightsTable::render(&weights, false).unwrap();
    assert!(rendered.starts_with("Weights\n"));
    assert!(rendered.contains("50.00 %"));

    let report = PerformanceReport::new(&stats);
    assert!(report.to_string().contains("Sharpe ratio"));

    let exported = AllocationReport::new("Max Sharpe".to_string(), &weights, Some(stats))
        .export_to_string(ExportFormat::Csv)
        .unwrap();
    assert!(exported.contains("AAA,0.5"));
    assert!(exported.contains("cvar,"));
}
