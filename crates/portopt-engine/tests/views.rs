//! The views driven by the reference engine.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use ndarray::Array2;
use plotly::Plot;
use portopt::data::{DateWindow, Period, ReturnTable, ReturnsProvider, ReturnsRequest};
use portopt::output::{ChartError, ChartSink, MemorySink};
use portopt::risk::RiskMeasure;
use portopt::{
    ChartFlags, FrontierParams, HcpModel, HcpParams, MeanRiskParams, NO_SOLUTION, Objective,
    PortfolioViews, RiskParityParams, additional_plots,
};
use portopt_engine::ReferenceEngine;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
struct Blocks(ReturnTable);

impl Blocks {
    /// Two factor blocks with deterministic, mildly noisy returns.
    fn new() -> Self {
        let tickers = ["AAPL", "MSFT", "XOM", "CVX", "JNJ"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let dates = (0..260).map(|i| start + Duration::days(i)).collect();
        let values = Array2::from_shape_fn((260, 5), |(t, j)| {
            let t = t as f64;
            let tech = (t * 0.71).sin() * 0.015;
            let energy = (t * 0.29).cos() * 0.010;
            let noise = ((t + 1.0) * (j as f64 + 2.0) * 1.37).sin() * 0.003;
            let drift = 0.0004 + 0.0002 * j as f64;
            match j {
                0 | 1 => drift + tech + noise,
                2 | 3 => drift + energy + noise,
                _ => drift + 0.2 * tech + 0.2 * energy + noise,
            }
        });
        Self(ReturnTable::new(tickers, dates, values).unwrap())
    }
}

impl ReturnsProvider for Blocks {
    async fn fetch_returns(&self, _: &ReturnsRequest) -> portopt::data::Result<ReturnTable> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Default, Clone)]
struct SharedSink(Rc<RefCell<Vec<String>>>);

impl ChartSink for SharedSink {
    fn emit(&mut self, name: &str, _: Plot) -> Result<(), ChartError> {
        self.0.borrow_mut().push(name.to_string());
        Ok(())
    }
}

type Views = PortfolioViews<Blocks, ReferenceEngine, Vec<u8>>;

fn views() -> (Views, SharedSink) {
    let sink = SharedSink::default();
    let views = PortfolioViews::new(
        Blocks::new(),
        ReferenceEngine::new(),
        Vec::new(),
        Box::new(sink.clone()),
    )
    .with_today(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
    (views, sink)
}

fn request() -> ReturnsRequest {
    ReturnsRequest::new(
        ["AAPL", "MSFT", "XOM", "CVX", "JNJ"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
    .with_window(DateWindow::Period(Period::Years(1)))
}

#[tokio::test]
async fn test_min_risk_view() {
    let (mut views, _) = views();
    let params = MeanRiskParams {
        objective: Objective::MinRisk,
        ..MeanRiskParams::default()
    };
    let allocation = views.display_min_risk(&request(), &params).await.unwrap().unwrap();
    assert_relative_eq!(allocation.weights.sum(), 1.0, epsilon = 1e-9);

    let out = String::from_utf8(views.into_out()).unwrap();
    assert!(out.contains("[1 Year] Minimum risk portfolio using\nvolatility as risk measure"));
    assert!(out.contains("Sharpe ratio"));
}

#[tokio::test]
async fn test_unreachable_target_prints_no_solution() {
    let (mut views, _) = views();
    let params = MeanRiskParams {
        objective: Objective::MinRisk,
        target_return: Some(10.0),
        ..MeanRiskParams::default()
    };
    assert!(views.display_min_risk(&request(), &params).await.unwrap().is_none());
    assert_eq!(String::from_utf8(views.into_out()).unwrap(), format!("{NO_SOLUTION}\n"));
}

#[tokio::test]
async fn test_risk_parity_view_in_currency() {
    let (mut views, _) = views();
    let params = RiskParityParams {
        value: 10_000.0,
        ..RiskParityParams::default()
    };
    let allocation = views.display_risk_parity(&request(), &params).await.unwrap().unwrap();
    assert_relative_eq!(allocation.weights.sum(), 10_000.0, epsilon = 1e-6);
    assert!(String::from_utf8(views.into_out()).unwrap().contains(" $"));
}

#[tokio::test]
async fn test_hierarchical_views_and_heat_map() {
    let (mut views, _) = views();
    for model in [HcpModel::Hrp, HcpModel::Herc, HcpModel::Nco] {
        let allocation = views
            .display_hcp(&request(), &HcpParams::for_model(model))
            .await
            .unwrap()
            .unwrap();
        assert_relative_eq!(allocation.weights.sum(), 1.0, epsilon = 1e-9);
        assert_eq!(allocation.name, model.key());

        let mut sink = MemorySink::default();
        let flags = ChartFlags {
            pie: true,
            rc_chart: true,
            heat: true,
            ..ChartFlags::default()
        };
        additional_plots(&allocation.plot_input(), flags, views.engine(), None, &mut sink).unwrap();
        assert_eq!(sink.names(), vec!["pie", "rc", "heat"]);
    }
}

#[tokio::test]
async fn test_efficient_frontier_view() {
    let (mut views, sink) = views();
    let params = FrontierParams {
        risk_measure: RiskMeasure::Cvar,
        n_portfolios: 25,
        ..FrontierParams::default()
    };
    let tangency = views.display_ef(&request(), &params, None).await.unwrap().unwrap();
    assert_relative_eq!(tangency.weights.sum(), 1.0, epsilon = 1e-9);
    assert_eq!(*sink.0.borrow(), vec!["ef".to_string()]);
}
