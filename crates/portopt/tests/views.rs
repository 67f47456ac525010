//! Display operations against in-memory collaborators.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use ndarray::Array2;
use plotly::Plot;
use portopt::data::{
    DataError, DateWindow, Frequency, Period, PropertyProvider, ReturnTable, ReturnsProvider,
    ReturnsRequest,
};
use portopt::output::{ChartError, ChartSink};
use portopt::risk::{Dendrogram, Merge, RiskMeasure, Weights};
use portopt::{
    DiversificationParams, FrontierGenerator, FrontierParams, HcpModel, HcpParams,
    HierarchicalOptimizer, MeanRiskOptimizer, MeanRiskParams, NO_SOLUTION, Objective,
    PortfolioViews, RelaxedRiskParityParams, RiskParityOptimizer, RiskParityParams, ViewError,
    WeightBuilder, WeightingParams,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const TICKERS: [&str; 4] = ["AAPL", "MSFT", "GOOG", "AMZN"];

#[derive(Debug)]
struct FixedReturns {
    table: Option<ReturnTable>,
    properties: HashMap<String, f64>,
}

impl FixedReturns {
    fn new() -> Self {
        let tickers: Vec<String> = TICKERS.iter().map(|s| s.to_string()).collect();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..30).map(|i| start + Duration::days(i)).collect();
        let values = Array2::from_shape_fn((30, 4), |(t, j)| {
            0.01 * ((t * (j + 1)) as f64 * 0.37).sin() + 0.0005 * j as f64
        });
        let properties = tickers
            .iter()
            .zip([3.0, 2.0, 1.0, 2.0])
            .map(|(t, v)| (t.clone(), v))
            .collect();
        Self {
            table: Some(ReturnTable::new(tickers, dates, values).unwrap()),
            properties,
        }
    }

    fn failing() -> Self {
        Self {
            table: None,
            properties: HashMap::new(),
        }
    }
}

impl ReturnsProvider for FixedReturns {
    async fn fetch_returns(&self, _: &ReturnsRequest) -> portopt::data::Result<ReturnTable> {
        self.table
            .clone()
            .ok_or_else(|| DataError::InvalidSymbol("no data".to_string()))
    }
}

impl PropertyProvider for FixedReturns {
    async fn fetch_property(
        &self,
        tickers: &[String],
        _: &str,
    ) -> portopt::data::Result<HashMap<String, f64>> {
        Ok(tickers
            .iter()
            .filter_map(|t| self.properties.get(t).map(|v| (t.clone(), *v)))
            .collect())
    }
}

/// Returns equal weights from every optimizer, or nothing when `solvable` is false.
#[derive(Debug, Default)]
struct StubEngine {
    solvable: bool,
    hcp_calls: RefCell<Vec<(HcpModel, f64)>>,
}

impl StubEngine {
    fn solve(&self, returns: &ReturnTable, value: f64) -> Option<Weights> {
        self.solvable.then(|| self.equal_weights(returns.tickers(), value))
    }
}

impl WeightBuilder for StubEngine {
    fn equal_weights(&self, tickers: &[String], value: f64) -> Weights {
        let share = value / tickers.len() as f64;
        tickers.iter().map(|t| (t.clone(), share)).collect()
    }

    fn property_weights(
        &self,
        tickers: &[String],
        property: &HashMap<String, f64>,
        value: f64,
    ) -> Option<Weights> {
        let values: Option<Vec<f64>> = tickers.iter().map(|t| property.get(t).copied()).collect();
        let values = values?;
        let total: f64 = values.iter().sum();
        Some(Weights::from_parts(
            tickers,
            &values.iter().map(|v| value * v / total).collect::<Vec<_>>(),
        ))
    }
}

impl MeanRiskOptimizer for StubEngine {
    fn mean_risk(&self, returns: &ReturnTable, _: Frequency, p: &MeanRiskParams) -> Option<Weights> {
        self.solve(returns, p.budget.value)
    }

    fn max_diversification(
        &self,
        returns: &ReturnTable,
        p: &DiversificationParams,
    ) -> Option<Weights> {
        self.solve(returns, p.budget.value)
    }

    fn max_decorrelation(
        &self,
        returns: &ReturnTable,
        p: &DiversificationParams,
    ) -> Option<Weights> {
        self.solve(returns, p.budget.value)
    }
}

impl RiskParityOptimizer for StubEngine {
    fn risk_parity(
        &self,
        returns: &ReturnTable,
        _: Frequency,
        p: &RiskParityParams,
    ) -> Option<Weights> {
        self.solve(returns, p.value)
    }

    fn relaxed_risk_parity(
        &self,
        returns: &ReturnTable,
        _: Frequency,
        p: &RelaxedRiskParityParams,
    ) -> Option<Weights> {
        self.solve(returns, p.value)
    }
}

impl HierarchicalOptimizer for StubEngine {
    fn hcp(&self, returns: &ReturnTable, _: Frequency, p: &HcpParams) -> Option<Weights> {
        self.hcp_calls.borrow_mut().push((p.model, p.risk_aversion()));
        self.solve(returns, p.value)
    }

    fn dendrogram(&self, returns: &ReturnTable, _: &HcpParams) -> Option<Dendrogram> {
        Dendrogram::new(
            returns.tickers().to_vec(),
            vec![
                Merge { left: 0, right: 1, height: 0.2, size: 2 },
                Merge { left: 2, right: 3, height: 0.3, size: 2 },
                Merge { left: 4, right: 5, height: 0.9, size: 4 },
            ],
            None,
        )
        .ok()
    }
}

impl FrontierGenerator for StubEngine {
    fn efficient_frontier(
        &self,
        returns: &ReturnTable,
        _: Frequency,
        p: &FrontierParams,
    ) -> Option<Vec<Weights>> {
        if !self.solvable {
            return None;
        }
        let n = returns.n_assets();
        Some(
            (0..p.points)
                .map(|k| {
                    let tilt = k as f64 / p.points as f64;
                    let mut values = vec![(1.0 - tilt) / n as f64; n];
                    values[0] += tilt;
                    Weights::from_parts(returns.tickers(), &values)
                })
                .collect(),
        )
    }

    fn random_portfolios(&self, tickers: &[String], n: usize, _: u64) -> Vec<Weights> {
        (0..n).map(|_| self.equal_weights(tickers, 1.0)).collect()
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

fn views(
    solvable: bool,
) -> (PortfolioViews<FixedReturns, StubEngine, Vec<u8>>, SharedSink) {
    let sink = SharedSink::default();
    let views = PortfolioViews::new(
        FixedReturns::new(),
        StubEngine {
            solvable,
            ..Default::default()
        },
        Vec::new(),
        Box::new(sink.clone()),
    )
    .with_today(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    (views, sink)
}

fn request() -> ReturnsRequest {
    ReturnsRequest::new(TICKERS.iter().map(|s| s.to_string()).collect())
        .with_window(DateWindow::Period(Period::Years(3)))
}

fn text(views: PortfolioViews<FixedReturns, StubEngine, Vec<u8>>) -> String {
    String::from_utf8(views.into_out()).unwrap()
}

#[tokio::test]
async fn test_equal_weight_end_to_end() {
    let (mut views, _) = views(true);
    let allocation = views
        .display_equal_weight(&request(), &WeightingParams::default())
        .await
        .unwrap()
        .unwrap();

    for (_, w) in allocation.weights.iter() {
        assert_relative_eq!(w, 0.25);
    }
    let mean = allocation.returns.mean().sum() / 4.0;
    assert_relative_eq!(allocation.stats.expected_return, mean * 252.0, epsilon = 1e-12);

    let out = text(views);
    assert!(out.contains("[3 Years] Equally Weighted Portfolio"));
    assert!(out.contains("Weights"));
    assert!(out.contains("25.00 %"));
    assert!(out.contains("Annual (by 252) expected return"));
    assert!(out.contains("Annual (by √252) volatility"));
    assert!(out.contains("Sharpe ratio"));
}

#[tokio::test]
async fn test_no_solution_writes_one_line() {
    let (mut views, sink) = views(false);
    let result = views
        .display_max_sharpe(&request(), &MeanRiskParams::default())
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(sink.0.borrow().is_empty());
    assert_eq!(text(views), format!("{NO_SOLUTION}\n"));
}

#[tokio::test]
async fn test_every_optimizer_view_reports_no_solution() {
    let (mut views, _) = views(false);
    let req = request();
    assert!(views.display_min_risk(&req, &MeanRiskParams::default()).await.unwrap().is_none());
    assert!(views.display_max_div(&req, &DiversificationParams::default()).await.unwrap().is_none());
    assert!(views.display_max_decorr(&req, &DiversificationParams::default()).await.unwrap().is_none());
    assert!(views.display_risk_parity(&req, &RiskParityParams::default()).await.unwrap().is_none());
    assert!(
        views
            .display_rel_risk_parity(&req, &RelaxedRiskParityParams::default())
            .await
            .unwrap()
            .is_none()
    );
    assert!(views.display_hrp(&req, &HcpParams::default()).await.unwrap().is_none());
    assert!(views.display_ef(&req, &FrontierParams::default(), None).await.unwrap().is_none());

    let out = text(views);
    assert_eq!(out.lines().count(), 7);
    assert!(out.lines().all(|l| l == NO_SOLUTION));
}

#[tokio::test]
async fn test_mean_risk_titles() {
    let (mut views, _) = views(true);
    let params = MeanRiskParams {
        risk_measure: RiskMeasure::Cvar,
        ..MeanRiskParams::default()
    };
    let allocation = views.display_min_risk(&request(), &params).await.unwrap().unwrap();
    assert_eq!(
        allocation.title,
        "[3 Years] Minimum risk portfolio using\nconditional value at risk (CVaR) as risk measure"
    );
    assert_eq!(allocation.name, "Min Risk");

    let out = text(views);
    assert!(out.contains("Annual (by √252) conditional value at risk (CVaR) : "));
    assert!(out.contains("Return / conditional value at risk (CVaR) ratio: "));
}

#[tokio::test]
async fn test_erc_is_rejected_for_mean_risk() {
    let (mut views, _) = views(true);
    let params = MeanRiskParams {
        objective: Objective::Erc,
        ..MeanRiskParams::default()
    };
    let err = views.display_mean_risk(&request(), &params).await.unwrap_err();
    assert!(matches!(err, ViewError::InvalidParameter(_)));
}

#[tokio::test]
async fn test_hcp_title() {
    let (mut views, _) = views(true);
    let allocation = views
        .display_herc(&request(), &HcpParams::for_model(HcpModel::Herc))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        allocation.title,
        "[3 Years] Hierarchical equal risk contribution portfolio using pearson codependence,\nward linkage and volatility as risk measure"
    );
    assert_eq!(allocation.name, "HERC");
}

#[tokio::test]
async fn test_nco_risk_aversion_defaults_to_two() {
    let (mut views, _) = views(true);
    views.display_nco(&request(), &HcpParams::default()).await.unwrap();
    views.display_hrp(&request(), &HcpParams::default()).await.unwrap();
    let chosen = HcpParams {
        risk_aversion: Some(3.5),
        ..HcpParams::default()
    };
    views.display_nco(&request(), &chosen).await.unwrap();

    assert_eq!(
        *views.engine().hcp_calls.borrow(),
        vec![(HcpModel::Nco, 2.0), (HcpModel::Hrp, 1.0), (HcpModel::Nco, 3.5)]
    );
}

#[tokio::test]
async fn test_property_weighting() {
    let (mut views, _) = views(true);
    let allocation = views
        .display_property_weighting(&request(), None, &WeightingParams::default())
        .await
        .unwrap()
        .unwrap();
    assert_relative_eq!(allocation.weights.get("AAPL").unwrap(), 0.375);

    let out = text(views);
    assert!(out.contains("[3 Years] Weighted Portfolio based on marketCap"));
    assert!(out.contains("37.50 %"));
}

#[tokio::test]
async fn test_currency_budget_is_shown_in_dollars() {
    let (mut views, _) = views(true);
    let params = WeightingParams {
        value: 10_000.0,
        ..WeightingParams::default()
    };
    views.display_equal_weight(&request(), &params).await.unwrap();
    assert!(text(views).contains("2500.00 $"));
}

#[tokio::test]
async fn test_frontier_chart_is_emitted() {
    let (mut views, sink) = views(true);
    let params = FrontierParams {
        n_portfolios: 5,
        tangency: true,
        ..FrontierParams::default()
    };
    let allocation = views.display_ef(&request(), &params, None).await.unwrap().unwrap();

    assert_eq!(*sink.0.borrow(), vec!["ef".to_string()]);
    assert_eq!(allocation.title, "[3 Years] Efficient Frontier simulating 5 portfolios");
    assert!(text(views).is_empty());
}

#[tokio::test]
async fn test_frontier_on_surface_skips_sink() {
    let (mut views, sink) = views(true);
    let mut plot = Plot::new();
    views
        .display_ef(&request(), &FrontierParams::default(), Some(&mut plot))
        .await
        .unwrap();
    assert!(sink.0.borrow().is_empty());
}

#[tokio::test]
async fn test_data_errors_propagate() {
    let mut views = PortfolioViews::new(
        FixedReturns::failing(),
        StubEngine { solvable: true, ..Default::default() },
        Vec::new(),
        Box::new(SharedSink::default()),
    );
    let err = views
        .display_equal_weight(&request(), &WeightingParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ViewError::Data(_)));
}

#[tokio::test]
async fn test_allocation_feeds_additional_plots() {
    let (mut views, sink) = views(true);
    let allocation = views
        .display_hrp(&request(), &HcpParams::default())
        .await
        .unwrap()
        .unwrap();

    let flags = portopt::ChartFlags {
        pie: true,
        hist: true,
        dd: true,
        rc_chart: true,
        heat: true,
    };
    let engine = StubEngine { solvable: true, ..Default::default() };
    let mut charts = sink.clone();
    portopt::additional_plots(&allocation.plot_input(), flags, &engine, None, &mut charts).unwrap();

    assert_eq!(*sink.0.borrow(), vec!["pie", "hist", "dd", "rc", "heat"]);
    assert_eq!(allocation.report().title, "HRP");
}
