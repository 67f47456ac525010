//! The display operations.
//!
//! Each view resolves the period label, fetches returns through the
//! provider, calls one collaborator and writes the title, the weights table
//! and the performance report. A collaborator without a solution makes the
//! view write [`NO_SOLUTION`] and return `Ok(None)`.

use crate::collaborators::{
    FrontierGenerator, HierarchicalOptimizer, MeanRiskOptimizer, RiskParityOptimizer,
    WeightBuilder,
};
use crate::display::{display_weights, portfolio_performance};
use crate::error::{Result, ViewError};
use crate::options::{HcpModel, Objective};
use crate::params::{
    DiversificationParams, FrontierParams, HcpParams, MeanRiskParams, RelaxedRiskParityParams,
    RiskParityParams, WeightingParams,
};
use crate::plots::PlotInput;
use chrono::{NaiveDate, Utc};
use plotly::Plot;
use portopt_data::{
    DEFAULT_PROPERTY, Frequency, PropertyProvider, ReturnTable, ReturnsProvider, ReturnsRequest,
    period_label,
};
use portopt_output::{AllocationReport, Chart, ChartSink, FrontierChart, FrontierInput, draw};
use portopt_risk::{PerformanceStats, RiskMeasure, RiskParams, Weights};
use std::fmt;
use std::io::{self, Write};
use tracing::{debug, info, instrument};

/// Line written when an optimizer finds no solution.
pub const NO_SOLUTION: &str = "There is no solution with this parameters";

/// A displayed portfolio with everything needed to chart or export it.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Short name used in chart titles, e.g. `Max Sharpe`
    pub name: String,
    /// Console title including the period label
    pub title: String,
    /// Optimized weights
    pub weights: Weights,
    /// Returns the weights were built on
    pub returns: ReturnTable,
    /// Return frequency
    pub freq: Frequency,
    /// Measure of the performance report
    pub risk_measure: RiskMeasure,
    /// Annual risk free rate
    pub rf: f64,
    /// Tail parameters
    pub risk: RiskParams,
    /// Annualized performance
    pub stats: PerformanceStats,
}

impl Allocation {
    /// Chart input of this portfolio.
    pub fn plot_input(&self) -> PlotInput<'_> {
        PlotInput {
            weights: &self.weights,
            returns: &self.returns,
            title: &self.name,
            freq: self.freq,
            risk_measure: self.risk_measure,
            rf: self.rf,
            risk: self.risk,
        }
    }

    /// JSON/CSV report of this portfolio.
    pub fn report(&self) -> AllocationReport {
        AllocationReport::new(self.name.clone(), &self.weights, Some(self.stats))
    }
}

/// How the performance of a view is reported.
#[derive(Debug, Clone, Copy)]
struct Reporting {
    measure: RiskMeasure,
    rf: f64,
    risk: RiskParams,
}

/// Runs the display operations against a returns provider and an optimizer engine.
pub struct PortfolioViews<P, E, W = io::Stdout> {
    provider: P,
    engine: E,
    out: W,
    sink: Box<dyn ChartSink>,
    today: NaiveDate,
}

impl<P: fmt::Debug, E: fmt::Debug, W> fmt::Debug for PortfolioViews<P, E, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortfolioViews")
            .field("provider", &self.provider)
            .field("engine", &self.engine)
            .field("today", &self.today)
            .finish_non_exhaustive()
    }
}

impl<P, E, W: Write> PortfolioViews<P, E, W> {
    /// Views writing console text to `out` and charts to `sink`.
    pub fn new(provider: P, engine: E, out: W, sink: Box<dyn ChartSink>) -> Self {
        Self {
            provider,
            engine,
            out,
            sink,
            today: Utc::now().date_naive(),
        }
    }

    /// Resolve periods relative to `today` instead of the current date.
    pub const fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Optimizer engine.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Console output.
    pub const fn out(&self) -> &W {
        &self.out
    }

    /// Chart sink.
    pub fn sink(&mut self) -> &mut dyn ChartSink {
        self.sink.as_mut()
    }

    /// Console output, consuming the views.
    pub fn into_out(self) -> W {
        self.out
    }

    fn label(&self, request: &ReturnsRequest) -> String {
        period_label(&request.window, self.today)
    }

    fn no_solution(&mut self) -> Result<Option<Allocation>> {
        info!("optimizer returned no solution");
        writeln!(self.out, "{NO_SOLUTION}")?;
        Ok(None)
    }

    /// Write title, weights and performance, and package the allocation.
    fn present(
        &mut self,
        name: &str,
        title: String,
        weights: Weights,
        returns: ReturnTable,
        freq: Frequency,
        reporting: Reporting,
    ) -> Result<Option<Allocation>> {
        writeln!(self.out)?;
        writeln!(self.out, "{title}")?;
        display_weights(&mut self.out, &weights, false)?;
        let stats = portfolio_performance(
            &mut self.out,
            &weights,
            &returns,
            reporting.measure,
            reporting.rf,
            &reporting.risk,
            freq,
        )?;
        writeln!(self.out)?;
        Ok(Some(Allocation {
            name: name.to_string(),
            title,
            weights,
            returns,
            freq,
            risk_measure: reporting.measure,
            rf: reporting.rf,
            risk: reporting.risk,
            stats,
        }))
    }
}

impl<P: ReturnsProvider, E, W: Write> PortfolioViews<P, E, W> {
    async fn load(&self, request: &ReturnsRequest) -> Result<ReturnTable> {
        let returns = self.provider.fetch_returns(request).await?;
        debug!(
            assets = returns.n_assets(),
            periods = returns.n_periods(),
            "returns loaded"
        );
        Ok(returns)
    }
}

impl<P: ReturnsProvider, E: WeightBuilder, W: Write> PortfolioViews<P, E, W> {
    /// Equally weighted portfolio.
    #[instrument(skip_all, fields(assets = request.tickers.len()))]
    pub async fn display_equal_weight(
        &mut self,
        request: &ReturnsRequest,
        params: &WeightingParams,
    ) -> Result<Option<Allocation>> {
        let title = format!("{} Equally Weighted Portfolio", self.label(request));
        let returns = self.load(request).await?;
        let weights = self.engine.equal_weights(returns.tickers(), params.value);
        self.present(
            "Equally Weighted",
            title,
            weights,
            returns,
            request.options.freq,
            Reporting {
                measure: params.risk_measure,
                rf: params.rf,
                risk: params.risk,
            },
        )
    }
}

impl<P, E, W> PortfolioViews<P, E, W>
where
    P: ReturnsProvider + PropertyProvider,
    E: WeightBuilder,
    W: Write,
{
    /// Portfolio weighted by an asset property, market capitalization by default.
    #[instrument(skip_all, fields(assets = request.tickers.len(), property = property.unwrap_or(DEFAULT_PROPERTY)))]
    pub async fn display_property_weighting(
        &mut self,
        request: &ReturnsRequest,
        property: Option<&str>,
        params: &WeightingParams,
    ) -> Result<Option<Allocation>> {
        let property = property.unwrap_or(DEFAULT_PROPERTY);
        let title = format!(
            "{} Weighted Portfolio based on {property}",
            self.label(request)
        );
        let returns = self.load(request).await?;
        let values = self
            .provider
            .fetch_property(returns.tickers(), property)
            .await?;
        let Some(weights) = self
            .engine
            .property_weights(returns.tickers(), &values, params.value)
        else {
            return self.no_solution();
        };
        self.present(
            "Property Weighted",
            title,
            weights,
            returns,
            request.options.freq,
            Reporting {
                measure: params.risk_measure,
                rf: params.rf,
                risk: params.risk,
            },
        )
    }
}

impl<P: ReturnsProvider, E: MeanRiskOptimizer, W: Write> PortfolioViews<P, E, W> {
    /// Mean-risk portfolio for `params.objective`.
    ///
    /// # Errors
    ///
    /// The ERC objective is rejected; it is only meaningful for NCO.
    #[instrument(skip_all, fields(assets = request.tickers.len(), objective = %params.objective, risk_measure = %params.risk_measure))]
    pub async fn display_mean_risk(
        &mut self,
        request: &ReturnsRequest,
        params: &MeanRiskParams,
    ) -> Result<Option<Allocation>> {
        let Some(opening) = params.objective.mean_risk_title() else {
            return Err(ViewError::InvalidParameter(format!(
                "objective {} is only available for NCO",
                params.objective
            )));
        };
        let title = format!(
            "{} {opening}\n{} as risk measure",
            self.label(request),
            params.risk_measure.name()
        );
        let freq = request.options.freq;
        let returns = self.load(request).await?;
        let Some(weights) = self.engine.mean_risk(&returns, freq, params) else {
            return self.no_solution();
        };
        self.present(
            mean_risk_name(params.objective),
            title,
            weights,
            returns,
            freq,
            Reporting {
                measure: params.risk_measure,
                rf: params.rf,
                risk: params.risk,
            },
        )
    }

    /// Maximal return/risk ratio portfolio.
    pub async fn display_max_sharpe(
        &mut self,
        request: &ReturnsRequest,
        params: &MeanRiskParams,
    ) -> Result<Option<Allocation>> {
        self.display_objective(request, params, Objective::Sharpe).await
    }

    /// Minimum risk portfolio.
    pub async fn display_min_risk(
        &mut self,
        request: &ReturnsRequest,
        params: &MeanRiskParams,
    ) -> Result<Option<Allocation>> {
        self.display_objective(request, params, Objective::MinRisk).await
    }

    /// Maximal risk averse utility portfolio.
    pub async fn display_max_util(
        &mut self,
        request: &ReturnsRequest,
        params: &MeanRiskParams,
    ) -> Result<Option<Allocation>> {
        self.display_objective(request, params, Objective::Utility).await
    }

    /// Maximal return portfolio.
    pub async fn display_max_ret(
        &mut self,
        request: &ReturnsRequest,
        params: &MeanRiskParams,
    ) -> Result<Option<Allocation>> {
        self.display_objective(request, params, Objective::MaxRet).await
    }

    async fn display_objective(
        &mut self,
        request: &ReturnsRequest,
        params: &MeanRiskParams,
        objective: Objective,
    ) -> Result<Option<Allocation>> {
        let params = MeanRiskParams {
            objective,
            ..params.clone()
        };
        self.display_mean_risk(request, &params).await
    }

    /// Maximal diversification portfolio, reported with MV and a zero risk free rate.
    #[instrument(skip_all, fields(assets = request.tickers.len()))]
    pub async fn display_max_div(
        &mut self,
        request: &ReturnsRequest,
        params: &DiversificationParams,
    ) -> Result<Option<Allocation>> {
        let title = format!(
            "{} Display a maximal diversification portfolio",
            self.label(request)
        );
        let returns = self.load(request).await?;
        let Some(weights) = self.engine.max_diversification(&returns, params) else {
            return self.no_solution();
        };
        self.present(
            "Max Diversification",
            title,
            weights,
            returns,
            request.options.freq,
            Reporting {
                measure: RiskMeasure::Mv,
                rf: 0.0,
                risk: RiskParams::default(),
            },
        )
    }

    /// Maximal decorrelation portfolio, reported with MV and a zero risk free rate.
    #[instrument(skip_all, fields(assets = request.tickers.len()))]
    pub async fn display_max_decorr(
        &mut self,
        request: &ReturnsRequest,
        params: &DiversificationParams,
    ) -> Result<Option<Allocation>> {
        let title = format!(
            "{} Display a maximal decorrelation portfolio",
            self.label(request)
        );
        let returns = self.load(request).await?;
        let Some(weights) = self.engine.max_decorrelation(&returns, params) else {
            return self.no_solution();
        };
        self.present(
            "Max Decorrelation",
            title,
            weights,
            returns,
            request.options.freq,
            Reporting {
                measure: RiskMeasure::Mv,
                rf: 0.0,
                risk: RiskParams::default(),
            },
        )
    }
}

impl<P, E, W> PortfolioViews<P, E, W>
where
    P: ReturnsProvider,
    E: MeanRiskOptimizer + FrontierGenerator,
    W: Write,
{
    /// Efficient frontier against random portfolios, with the tangency
    /// portfolio marked. Only the chart is drawn; the tangency portfolio is
    /// returned.
    ///
    /// `surface` receives the traces instead of a standalone chart when given.
    #[instrument(skip_all, fields(assets = request.tickers.len(), risk_measure = %params.risk_measure))]
    pub async fn display_ef(
        &mut self,
        request: &ReturnsRequest,
        params: &FrontierParams,
        surface: Option<&mut Plot>,
    ) -> Result<Option<Allocation>> {
        let freq = request.options.freq;
        let returns = self.load(request).await?;

        let tangency_params = MeanRiskParams {
            objective: Objective::Sharpe,
            risk_measure: params.risk_measure,
            rf: params.rf,
            risk: params.risk,
            budget: params.budget,
            ..MeanRiskParams::default()
        };
        let Some(tangency) = self.engine.mean_risk(&returns, freq, &tangency_params) else {
            return self.no_solution();
        };
        let Some(frontier) = self.engine.efficient_frontier(&returns, freq, params) else {
            return self.no_solution();
        };
        let random =
            self.engine
                .random_portfolios(returns.tickers(), params.n_portfolios, params.seed);

        let chart = FrontierChart::new(&FrontierInput {
            returns: &returns,
            frontier: &frontier,
            random: &random,
            tangency: &tangency,
            measure: params.risk_measure,
            freq,
            rf: params.rf / freq.time_factor(),
            params: params.risk,
            capital_allocation_line: params.tangency,
        })?;
        draw(&chart, surface, self.sink.as_mut())?;

        let stats = PerformanceStats::compute(
            &tangency,
            &returns,
            freq,
            params.rf,
            params.risk_measure,
            &params.risk,
        )?;
        Ok(Some(Allocation {
            name: "Efficient Frontier".to_string(),
            title: format!("{} {}", self.label(request), chart.title()),
            weights: tangency,
            returns,
            freq,
            risk_measure: params.risk_measure,
            rf: params.rf,
            risk: params.risk,
            stats,
        }))
    }
}

impl<P: ReturnsProvider, E: RiskParityOptimizer, W: Write> PortfolioViews<P, E, W> {
    /// Risk budgeting portfolio.
    #[instrument(skip_all, fields(assets = request.tickers.len(), risk_measure = %params.risk_measure))]
    pub async fn display_risk_parity(
        &mut self,
        request: &ReturnsRequest,
        params: &RiskParityParams,
    ) -> Result<Option<Allocation>> {
        let title = format!(
            "{} Risk parity portfolio based on risk budgeting approach\nusing {} as risk measure",
            self.label(request),
            params.risk_measure.name()
        );
        let freq = request.options.freq;
        let returns = self.load(request).await?;
        let Some(weights) = self.engine.risk_parity(&returns, freq, params) else {
            return self.no_solution();
        };
        self.present(
            "Risk Parity",
            title,
            weights,
            returns,
            freq,
            Reporting {
                measure: params.risk_measure,
                rf: params.rf,
                risk: params.risk,
            },
        )
    }

    /// Relaxed risk parity portfolio, reported with MV.
    #[instrument(skip_all, fields(assets = request.tickers.len(), version = %params.version))]
    pub async fn display_rel_risk_parity(
        &mut self,
        request: &ReturnsRequest,
        params: &RelaxedRiskParityParams,
    ) -> Result<Option<Allocation>> {
        let title = format!(
            "{} Relaxed risk parity portfolio based on least squares approach",
            self.label(request)
        );
        let freq = request.options.freq;
        let returns = self.load(request).await?;
        let Some(weights) = self.engine.relaxed_risk_parity(&returns, freq, params) else {
            return self.no_solution();
        };
        self.present(
            "Relaxed Risk Parity",
            title,
            weights,
            returns,
            freq,
            Reporting {
                measure: RiskMeasure::Mv,
                rf: 0.0,
                risk: RiskParams::default(),
            },
        )
    }
}

impl<P: ReturnsProvider, E: HierarchicalOptimizer, W: Write> PortfolioViews<P, E, W> {
    /// Hierarchical clustering portfolio for `params.model`.
    #[instrument(skip_all, fields(assets = request.tickers.len(), model = %params.model, linkage = %params.linkage))]
    pub async fn display_hcp(
        &mut self,
        request: &ReturnsRequest,
        params: &HcpParams,
    ) -> Result<Option<Allocation>> {
        let title = format!(
            "{} {} using {} codependence,\n{} linkage and {} as risk measure",
            self.label(request),
            params.model.title(),
            params.codependence,
            params.linkage,
            params.risk_measure.name()
        );
        let freq = request.options.freq;
        let returns = self.load(request).await?;
        let Some(weights) = self.engine.hcp(&returns, freq, params) else {
            return self.no_solution();
        };
        self.present(
            params.model.key(),
            title,
            weights,
            returns,
            freq,
            Reporting {
                measure: params.risk_measure,
                rf: params.rf,
                risk: params.risk,
            },
        )
    }

    /// Hierarchical risk parity portfolio.
    pub async fn display_hrp(
        &mut self,
        request: &ReturnsRequest,
        params: &HcpParams,
    ) -> Result<Option<Allocation>> {
        self.display_model(request, params, HcpModel::Hrp).await
    }

    /// Hierarchical equal risk contribution portfolio.
    pub async fn display_herc(
        &mut self,
        request: &ReturnsRequest,
        params: &HcpParams,
    ) -> Result<Option<Allocation>> {
        self.display_model(request, params, HcpModel::Herc).await
    }

    /// Nested clustered optimization portfolio, with a risk aversion of 2
    /// unless `params` sets one.
    pub async fn display_nco(
        &mut self,
        request: &ReturnsRequest,
        params: &HcpParams,
    ) -> Result<Option<Allocation>> {
        self.display_model(request, params, HcpModel::Nco).await
    }

    async fn display_model(
        &mut self,
        request: &ReturnsRequest,
        params: &HcpParams,
        model: HcpModel,
    ) -> Result<Option<Allocation>> {
        let params = HcpParams {
            model,
            ..params.clone()
        };
        self.display_hcp(request, &params).await
    }
}

const fn mean_risk_name(objective: Objective) -> &'static str {
    match objective {
        Objective::Sharpe => "Max Sharpe",
        Objective::MinRisk => "Min Risk",
        Objective::Utility => "Max Util",
        Objective::MaxRet => "Max Return",
        Objective::Erc => "ERC",
    }
}
