//! Argument groups shared by the optimization commands.
//!
//! Option names are taken as strings and parsed into their enums when a
//! command runs, so an unknown name is reported with the accepted keys.

use crate::CliResult;
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use portopt::{
    Budget, ChartFlags, DiversificationParams, Estimation, FrontierParams, HcpModel, HcpParams,
    MeanRiskParams, Objective, RelaxedRiskParityParams, RiskParityParams, WeightingParams,
};
use portopt_data::{DateWindow, FetchConfig, ReturnsOptions, ReturnsRequest};
use portopt_risk::{RiskMeasure, RiskParams};
use std::path::PathBuf;

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Console tables
    #[default]
    Text,
    /// One JSON document on stdout
    Json,
}

/// Assets, history window and return processing.
#[derive(Debug, Args)]
pub(crate) struct PortfolioArgs {
    /// Tickers, separated by spaces or commas
    #[arg(required = true, value_delimiter = ',')]
    pub(crate) tickers: Vec<String>,

    /// Look-back period: <n>d, <n>w, <n>mo, <n>y, ytd or max
    #[arg(long, default_value = "3y")]
    pub(crate) period: String,

    /// First day of an explicit window (YYYY-MM-DD), overrides --period
    #[arg(long)]
    pub(crate) start: Option<NaiveDate>,

    /// Last day of an explicit window (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    pub(crate) end: Option<NaiveDate>,

    /// Use log returns
    #[arg(long)]
    pub(crate) log_returns: bool,

    /// Return frequency: D, W or M
    #[arg(long, default_value = "D")]
    pub(crate) freq: String,

    /// Maximum fraction of missing returns an asset may have
    #[arg(long, default_value_t = 0.05)]
    pub(crate) max_nan: f64,

    /// Absolute return treated as an outlier, 0 disables
    #[arg(long, default_value_t = 0.0)]
    pub(crate) threshold: f64,

    /// Gap filling method: time, linear, ffill, bfill or nearest
    #[arg(long, default_value = "time")]
    pub(crate) method: String,

    /// Amount to allocate, 1 shows fractions
    #[arg(long, default_value_t = 1.0)]
    pub(crate) value: f64,

    /// Disable caching (always fetch fresh data)
    #[arg(long)]
    pub(crate) no_cache: bool,

    /// Force refresh cached data
    #[arg(long)]
    pub(crate) refresh: bool,
}

impl PortfolioArgs {
    pub(crate) fn window(&self) -> CliResult<DateWindow> {
        Ok(match self.start {
            Some(start) => DateWindow::Range {
                start,
                end: self.end,
            },
            None => DateWindow::Period(self.period.parse()?),
        })
    }

    pub(crate) fn options(&self) -> CliResult<ReturnsOptions> {
        Ok(ReturnsOptions {
            log_returns: self.log_returns,
            freq: self.freq.parse()?,
            max_nan: self.max_nan,
            threshold: self.threshold,
            fill: self.method.parse()?,
        })
    }

    pub(crate) fn request(&self) -> CliResult<ReturnsRequest> {
        let tickers = self
            .tickers
            .iter()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        Ok(ReturnsRequest::new(tickers)
            .with_window(self.window()?)
            .with_options(self.options()?))
    }

    pub(crate) const fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            use_cache: !self.no_cache,
            force_refresh: self.refresh,
        }
    }
}

/// Risk measure of the optimization and its tail parameters.
#[derive(Debug, Args)]
pub(crate) struct RiskArgs {
    /// Risk measure, e.g. MV, CVaR, MDD
    #[arg(long, default_value = "MV")]
    pub(crate) risk_measure: String,

    /// Annual risk free rate
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub(crate) rf: f64,

    /// Left-tail significance level
    #[arg(long, default_value_t = 0.05)]
    pub(crate) alpha: f64,

    /// Number of CVaRs averaged by tail Gini
    #[arg(long, default_value_t = 100)]
    pub(crate) a_sim: usize,

    /// Right-tail significance level, defaults to alpha
    #[arg(long)]
    pub(crate) beta: Option<f64>,

    /// Number of right-tail CVaRs, defaults to a-sim
    #[arg(long)]
    pub(crate) b_sim: Option<usize>,
}

impl RiskArgs {
    pub(crate) fn measure(&self) -> CliResult<RiskMeasure> {
        Ok(self.risk_measure.parse()?)
    }

    pub(crate) const fn params(&self) -> RiskParams {
        RiskParams {
            alpha: self.alpha,
            a_sim: self.a_sim,
            beta: self.beta,
            b_sim: self.b_sim,
        }
    }

    pub(crate) fn weighting(&self, value: f64) -> CliResult<WeightingParams> {
        Ok(WeightingParams {
            risk_measure: self.measure()?,
            rf: self.rf,
            risk: self.params(),
            value,
        })
    }
}

/// Estimators of expected returns and covariance.
#[derive(Debug, Args)]
pub(crate) struct EstimationArgs {
    /// Expected returns estimator: hist, ewma1 or ewma2
    #[arg(long, default_value = "hist")]
    pub(crate) mean: String,

    /// Covariance estimator, e.g. hist, ewma1, ledoit, oas
    #[arg(long, default_value = "hist")]
    pub(crate) covariance: String,

    /// Decay of the EWMA estimators
    #[arg(long, default_value_t = 0.94)]
    pub(crate) d_ewma: f64,
}

impl EstimationArgs {
    pub(crate) fn estimation(&self) -> CliResult<Estimation> {
        Ok(Estimation {
            mean: self.mean.parse()?,
            covariance: self.covariance.parse()?,
            d_ewma: self.d_ewma,
        })
    }
}

/// Mean-risk optimization settings.
#[derive(Debug, Args)]
pub(crate) struct MeanRiskArgs {
    #[command(flatten)]
    pub(crate) risk: RiskArgs,

    #[command(flatten)]
    pub(crate) estimation: EstimationArgs,

    /// Risk aversion of the utility objective
    #[arg(long, default_value_t = 1.0)]
    pub(crate) risk_aversion: f64,

    /// Minimum annual expected return
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) target_return: Option<f64>,

    /// Maximum annual risk
    #[arg(long)]
    pub(crate) target_risk: Option<f64>,

    /// Amount held short
    #[arg(long, default_value_t = 0.0)]
    pub(crate) value_short: f64,
}

impl MeanRiskArgs {
    pub(crate) fn params(&self, objective: Objective, value: f64) -> CliResult<MeanRiskParams> {
        Ok(MeanRiskParams {
            objective,
            risk_measure: self.risk.measure()?,
            rf: self.risk.rf,
            risk_aversion: self.risk_aversion,
            risk: self.risk.params(),
            target_return: self.target_return,
            target_risk: self.target_risk,
            estimation: self.estimation.estimation()?,
            budget: Budget {
                value,
                value_short: self.value_short,
            },
        })
    }
}

/// Maximum diversification and decorrelation settings.
#[derive(Debug, Args)]
pub(crate) struct DiversificationArgs {
    /// Covariance estimator, e.g. hist, ewma1, ledoit, oas
    #[arg(long, default_value = "hist")]
    pub(crate) covariance: String,

    /// Decay of the EWMA estimators
    #[arg(long, default_value_t = 0.94)]
    pub(crate) d_ewma: f64,

    /// Amount held short
    #[arg(long, default_value_t = 0.0)]
    pub(crate) value_short: f64,
}

impl DiversificationArgs {
    pub(crate) fn params(&self, value: f64) -> CliResult<DiversificationParams> {
        Ok(DiversificationParams {
            covariance: self.covariance.parse()?,
            d_ewma: self.d_ewma,
            budget: Budget {
                value,
                value_short: self.value_short,
            },
        })
    }
}

/// Efficient frontier settings.
#[derive(Debug, Args)]
pub(crate) struct FrontierArgs {
    #[command(flatten)]
    pub(crate) risk: RiskArgs,

    /// Amount held short
    #[arg(long, default_value_t = 0.0)]
    pub(crate) value_short: f64,

    /// Number of frontier portfolios
    #[arg(long, default_value_t = 20)]
    pub(crate) points: usize,

    /// Number of random portfolios
    #[arg(long, default_value_t = 100)]
    pub(crate) n_portfolios: usize,

    /// Seed of the random portfolios
    #[arg(long, default_value_t = 123)]
    pub(crate) seed: u64,

    /// Draw the capital allocation line
    #[arg(long)]
    pub(crate) tangency: bool,
}

impl FrontierArgs {
    pub(crate) fn params(&self, value: f64) -> CliResult<FrontierParams> {
        Ok(FrontierParams {
            risk_measure: self.risk.measure()?,
            rf: self.risk.rf,
            risk: self.risk.params(),
            budget: Budget {
                value,
                value_short: self.value_short,
            },
            points: self.points,
            n_portfolios: self.n_portfolios,
            seed: self.seed,
            tangency: self.tangency,
        })
    }
}

/// Risk parity settings.
#[derive(Debug, Args)]
pub(crate) struct RiskParityArgs {
    #[command(flatten)]
    pub(crate) risk: RiskArgs,

    #[command(flatten)]
    pub(crate) estimation: EstimationArgs,

    /// Risk budget per asset, comma separated, equal by default
    #[arg(long, value_delimiter = ',')]
    pub(crate) risk_cont: Option<Vec<f64>>,

    /// Minimum annual expected return
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) target_return: Option<f64>,
}

impl RiskParityArgs {
    pub(crate) fn params(&self, value: f64) -> CliResult<RiskParityParams> {
        Ok(RiskParityParams {
            risk_measure: self.risk.measure()?,
            risk_cont: self.risk_cont.clone(),
            rf: self.risk.rf,
            risk: self.risk.params(),
            target_return: self.target_return,
            estimation: self.estimation.estimation()?,
            value,
        })
    }
}

/// Relaxed risk parity settings.
#[derive(Debug, Args)]
pub(crate) struct RelaxedArgs {
    /// Relaxation: A, B or C
    #[arg(long, default_value = "A")]
    pub(crate) version: String,

    #[command(flatten)]
    pub(crate) estimation: EstimationArgs,

    /// Risk budget per asset, comma separated, equal by default
    #[arg(long, value_delimiter = ',')]
    pub(crate) risk_cont: Option<Vec<f64>>,

    /// Penalty of the relaxation term
    #[arg(long, default_value_t = 1.0)]
    pub(crate) penal_factor: f64,

    /// Minimum annual expected return
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) target_return: Option<f64>,
}

impl RelaxedArgs {
    pub(crate) fn params(&self, value: f64) -> CliResult<RelaxedRiskParityParams> {
        Ok(RelaxedRiskParityParams {
            version: self.version.parse()?,
            risk_cont: self.risk_cont.clone(),
            penal_factor: self.penal_factor,
            target_return: self.target_return,
            estimation: self.estimation.estimation()?,
            value,
        })
    }
}

/// Hierarchical clustering portfolio settings.
#[derive(Debug, Args)]
pub(crate) struct HcpArgs {
    /// Codependence of the clustering, e.g. pearson, spearman, tail
    #[arg(long, default_value = "pearson")]
    pub(crate) codependence: String,

    /// Covariance estimator, e.g. hist, ewma1, ledoit, oas
    #[arg(long, default_value = "hist")]
    pub(crate) covariance: String,

    /// NCO objective: minrisk, utility, sharpe, maxret or erc
    #[arg(long, default_value = "minrisk")]
    pub(crate) objective: String,

    #[command(flatten)]
    pub(crate) risk: RiskArgs,

    /// Risk aversion of the NCO utility objective, 2 for NCO and 1 otherwise
    #[arg(long)]
    pub(crate) risk_aversion: Option<f64>,

    /// Linkage of the clustering, e.g. single, average, ward
    #[arg(long, default_value = "ward")]
    pub(crate) linkage: String,

    /// Number of clusters, found by the gap statistic when absent
    #[arg(long)]
    pub(crate) k: Option<usize>,

    /// Largest number of clusters the gap statistic considers
    #[arg(long, default_value_t = 10)]
    pub(crate) max_k: usize,

    /// Bins rule of the mutual information codependence: KN, FD, SC or HGR
    #[arg(long, default_value = "KN")]
    pub(crate) bins_info: String,

    /// Significance level of the tail codependence
    #[arg(long, default_value_t = 0.05)]
    pub(crate) alpha_tail: f64,

    /// Keep the linkage leaf order instead of the optimal one
    #[arg(long)]
    pub(crate) no_leaf_order: bool,

    /// Decay of the EWMA estimators
    #[arg(long, default_value_t = 0.94)]
    pub(crate) d_ewma: f64,
}

impl HcpArgs {
    pub(crate) fn params(&self, model: HcpModel, value: f64) -> CliResult<HcpParams> {
        Ok(HcpParams {
            model,
            codependence: self.codependence.parse()?,
            covariance: self.covariance.parse()?,
            objective: self.objective.parse()?,
            risk_measure: self.risk.measure()?,
            rf: self.risk.rf,
            risk_aversion: self.risk_aversion,
            risk: self.risk.params(),
            linkage: self.linkage.parse()?,
            k: self.k,
            max_k: self.max_k,
            bins_info: self.bins_info.parse()?,
            alpha_tail: self.alpha_tail,
            leaf_order: !self.no_leaf_order,
            d_ewma: self.d_ewma,
            value,
        })
    }
}

/// Charts and result destinations.
#[derive(Debug, Args)]
pub(crate) struct OutputArgs {
    /// Pie chart of the weights
    #[arg(long)]
    pub(crate) pie: bool,

    /// Histogram of the portfolio returns
    #[arg(long)]
    pub(crate) hist: bool,

    /// Drawdown chart of the portfolio
    #[arg(long)]
    pub(crate) dd: bool,

    /// Risk contribution chart
    #[arg(long)]
    pub(crate) rc_chart: bool,

    /// Clustered correlation heat map
    #[arg(long)]
    pub(crate) heat: bool,

    /// Write charts as HTML files into this directory instead of opening a browser
    #[arg(long)]
    pub(crate) charts: Option<PathBuf>,

    /// Export the allocation to a .csv or .json file
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,

    /// Output format; json prints the allocation report, or null without a solution
    #[arg(long, value_enum, default_value_t)]
    pub(crate) format: OutputFormat,
}

impl OutputArgs {
    pub(crate) const fn flags(&self) -> ChartFlags {
        ChartFlags {
            pie: self.pie,
            hist: self.hist,
            dd: self.dd,
            rc_chart: self.rc_chart,
            heat: self.heat,
        }
    }
}
