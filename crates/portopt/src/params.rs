//! Parameter structures of the views and their collaborators.
//!
//! Risk free rates are annual everywhere; collaborators divide by the time
//! factor of the return frequency when they need a per-period rate.

use crate::options::{BinsInfo, Codependence, HcpModel, Linkage, Objective, RelaxedVersion};
use portopt_risk::{CovarianceMethod, MeanMethod, RiskMeasure, RiskParams};
use serde::{Deserialize, Serialize};

/// Expected return and covariance estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimation {
    /// Expected return estimator
    pub mean: MeanMethod,
    /// Covariance estimator
    pub covariance: CovarianceMethod,
    /// Smoothing factor of the EWMA estimators
    pub d_ewma: f64,
}

impl Default for Estimation {
    fn default() -> Self {
        Self {
            mean: MeanMethod::Hist,
            covariance: CovarianceMethod::Hist,
            d_ewma: 0.94,
        }
    }
}

/// Capital to allocate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// Amount allocated to long positions
    pub value: f64,
    /// Amount allocated to short positions
    pub value_short: f64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            value: 1.0,
            value_short: 0.0,
        }
    }
}

impl Budget {
    /// Long-only budget of `value`.
    pub const fn long_only(value: f64) -> Self {
        Self {
            value,
            value_short: 0.0,
        }
    }

    /// Net exposure, `value - value_short`.
    pub fn net(&self) -> f64 {
        self.value - self.value_short
    }
}

/// Settings of the weighting schemes that need no optimizer (equal and property weights).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightingParams {
    /// Measure reported next to volatility
    pub risk_measure: RiskMeasure,
    /// Annual risk free rate
    pub rf: f64,
    /// Tail parameters of the reported measure
    pub risk: RiskParams,
    /// Capital to allocate
    pub value: f64,
}

impl Default for WeightingParams {
    fn default() -> Self {
        Self {
            risk_measure: RiskMeasure::Mv,
            rf: 0.0,
            risk: RiskParams::default(),
            value: 1.0,
        }
    }
}

/// Mean-risk optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanRiskParams {
    /// Objective function
    pub objective: Objective,
    /// Risk measure being minimized or constrained
    pub risk_measure: RiskMeasure,
    /// Annual risk free rate
    pub rf: f64,
    /// Risk aversion of the utility objective
    pub risk_aversion: f64,
    /// Tail parameters
    pub risk: RiskParams,
    /// Minimum annual expected return
    pub target_return: Option<f64>,
    /// Maximum annual risk
    pub target_risk: Option<f64>,
    /// Moment estimation
    pub estimation: Estimation,
    /// Capital to allocate
    pub budget: Budget,
}

impl Default for MeanRiskParams {
    fn default() -> Self {
        Self {
            objective: Objective::Sharpe,
            risk_measure: RiskMeasure::Mv,
            rf: 0.0,
            risk_aversion: 1.0,
            risk: RiskParams::default(),
            target_return: None,
            target_risk: None,
            estimation: Estimation::default(),
            budget: Budget::default(),
        }
    }
}

/// Maximum diversification and maximum decorrelation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiversificationParams {
    /// Covariance estimator
    pub covariance: CovarianceMethod,
    /// Smoothing factor of the EWMA estimators
    pub d_ewma: f64,
    /// Capital to allocate
    pub budget: Budget,
}

impl Default for DiversificationParams {
    fn default() -> Self {
        Self {
            covariance: CovarianceMethod::Hist,
            d_ewma: 0.94,
            budget: Budget::default(),
        }
    }
}

/// Risk budgeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParityParams {
    /// Risk measure whose contributions are budgeted
    pub risk_measure: RiskMeasure,
    /// Relative risk contribution per asset; equal when absent
    pub risk_cont: Option<Vec<f64>>,
    /// Annual risk free rate
    pub rf: f64,
    /// Tail parameters
    pub risk: RiskParams,
    /// Minimum annual expected return
    pub target_return: Option<f64>,
    /// Moment estimation
    pub estimation: Estimation,
    /// Capital to allocate
    pub value: f64,
}

impl Default for RiskParityParams {
    fn default() -> Self {
        Self {
            risk_measure: RiskMeasure::Mv,
            risk_cont: None,
            rf: 0.0,
            risk: RiskParams::default(),
            target_return: None,
            estimation: Estimation::default(),
            value: 1.0,
        }
    }
}

/// Relaxed risk parity through least squares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxedRiskParityParams {
    /// Model version
    pub version: RelaxedVersion,
    /// Relative risk contribution per asset; equal when absent
    pub risk_cont: Option<Vec<f64>>,
    /// Penalization factor of versions B and C
    pub penal_factor: f64,
    /// Minimum annual expected return
    pub target_return: Option<f64>,
    /// Moment estimation
    pub estimation: Estimation,
    /// Capital to allocate
    pub value: f64,
}

impl Default for RelaxedRiskParityParams {
    fn default() -> Self {
        Self {
            version: RelaxedVersion::A,
            risk_cont: None,
            penal_factor: 1.0,
            target_return: None,
            estimation: Estimation::default(),
            value: 1.0,
        }
    }
}

/// Hierarchical clustering portfolios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HcpParams {
    /// HRP, HERC or NCO
    pub model: HcpModel,
    /// Codependence turned into the clustering distance
    pub codependence: Codependence,
    /// Covariance estimator
    pub covariance: CovarianceMethod,
    /// Objective of the NCO sub-problems
    pub objective: Objective,
    /// Risk measure
    pub risk_measure: RiskMeasure,
    /// Annual risk free rate
    pub rf: f64,
    /// Risk aversion of the NCO utility objective; the model default when absent
    pub risk_aversion: Option<f64>,
    /// Tail parameters
    pub risk: RiskParams,
    /// Linkage criterion
    pub linkage: Linkage,
    /// Fixed number of clusters; chosen by the gap statistic when absent
    pub k: Option<usize>,
    /// Upper bound of the gap statistic search
    pub max_k: usize,
    /// Bin rule of mutual information
    pub bins_info: BinsInfo,
    /// Significance level of lower tail dependence
    pub alpha_tail: f64,
    /// Reorder leaves so successive leaves are close
    pub leaf_order: bool,
    /// Smoothing factor of the EWMA estimators
    pub d_ewma: f64,
    /// Capital to allocate
    pub value: f64,
}

impl Default for HcpParams {
    fn default() -> Self {
        Self {
            model: HcpModel::Hrp,
            codependence: Codependence::Pearson,
            covariance: CovarianceMethod::Hist,
            objective: Objective::MinRisk,
            risk_measure: RiskMeasure::Mv,
            rf: 0.0,
            risk_aversion: None,
            risk: RiskParams::default(),
            linkage: Linkage::Ward,
            k: None,
            max_k: 10,
            bins_info: BinsInfo::Kn,
            alpha_tail: 0.05,
            leaf_order: true,
            d_ewma: 0.94,
            value: 1.0,
        }
    }
}

impl HcpParams {
    /// Defaults of `model`.
    pub fn for_model(model: HcpModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Risk aversion in effect: the given one, otherwise 2 for NCO and 1 for
    /// the other models.
    pub fn risk_aversion(&self) -> f64 {
        self.risk_aversion
            .unwrap_or_else(|| self.model.default_risk_aversion())
    }
}

/// Efficient frontier and random portfolios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontierParams {
    /// Risk measure on the x axis
    pub risk_measure: RiskMeasure,
    /// Annual risk free rate
    pub rf: f64,
    /// Tail parameters
    pub risk: RiskParams,
    /// Capital to allocate
    pub budget: Budget,
    /// Number of frontier portfolios
    pub points: usize,
    /// Number of random portfolios
    pub n_portfolios: usize,
    /// Seed of the random portfolios
    pub seed: u64,
    /// Draw the capital allocation line
    pub tangency: bool,
}

impl Default for FrontierParams {
    fn default() -> Self {
        Self {
            risk_measure: RiskMeasure::Mv,
            rf: 0.0,
            risk: RiskParams::default(),
            budget: Budget::default(),
            points: 20,
            n_portfolios: 100,
            seed: 123,
            tangency: false,
        }
    }
}

/// Charts drawn after a portfolio is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartFlags {
    /// Pie chart of the weights
    pub pie: bool,
    /// Histogram of portfolio returns with risk measures
    pub hist: bool,
    /// Drawdown curve with drawdown risk measures
    pub dd: bool,
    /// Risk contribution per asset
    pub rc_chart: bool,
    /// Clustered correlation heat map
    pub heat: bool,
}

impl ChartFlags {
    /// Whether any chart is requested.
    pub const fn any(&self) -> bool {
        self.pie || self.hist || self.dd || self.rc_chart || self.heat
    }
}
