//! Risk measure catalogue and tail parameters.

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A scalar functional of the portfolio return distribution.
///
/// Drawdown measures come in an uncompounded form (cumulative sum of
/// returns) and a compounded `*Rel` form (cumulative product).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RiskMeasure {
    /// Standard deviation
    #[default]
    Mv,
    /// Mean absolute deviation
    Mad,
    /// Gini mean difference
    Gmd,
    /// Semi standard deviation
    Msv,
    /// Value at risk
    Var,
    /// Conditional value at risk
    Cvar,
    /// Tail Gini
    Tg,
    /// Entropic value at risk
    Evar,
    /// Range
    Rg,
    /// CVaR range
    Cvrg,
    /// Tail Gini range
    Tgrg,
    /// Worst realization
    Wr,
    /// First lower partial moment
    Flpm,
    /// Second lower partial moment
    Slpm,
    /// Maximum drawdown (uncompounded)
    Mdd,
    /// Average drawdown (uncompounded)
    Add,
    /// Drawdown at risk (uncompounded)
    Dar,
    /// Conditional drawdown at risk (uncompounded)
    Cdar,
    /// Entropic drawdown at risk (uncompounded)
    Edar,
    /// Ulcer index (uncompounded)
    Uci,
    /// Maximum drawdown (compounded)
    MddRel,
    /// Average drawdown (compounded)
    AddRel,
    /// Drawdown at risk (compounded)
    DarRel,
    /// Conditional drawdown at risk (compounded)
    CdarRel,
    /// Entropic drawdown at risk (compounded)
    EdarRel,
    /// Ulcer index (compounded)
    UciRel,
}

impl RiskMeasure {
    /// Every risk measure, in catalogue order.
    pub const ALL: [Self; 26] = [
        Self::Mv,
        Self::Mad,
        Self::Gmd,
        Self::Msv,
        Self::Var,
        Self::Cvar,
        Self::Tg,
        Self::Evar,
        Self::Rg,
        Self::Cvrg,
        Self::Tgrg,
        Self::Wr,
        Self::Flpm,
        Self::Slpm,
        Self::Mdd,
        Self::Add,
        Self::Dar,
        Self::Cdar,
        Self::Edar,
        Self::Uci,
        Self::MddRel,
        Self::AddRel,
        Self::DarRel,
        Self::CdarRel,
        Self::EdarRel,
        Self::UciRel,
    ];

    /// Lower-case option key (`cvar`, `mdd_rel`, ...).
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Mv => "mv",
            Self::Mad => "mad",
            Self::Gmd => "gmd",
            Self::Msv => "msv",
            Self::Var => "var",
            Self::Cvar => "cvar",
            Self::Tg => "tg",
            Self::Evar => "evar",
            Self::Rg => "rg",
            Self::Cvrg => "cvrg",
            Self::Tgrg => "tgrg",
            Self::Wr => "wr",
            Self::Flpm => "flpm",
            Self::Slpm => "slpm",
            Self::Mdd => "mdd",
            Self::Add => "add",
            Self::Dar => "dar",
            Self::Cdar => "cdar",
            Self::Edar => "edar",
            Self::Uci => "uci",
            Self::MddRel => "mdd_rel",
            Self::AddRel => "add_rel",
            Self::DarRel => "dar_rel",
            Self::CdarRel => "cdar_rel",
            Self::EdarRel => "edar_rel",
            Self::UciRel => "uci_rel",
        }
    }

    /// Short code used by optimizers (`CVaR`, `MDD_Rel`, ...).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Mv => "MV",
            Self::Mad => "MAD",
            Self::Gmd => "GMD",
            Self::Msv => "MSV",
            Self::Var => "VaR",
            Self::Cvar => "CVaR",
            Self::Tg => "TG",
            Self::Evar => "EVaR",
            Self::Rg => "RG",
            Self::Cvrg => "CVRG",
            Self::Tgrg => "TGRG",
            Self::Wr => "WR",
            Self::Flpm => "FLPM",
            Self::Slpm => "SLPM",
            Self::Mdd => "MDD",
            Self::Add => "ADD",
            Self::Dar => "DaR",
            Self::Cdar => "CDaR",
            Self::Edar => "EDaR",
            Self::Uci => "UCI",
            Self::MddRel => "MDD_Rel",
            Self::AddRel => "ADD_Rel",
            Self::DarRel => "DaR_Rel",
            Self::CdarRel => "CDaR_Rel",
            Self::EdarRel => "EDaR_Rel",
            Self::UciRel => "UCI_Rel",
        }
    }

    /// Human-readable name used in titles and reports.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mv => "volatility",
            Self::Mad => "mean absolute deviation",
            Self::Gmd => "gini mean difference",
            Self::Msv => "semi standard deviation",
            Self::Var => "value at risk (VaR)",
            Self::Cvar => "conditional value at risk (CVaR)",
            Self::Tg => "tail gini",
            Self::Evar => "entropic value at risk (EVaR)",
            Self::Rg => "range",
            Self::Cvrg => "CVaR range",
            Self::Tgrg => "tail gini range",
            Self::Wr => "worst realization",
            Self::Flpm => "first lower partial moment",
            Self::Slpm => "second lower partial moment",
            Self::Mdd => "maximum drawdown uncompounded",
            Self::Add => "average drawdown uncompounded",
            Self::Dar => "drawdown at risk (DaR) uncompounded",
            Self::Cdar => "conditional drawdown at risk (CDaR) uncompounded",
            Self::Edar => "entropic drawdown at risk (EDaR) uncompounded",
            Self::Uci => "ulcer index uncompounded",
            Self::MddRel => "maximum drawdown compounded",
            Self::AddRel => "average drawdown compounded",
            Self::DarRel => "drawdown at risk (DaR) compounded",
            Self::CdarRel => "conditional drawdown at risk (CDaR) compounded",
            Self::EdarRel => "entropic drawdown at risk (EDaR) compounded",
            Self::UciRel => "ulcer index compounded",
        }
    }

    /// Whether the measure is computed on the drawdown path.
    pub const fn is_drawdown(&self) -> bool {
        matches!(
            self,
            Self::Mdd
                | Self::Add
                | Self::Dar
                | Self::Cdar
                | Self::Edar
                | Self::Uci
                | Self::MddRel
                | Self::AddRel
                | Self::DarRel
                | Self::CdarRel
                | Self::EdarRel
                | Self::UciRel
        )
    }

    /// Whether the drawdown path is compounded.
    pub const fn is_compounded(&self) -> bool {
        matches!(
            self,
            Self::MddRel | Self::AddRel | Self::DarRel | Self::CdarRel | Self::EdarRel | Self::UciRel
        )
    }

    /// Whether annualizing the measure multiplies it by `sqrt(time factor)`.
    ///
    /// Drawdowns are path quantities over the whole sample and are reported
    /// as-is.
    pub const fn scales_with_horizon(&self) -> bool {
        !self.is_drawdown()
    }

    /// Positively homogeneous measures satisfy `risk(c w) = c risk(w)` for `c > 0`.
    ///
    /// Compounded drawdowns are the exception.
    pub const fn is_homogeneous(&self) -> bool {
        !self.is_compounded()
    }

    fn choices() -> String {
        Self::ALL
            .iter()
            .map(|m| m.key())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for RiskMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RiskMeasure {
    type Err = RiskError;

    /// Accepts the option key or the short code, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.key().eq_ignore_ascii_case(needle) || m.code().eq_ignore_ascii_case(needle))
            .ok_or_else(|| RiskError::UnknownOption {
                kind: "risk measure",
                value: s.to_string(),
                choices: Self::choices(),
            })
    }
}

/// Tail significance and simulation parameters shared by tail measures.
///
/// `beta` and `b_sim` apply to the right tail of range measures (CVRG, TGRG)
/// and default to `alpha` and `a_sim`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParams {
    /// Left-tail significance level
    pub alpha: f64,
    /// Number of CVaRs averaged by tail Gini
    pub a_sim: usize,
    /// Right-tail significance level
    pub beta: Option<f64>,
    /// Number of right-tail CVaRs averaged by tail Gini range
    pub b_sim: Option<usize>,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            a_sim: 100,
            beta: None,
            b_sim: None,
        }
    }
}

impl RiskParams {
    /// Right-tail significance level.
    pub fn beta(&self) -> f64 {
        self.beta.unwrap_or(self.alpha)
    }

    /// Right-tail simulation count.
    pub fn b_sim(&self) -> usize {
        self.b_sim.unwrap_or(self.a_sim)
    }

    /// Check that significance levels lie in (0, 1) and simulation counts are positive.
    pub fn validate(&self) -> Result<()> {
        for (label, level) in [("alpha", self.alpha), ("beta", self.beta())] {
            if !(level > 0.0 && level < 1.0) {
                return Err(RiskError::InvalidParameter(format!(
                    "{label} must be within (0, 1), got {level}"
                )));
            }
        }
        if self.a_sim == 0 || self.b_sim() == 0 {
            return Err(RiskError::InvalidParameter(
                "a_sim and b_sim must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
