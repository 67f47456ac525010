//! Option enumerations of the optimizers.
//!
//! Every option is parsed from its command-line key or its optimizer code,
//! case-insensitively, and displays as its key. Unknown names are rejected
//! with the list of accepted keys.

use crate::error::ViewError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! keyed_option {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => ($key:literal, $code:literal)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every choice, in menu order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Command-line key.
            pub const fn key(&self) -> &'static str {
                match self {
                    $(Self::$variant => $key),+
                }
            }

            /// Code understood by the optimizer.
            pub const fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }

        impl FromStr for $name {
            type Err = ViewError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|o| o.key().eq_ignore_ascii_case(needle) || o.code().eq_ignore_ascii_case(needle))
                    .ok_or_else(|| ViewError::UnknownOption {
                        kind: $kind,
                        value: s.to_string(),
                        choices: Self::ALL.iter().map(|o| o.key()).collect::<Vec<_>>().join(", "),
                    })
            }
        }
    };
}

keyed_option! {
    /// What a mean-risk optimization maximizes or minimizes.
    Objective, "objective" {
        /// Minimize risk
        MinRisk => ("minrisk", "MinRisk"),
        /// Maximize the return/risk ratio
        #[default]
        Sharpe => ("sharpe", "Sharpe"),
        /// Maximize `mu'w - lambda * risk`
        Utility => ("utility", "Utility"),
        /// Maximize return
        MaxRet => ("maxret", "MaxRet"),
        /// Equal risk contribution (NCO only)
        Erc => ("erc", "ERC"),
    }
}

impl Objective {
    /// Opening of the mean-risk portfolio title; `None` for ERC, which only NCO accepts.
    pub const fn mean_risk_title(&self) -> Option<&'static str> {
        match self {
            Self::Sharpe => Some("Maximal return/risk ratio portfolio using"),
            Self::MinRisk => Some("Minimum risk portfolio using"),
            Self::MaxRet => Some("Maximal return portfolio using"),
            Self::Utility => Some("Maximal risk averse utility function portfolio using"),
            Self::Erc => None,
        }
    }
}

keyed_option! {
    /// Hierarchical clustering portfolio model.
    HcpModel, "hierarchical model" {
        /// Hierarchical risk parity
        #[default]
        Hrp => ("HRP", "HRP"),
        /// Hierarchical equal risk contribution
        Herc => ("HERC", "HERC"),
        /// Nested clustered optimization
        Nco => ("NCO", "NCO"),
    }
}

impl HcpModel {
    /// Portfolio name used in titles.
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Hrp => "Hierarchical risk parity portfolio",
            Self::Herc => "Hierarchical equal risk contribution portfolio",
            Self::Nco => "Nested clustered optimization",
        }
    }

    /// Risk aversion of the utility objective when none is given.
    pub const fn default_risk_aversion(&self) -> f64 {
        match self {
            Self::Nco => 2.0,
            Self::Hrp | Self::Herc => 1.0,
        }
    }
}

keyed_option! {
    /// Pairwise codependence used to build clusters.
    Codependence, "codependence" {
        /// Pearson correlation
        #[default]
        Pearson => ("pearson", "pearson"),
        /// Spearman rank correlation
        Spearman => ("spearman", "spearman"),
        /// Absolute Pearson correlation
        AbsPearson => ("abs_pearson", "abs_pearson"),
        /// Absolute Spearman rank correlation
        AbsSpearman => ("abs_spearman", "abs_spearman"),
        /// Distance correlation
        Distance => ("distance", "distance"),
        /// Mutual information
        MutualInfo => ("mutual_info", "mutual_info"),
        /// Lower tail dependence
        Tail => ("tail", "tail"),
    }
}

keyed_option! {
    /// Agglomerative linkage criterion.
    Linkage, "linkage" {
        /// Nearest pair
        Single => ("single", "single"),
        /// Farthest pair
        Complete => ("complete", "complete"),
        /// Unweighted pair-group average
        Average => ("average", "average"),
        /// Weighted pair-group average
        Weighted => ("weighted", "weighted"),
        /// Distance between centroids
        Centroid => ("centroid", "centroid"),
        /// Distance between medians
        Median => ("median", "median"),
        /// Minimum variance increase
        #[default]
        Ward => ("ward", "ward"),
        /// Direct bubble hierarchical tree
        Dbht => ("dbht", "DBHT"),
    }
}

keyed_option! {
    /// Bin count rule for mutual information estimates.
    BinsInfo, "bins rule" {
        /// Knuth
        #[default]
        Kn => ("KN", "KN"),
        /// Freedman-Diaconis
        Fd => ("FD", "FD"),
        /// Scott
        Sc => ("SC", "SC"),
        /// Hacine-Gharbi and Ravier
        Hgr => ("HGR", "HGR"),
    }
}

keyed_option! {
    /// Relaxed risk parity model version.
    RelaxedVersion, "relaxed risk parity version" {
        /// Basic relaxed risk parity
        #[default]
        A => ("A", "A"),
        /// With regularization on the risk contributions
        B => ("B", "B"),
        /// With regularization and penalization
        C => ("C", "C"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sharpe", Objective::Sharpe)]
    #[case("MinRisk", Objective::MinRisk)]
    #[case("minrisk", Objective::MinRisk)]
    #[case("ERC", Objective::Erc)]
    #[case(" maxret ", Objective::MaxRet)]
    fn test_objective_accepts_key_or_code(#[case] input: &str, #[case] expected: Objective) {
        assert_eq!(input.parse::<Objective>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_option_lists_choices() {
        let err = "maxsharpe".parse::<Objective>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unknown objective 'maxsharpe'"));
        assert!(message.contains("minrisk, sharpe, utility, maxret, erc"));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!("hrp".parse::<HcpModel>().unwrap(), HcpModel::Hrp);
        assert_eq!("ABS_SPEARMAN".parse::<Codependence>().unwrap(), Codependence::AbsSpearman);
        assert_eq!("DBHT".parse::<Linkage>().unwrap(), Linkage::Dbht);
        assert_eq!("hgr".parse::<BinsInfo>().unwrap(), BinsInfo::Hgr);
        assert_eq!("b".parse::<RelaxedVersion>().unwrap(), RelaxedVersion::B);
    }

    #[test]
    fn test_display_round_trip() {
        for linkage in Linkage::ALL {
            assert_eq!(linkage.to_string().parse::<Linkage>().unwrap(), *linkage);
        }
        for codependence in Codependence::ALL {
            assert_eq!(codependence.to_string().parse::<Codependence>().unwrap(), *codependence);
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Objective::default(), Objective::Sharpe);
        assert_eq!(Linkage::default(), Linkage::Ward);
        assert_eq!(Codependence::default(), Codependence::Pearson);
        assert_eq!(BinsInfo::default(), BinsInfo::Kn);
        assert_eq!(HcpModel::Nco.title(), "Nested clustered optimization");
        assert_eq!(Objective::Erc.mean_risk_title(), None);
    }
}
