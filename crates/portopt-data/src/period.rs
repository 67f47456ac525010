//! Look-back periods, explicit date windows and their display labels.

use crate::error::{DataError, Result};
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A look-back period ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    /// `<n>d`
    Days(u32),
    /// `<n>w`
    Weeks(u32),
    /// `<n>mo`
    Months(u32),
    /// `<n>y`
    Years(u32),
    /// `ytd`
    YearToDate,
    /// `max`
    Max,
}

impl Default for Period {
    fn default() -> Self {
        Self::Years(3)
    }
}

impl Period {
    /// First calendar day covered by the period, `None` for [`Period::Max`].
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Self::Days(n) => today.checked_sub_days(Days::new(u64::from(n))),
            Self::Weeks(n) => today.checked_sub_days(Days::new(7 * u64::from(n))),
            Self::Months(n) => today.checked_sub_months(Months::new(n)),
            Self::Years(n) => today.checked_sub_months(Months::new(12 * n)),
            Self::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            Self::Max => None,
        }
    }

    /// Bracketed label such as `[3 Years]` or `[Year-to-Date]`.
    pub fn label(&self) -> String {
        let (n, unit) = match *self {
            Self::YearToDate => return "[Year-to-Date]".to_string(),
            Self::Max => return "[All-time]".to_string(),
            Self::Days(n) => (n, "Day"),
            Self::Weeks(n) => (n, "Week"),
            Self::Months(n) => (n, "Month"),
            Self::Years(n) => (n, "Year"),
        };
        if n == 1 {
            format!("[1 {unit}]")
        } else {
            format!("[{n} {unit}s]")
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{n}d"),
            Self::Weeks(n) => write!(f, "{n}w"),
            Self::Months(n) => write!(f, "{n}mo"),
            Self::Years(n) => write!(f, "{n}y"),
            Self::YearToDate => f.write_str("ytd"),
            Self::Max => f.write_str("max"),
        }
    }
}

impl FromStr for Period {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "ytd" => return Ok(Self::YearToDate),
            "max" => return Ok(Self::Max),
            _ => {}
        }

        let split = lower
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| DataError::InvalidPeriod(s.to_string()))?;
        let (count, unit) = lower.split_at(split);
        let n: u32 = count
            .parse()
            .map_err(|_| DataError::InvalidPeriod(s.to_string()))?;
        if n == 0 {
            return Err(DataError::InvalidPeriod(s.to_string()));
        }

        match unit {
            "d" => Ok(Self::Days(n)),
            "w" => Ok(Self::Weeks(n)),
            "mo" => Ok(Self::Months(n)),
            "y" => Ok(Self::Years(n)),
            _ => Err(DataError::InvalidPeriod(s.to_string())),
        }
    }
}

/// The window of history a portfolio is estimated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateWindow {
    /// Look back from today.
    Period(Period),
    /// Explicit start date with an optional end date.
    Range {
        /// First day of the window.
        start: NaiveDate,
        /// Last day of the window; the last weekday when absent.
        end: Option<NaiveDate>,
    },
}

impl Default for DateWindow {
    fn default() -> Self {
        Self::Period(Period::default())
    }
}

impl DateWindow {
    /// Resolve the window into `(start, end)`; `start` is `None` for all available history.
    pub fn resolve(&self, today: NaiveDate) -> Result<(Option<NaiveDate>, NaiveDate)> {
        match *self {
            Self::Period(period) => Ok((period.start_date(today), today)),
            Self::Range { start, end } => {
                let end = end.unwrap_or_else(|| last_weekday(today));
                if start > end {
                    return Err(DataError::InvalidDateRange {
                        start: start.to_string(),
                        end: end.to_string(),
                    });
                }
                Ok((Some(start), end))
            }
        }
    }
}

/// Today, or the previous Friday when today falls on a weekend.
pub fn last_weekday(today: NaiveDate) -> NaiveDate {
    let back = match today.weekday() {
        Weekday::Sat => 1,
        Weekday::Sun => 2,
        _ => 0,
    };
    today - Days::new(back)
}

/// Build the bracketed label shown in front of every portfolio title.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use portopt_data::{DateWindow, Period, period_label};
///
/// let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
/// assert_eq!(period_label(&DateWindow::Period(Period::Years(3)), today), "[3 Years]");
/// assert_eq!(period_label(&DateWindow::Period(Period::Years(1)), today), "[1 Year]");
/// ```
pub fn period_label(window: &DateWindow, today: NaiveDate) -> String {
    match *window {
        DateWindow::Period(period) => period.label(),
        DateWindow::Range { start, end } => {
            let end = end.unwrap_or_else(|| last_weekday(today));
            format!(
                "[From {} to {}]",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("3y", Period::Years(3))]
    #[case("10d", Period::Days(10))]
    #[case("2w", Period::Weeks(2))]
    #[case("6mo", Period::Months(6))]
    #[case("YTD", Period::YearToDate)]
    #[case("max", Period::Max)]
    fn test_parse_period(#[case] input: &str, #[case] expected: Period) {
        assert_eq!(input.parse::<Period>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<Period>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("y")]
    #[case("0y")]
    #[case("3q")]
    #[case("3")]
    fn test_parse_period_rejects(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Period>(),
            Err(DataError::InvalidPeriod(_))
        ));
    }

    #[rstest]
    #[case(Period::Years(3), "[3 Years]")]
    #[case(Period::Years(1), "[1 Year]")]
    #[case(Period::Months(6), "[6 Months]")]
    #[case(Period::Months(1), "[1 Month]")]
    #[case(Period::Weeks(2), "[2 Weeks]")]
    #[case(Period::Days(1), "[1 Day]")]
    #[case(Period::YearToDate, "[Year-to-Date]")]
    #[case(Period::Max, "[All-time]")]
    fn test_period_labels(#[case] period: Period, #[case] expected: &str) {
        assert_eq!(period.label(), expected);
    }

    #[test]
    fn test_range_label_with_end() {
        let window = DateWindow::Range {
            start: date(2020, 1, 2),
            end: Some(date(2021, 3, 4)),
        };
        assert_eq!(
            period_label(&window, date(2024, 1, 1)),
            "[From 2020-01-02 to 2021-03-04]"
        );
    }

    #[test]
    fn test_range_label_defaults_to_last_weekday() {
        let window = DateWindow::Range {
            start: date(2020, 1, 2),
            end: None,
        };
        // 2024-06-08 is a Saturday
        assert_eq!(
            period_label(&window, date(2024, 6, 8)),
            "[From 2020-01-02 to 2024-06-07]"
        );
        // Sunday
        assert_eq!(
            period_label(&window, date(2024, 6, 9)),
            "[From 2020-01-02 to 2024-06-07]"
        );
        // Wednesday stays put
        assert_eq!(
            period_label(&window, date(2024, 6, 5)),
            "[From 2020-01-02 to 2024-06-05]"
        );
    }

    #[test]
    fn test_start_dates() {
        let today = date(2024, 3, 31);
        assert_eq!(Period::Years(3).start_date(today), Some(date(2021, 3, 31)));
        assert_eq!(Period::Months(1).start_date(today), Some(date(2024, 2, 29)));
        assert_eq!(Period::Weeks(1).start_date(today), Some(date(2024, 3, 24)));
        assert_eq!(Period::YearToDate.start_date(today), Some(date(2024, 1, 1)));
        assert_eq!(Period::Max.start_date(today), None);
    }

    #[test]
    fn test_resolve_rejects_inverted_range() {
        let window = DateWindow::Range {
            start: date(2024, 2, 1),
            end: Some(date(2024, 1, 1)),
        };
        assert!(matches!(
            window.resolve(date(2024, 6, 1)),
            Err(DataError::InvalidDateRange { .. })
        ));
    }
}
