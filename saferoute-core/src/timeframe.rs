//! Historical windows used to rescale incident counts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crime::UnknownLabel;

/// Historical window covered by a dataset.
///
/// Counts are generated for [`Timeframe::SixMonths`] and rescaled by
/// [`Timeframe::multiplier`] for the other windows.
///
/// # Examples
/// ```
/// use saferoute_core::Timeframe;
///
/// assert_eq!(Timeframe::parse_or_default("1year"), Timeframe::OneYear);
/// assert_eq!(Timeframe::parse_or_default("fortnight"), Timeframe::SixMonths);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    /// The last month.
    #[serde(rename = "1month")]
    OneMonth,
    /// The last three months.
    #[serde(rename = "3months")]
    ThreeMonths,
    /// The last six months; the generation baseline.
    #[default]
    #[serde(rename = "6months")]
    SixMonths,
    /// The last year.
    #[serde(rename = "1year")]
    OneYear,
}

impl Timeframe {
    /// Every window from shortest to longest.
    pub const ALL: [Self; 4] = [
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
    ];

    /// Label used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMonth => "1month",
            Self::ThreeMonths => "3months",
            Self::SixMonths => "6months",
            Self::OneYear => "1year",
        }
    }

    /// Length of the window in calendar months.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::OneMonth => 1,
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::OneYear => 12,
        }
    }

    /// Factor applied to six-month incident counts.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "one sixth of the baseline")]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::OneMonth => 1.0 / 6.0,
            Self::ThreeMonths => 0.5,
            Self::SixMonths => 1.0,
            Self::OneYear => 2.0,
        }
    }

    /// Parse a label, falling back to [`Timeframe::SixMonths`] when unknown.
    #[must_use]
    pub fn parse_or_default(label: &str) -> Self {
        label.parse().unwrap_or_else(|err| {
            log::debug!("{err}; using {}", Self::default());
            Self::default()
        })
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLabel {
                kind: "timeframe",
                label: s.to_owned(),
            })
    }
}
