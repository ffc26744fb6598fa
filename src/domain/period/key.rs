//! Period identity: type plus calendar coordinates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Granularity of a scoring window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Monthly,
    Quarterly,
    Yearly,
}

impl PeriodType {
    /// Storage and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Monthly => "monthly",
            PeriodType::Quarterly => "quarterly",
            PeriodType::Yearly => "yearly",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(PeriodType::Monthly),
            "quarterly" => Ok(PeriodType::Quarterly),
            "yearly" => Ok(PeriodType::Yearly),
            other => Err(ValidationError::invalid_format(
                "period_type",
                format!("unknown period type '{}'", other),
            )),
        }
    }
}

/// Validated (type, year, month | quarter) triple.
///
/// Exactly one period exists per key. Monthly keys carry a month in 1..=12,
/// quarterly keys a quarter in 1..=4, yearly keys neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    period_type: PeriodType,
    year: i32,
    month: Option<u32>,
    quarter: Option<u32>,
}

impl PeriodKey {
    pub fn monthly(year: i32, month: u32) -> Result<Self, ValidationError> {
        check_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(ValidationError::out_of_range("month", 1, 12, month as i32));
        }
        Ok(Self {
            period_type: PeriodType::Monthly,
            year,
            month: Some(month),
            quarter: None,
        })
    }

    pub fn quarterly(year: i32, quarter: u32) -> Result<Self, ValidationError> {
        check_year(year)?;
        if !(1..=4).contains(&quarter) {
            return Err(ValidationError::out_of_range("quarter", 1, 4, quarter as i32));
        }
        Ok(Self {
            period_type: PeriodType::Quarterly,
            year,
            month: None,
            quarter: Some(quarter),
        })
    }

    pub fn yearly(year: i32) -> Result<Self, ValidationError> {
        check_year(year)?;
        Ok(Self {
            period_type: PeriodType::Yearly,
            year,
            month: None,
            quarter: None,
        })
    }

    /// Rebuilds a key from stored columns, re-validating the combination.
    pub fn from_parts(
        period_type: PeriodType,
        year: i32,
        month: Option<u32>,
        quarter: Option<u32>,
    ) -> Result<Self, ValidationError> {
        match (period_type, month, quarter) {
            (PeriodType::Monthly, Some(m), None) => Self::monthly(year, m),
            (PeriodType::Quarterly, None, Some(q)) => Self::quarterly(year, q),
            (PeriodType::Yearly, None, None) => Self::yearly(year),
            _ => Err(ValidationError::invalid_format(
                "period",
                format!(
                    "{} period cannot have month={:?} quarter={:?}",
                    period_type, month, quarter
                ),
            )),
        }
    }

    pub fn period_type(&self) -> PeriodType {
        self.period_type
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn quarter(&self) -> Option<u32> {
        self.quarter
    }

    /// First calendar day of the window.
    pub fn start_date(&self) -> NaiveDate {
        first_of_month(self.year, self.first_month())
    }

    /// Last calendar day of the window.
    pub fn end_date(&self) -> NaiveDate {
        last_of_month(self.year, self.last_month())
    }

    /// Canonical display name: `YYYY-MM`, `YYYY-Qn` or `YYYY`.
    pub fn display_name(&self) -> String {
        match self.period_type {
            PeriodType::Monthly => format!("{:04}-{:02}", self.year, self.month.unwrap_or(1)),
            PeriodType::Quarterly => format!("{:04}-Q{}", self.year, self.quarter.unwrap_or(1)),
            PeriodType::Yearly => format!("{:04}", self.year),
        }
    }

    /// The immediately preceding window of the same type.
    ///
    /// Returns `None` when the preceding window would fall before year 1.
    pub fn previous(&self) -> Option<Self> {
        match self.period_type {
            PeriodType::Monthly => match self.month {
                Some(1) | None => Self::monthly(self.year - 1, 12).ok(),
                Some(m) => Self::monthly(self.year, m - 1).ok(),
            },
            PeriodType::Quarterly => match self.quarter {
                Some(1) | None => Self::quarterly(self.year - 1, 4).ok(),
                Some(q) => Self::quarterly(self.year, q - 1).ok(),
            },
            PeriodType::Yearly => Self::yearly(self.year - 1).ok(),
        }
    }

    /// True when `date` falls within `[start_date, end_date]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    fn first_month(&self) -> u32 {
        match self.period_type {
            PeriodType::Monthly => self.month.unwrap_or(1),
            PeriodType::Quarterly => (self.quarter.unwrap_or(1) - 1) * 3 + 1,
            PeriodType::Yearly => 1,
        }
    }

    fn last_month(&self) -> u32 {
        match self.period_type {
            PeriodType::Monthly => self.month.unwrap_or(1),
            PeriodType::Quarterly => self.quarter.unwrap_or(1) * 3,
            PeriodType::Yearly => 12,
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for PeriodKey {
    type Err = ValidationError;

    /// Parses `YYYY-MM`, `YYYY-Qn` or `YYYY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || ValidationError::invalid_format("period", "expected YYYY-MM, YYYY-Qn or YYYY");
        let parse_year = |y: &str| y.parse::<i32>().map_err(|_| bad());

        match s.split_once('-') {
            None => Self::yearly(parse_year(s)?),
            Some((year, rest)) => {
                let year = parse_year(year)?;
                if let Some(q) = rest.strip_prefix('Q').or_else(|| rest.strip_prefix('q')) {
                    Self::quarterly(year, q.parse().map_err(|_| bad())?)
                } else {
                    Self::monthly(year, rest.parse().map_err(|_| bad())?)
                }
            }
        }
    }
}

fn check_year(year: i32) -> Result<(), ValidationError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::out_of_range("year", MIN_YEAR, MAX_YEAR, year));
    }
    Ok(())
}

// Callers only pass validated (year, month) pairs, which chrono always accepts.
fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn last_of_month(year: i32, month: u32) -> NaiveDate {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX))
}
