//! Strongly-typed identifier value objects.
//!
//! Every entity the scoring engine touches is keyed by an integer primary key
//! owned by the surrounding HR application. The engine only ever holds these
//! keys, never the related records themselves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database key.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw database key.
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

int_id!(
    /// Identifier of an employee (the person being scored or an acting administrator).
    UserId
);

int_id!(
    /// Identifier of a department.
    DepartmentId
);

int_id!(
    /// Identifier of a scoring rule.
    RuleId
);

int_id!(
    /// Identifier of a performance event.
    PerformanceEventId
);

int_id!(
    /// Identifier of a scoring period.
    PeriodId
);

int_id!(
    /// Identifier of a persisted score row.
    ScoreId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_their_raw_value() {
        assert_eq!(UserId::new(42).to_string(), "42");
        assert_eq!(PeriodId::new(7).to_string(), "7");
    }

    #[test]
    fn ids_parse_from_strings() {
        let id: DepartmentId = " 12 ".parse().unwrap();
        assert_eq!(id.value(), 12);
        assert!("abc".parse::<RuleId>().is_err());
    }

    #[test]
    fn ids_order_by_raw_value() {
        let mut ids = vec![
            PerformanceEventId::new(3),
            PerformanceEventId::new(1),
            PerformanceEventId::new(2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                PerformanceEventId::new(1),
                PerformanceEventId::new(2),
                PerformanceEventId::new(3)
            ]
        );
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&ScoreId::new(99)).unwrap();
        assert_eq!(json, "99");
        let back: ScoreId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScoreId::new(99));
    }
}
