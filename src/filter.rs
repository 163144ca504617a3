//! Location filters over a ranked result.

use crate::ranking::{RankedResult, RankedRow};

/// Optional equality constraints on the location columns.
///
/// A constraint that is absent or blank passes every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionFilter {
    pub rw: Option<String>,
    pub rt: Option<String>,
    pub dusun: Option<String>,
}

impl RegionFilter {
    pub fn new(rw: Option<&str>, rt: Option<&str>, dusun: Option<&str>) -> Self {
        Self {
            rw: rw.map(str::to_string),
            rt: rt.map(str::to_string),
            dusun: dusun.map(str::to_string),
        }
    }

    /// True when no constraint would exclude any row.
    pub fn is_unconstrained(&self) -> bool {
        active(&self.rw).is_none() && active(&self.rt).is_none() && active(&self.dusun).is_none()
    }

    pub fn matches(&self, row: &RankedRow) -> bool {
        [
            (active(&self.rw), row.rw.as_str()),
            (active(&self.rt), row.rt.as_str()),
            (active(&self.dusun), row.dusun.as_str()),
        ]
        .into_iter()
        .all(|(expected, actual)| expected.is_none_or(|value| value == actual))
    }

    /// Human-readable summary for log output, e.g. `RW=3, Dusun=Krajan`.
    pub fn describe(&self) -> String {
        let parts = [
            ("RW", active(&self.rw)),
            ("RT", active(&self.rt)),
            ("Dusun", active(&self.dusun)),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| format!("{label}={v}")))
        .collect::<Vec<_>>();
        if parts.is_empty() {
            "no filter".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Rows of `result` matching every supplied constraint, in ranking order.
pub fn filter(result: &RankedResult, constraints: &RegionFilter) -> RankedResult {
    RankedResult {
        rows: result
            .iter()
            .filter(|row| constraints.matches(row))
            .cloned()
            .collect(),
    }
}
