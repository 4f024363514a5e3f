// ============================================================================
// Hydration Strategies
// ============================================================================
//
// Every strategy takes the request's StoreSession explicitly and returns the
// same OrderSummary sequence for the same data, except the flat join, which
// exists to expose its paging defect.
//
// | Strategy           | Round trips                               |
// |--------------------|-------------------------------------------|
// | lazy-walk          | 1 + distinct members, deliveries, items   |
// |                    |   + one line query per order              |
// | join-fetch         | 1 + one line query per order + items      |
// | flat-join          | 1, rejects pages that split an order      |
// | per-order          | 1 + one line projection per order         |
// | batched            | 2                                         |
//
// ============================================================================

pub mod batched;
pub mod flat_join;
pub mod join_fetch;
pub mod lazy_walk;
pub mod per_order;
pub mod simple;

use std::fmt;
use std::str::FromStr;

use crate::domain::UnknownVariant;
use crate::store::{Row, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    LazyWalk,
    JoinFetch,
    FlatJoin,
    PerOrderProjection,
    #[default]
    BatchedProjection,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::LazyWalk,
        Strategy::JoinFetch,
        Strategy::FlatJoin,
        Strategy::PerOrderProjection,
        Strategy::BatchedProjection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::LazyWalk => "lazy-walk",
            Strategy::JoinFetch => "join-fetch",
            Strategy::FlatJoin => "flat-join",
            Strategy::PerOrderProjection => "per-order",
            Strategy::BatchedProjection => "batched",
        }
    }

    /// Whether the strategy returns complete aggregates for any page
    pub fn is_page_safe(self) -> bool {
        !matches!(self, Strategy::FlatJoin)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| UnknownVariant {
                kind: "strategy",
                value: s.to_string(),
            })
    }
}

/// Strategies for order headers without lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SimpleStrategy {
    LazyWalk,
    JoinFetch,
    #[default]
    Projection,
}

impl SimpleStrategy {
    pub const ALL: [SimpleStrategy; 3] = [
        SimpleStrategy::LazyWalk,
        SimpleStrategy::JoinFetch,
        SimpleStrategy::Projection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SimpleStrategy::LazyWalk => "lazy-walk",
            SimpleStrategy::JoinFetch => "join-fetch",
            SimpleStrategy::Projection => "projection",
        }
    }

    /// Metric label, kept apart from the full-aggregate strategies
    pub fn label(self) -> &'static str {
        match self {
            SimpleStrategy::LazyWalk => "simple-lazy-walk",
            SimpleStrategy::JoinFetch => "simple-join-fetch",
            SimpleStrategy::Projection => "simple-projection",
        }
    }
}

impl fmt::Display for SimpleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimpleStrategy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SimpleStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| UnknownVariant {
                kind: "simple strategy",
                value: s.to_string(),
            })
    }
}

/// Convert every row with `convert`, failing on the first wrong shape
fn decode_rows<T>(
    rows: Vec<Row>,
    convert: fn(Row) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(convert).collect()
}
