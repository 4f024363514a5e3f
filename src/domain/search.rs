use serde::{Deserialize, Serialize};

use super::value_objects::OrderStatus;

// ============================================================================
// Order Search Filter
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("invalid order status filter: {0:?} (expected ORDERED or CANCELLED)")]
    InvalidStatus(String),

    #[error("page limit must be greater than zero")]
    ZeroLimit,
}

/// Filter for order read models. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSearch {
    /// Exact match on the ordering member's name
    pub member_name: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderSearch {
    /// Unconstrained search
    pub fn all() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn by_member(name: impl Into<String>) -> Self {
        Self {
            member_name: Some(name.into()),
            status: None,
        }
    }

    #[cfg(test)]
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Build a search from raw request values.
    ///
    /// A blank member name counts as "no constraint"; any other name is kept
    /// as given and matched exactly. A status that is not one of the known
    /// values is rejected.
    pub fn parse(member_name: Option<&str>, status: Option<&str>) -> Result<Self, SearchError> {
        let member_name = member_name
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string);

        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                raw.parse::<OrderStatus>()
                    .map_err(|_| SearchError::InvalidStatus(raw.to_string()))?,
            ),
            None => None,
        };

        Ok(Self { member_name, status })
    }

    pub fn matches(&self, member_name: &str, status: OrderStatus) -> bool {
        self.member_name.as_deref().map_or(true, |name| name == member_name)
            && self.status.map_or(true, |wanted| wanted == status)
    }
}

// ============================================================================
// Paging
// ============================================================================

/// Offset/limit window applied to root rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(offset: u32, limit: u32) -> Result<Self, SearchError> {
        if limit == 0 {
            return Err(SearchError::ZeroLimit);
        }
        Ok(Self { offset, limit })
    }

    /// Same as [`Page::new`], with the limit lowered to `max` when above it
    pub fn capped(offset: u32, limit: u32, max: u32) -> Result<Self, SearchError> {
        Self::new(offset, limit.min(max))
    }

    /// Apply the window to an in-memory sequence
    pub fn slice<T>(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}
