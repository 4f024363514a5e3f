use crate::domain::{OrderId, SearchError};
use crate::store::{EntityKey, StoreError};

// ============================================================================
// Hydration Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum HydrationError {
    #[error("{0} not found")]
    NotFound(EntityKey),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    StoreUnavailable(StoreError),

    /// A flat (order x line) page cut through the line group of an order
    #[error("order {order_id} has {expected} lines but only {loaded} were loaded")]
    PartialCollection {
        order_id: OrderId,
        expected: i64,
        loaded: usize,
    },

    #[error("unexpected row: {0}")]
    UnexpectedRow(String),
}

impl HydrationError {
    /// Label for the failure counter
    pub fn reason(&self) -> &'static str {
        match self {
            HydrationError::NotFound(_) => "not_found",
            HydrationError::InvalidArgument(_) => "invalid_argument",
            HydrationError::StoreUnavailable(_) => "store_unavailable",
            HydrationError::PartialCollection { .. } => "partial_collection",
            HydrationError::UnexpectedRow(_) => "unexpected_row",
        }
    }
}

impl From<StoreError> for HydrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => HydrationError::NotFound(key),
            StoreError::Decode(msg) => HydrationError::UnexpectedRow(msg),
            other => HydrationError::StoreUnavailable(other),
        }
    }
}

impl From<SearchError> for HydrationError {
    fn from(err: SearchError) -> Self {
        HydrationError::InvalidArgument(err.to_string())
    }
}
