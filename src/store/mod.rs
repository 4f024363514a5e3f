// ============================================================================
// Store Access - Read Contract Consumed by the Hydration Layer
// ============================================================================
//
// The store offers exactly two capabilities:
// 1. Point lookup by primary key (`get_by_id`), used to resolve lazy refs
// 2. Typed, parameter-bound read queries (`query`), returning rows that are
//    either entities with unresolved handles or flat projection rows
//
// Everything a hydration request touches goes through a `StoreSession`,
// which scopes identity-map caching and round-trip accounting to one
// request.
//
// Backends:
// - InMemoryStore - ordered maps, seeding helpers, fault injection
// - PgStore       - PostgreSQL via sqlx
//
// ============================================================================

mod memory;
mod postgres;
mod rows;
mod session;

use async_trait::async_trait;
use std::fmt;

use crate::domain::{
    Delivery, DeliveryId, Item, ItemId, Member, MemberId, Order, OrderId, OrderLine, OrderSearch,
    Page,
};
use crate::utils::IsTransient;

pub use memory::InMemoryStore;
pub use postgres::{PgStore, PgStoreConfig};
pub use rows::{FlatOrderRow, OrderLineRow, OrderSummaryRow};
pub use session::StoreSession;

// ============================================================================
// Store Contract
// ============================================================================

#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name for logs
    fn backend(&self) -> &'static str;

    /// Point lookup by primary key
    async fn get_by_id(&self, key: EntityKey) -> Result<Entity, StoreError>;

    /// Run one read query; one call is one round trip
    async fn query(&self, query: &ReadQuery) -> Result<Vec<Row>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(EntityKey),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store timed out: {0}")]
    Timeout(String),

    #[error("failed to decode store rows: {0}")]
    Decode(String),

    /// Bad URL, credentials or database name. Never retried.
    #[error("store misconfigured: {0}")]
    Misconfigured(String),
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

/// Identity of a lazily resolvable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Member(MemberId),
    Delivery(DeliveryId),
    Item(ItemId),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Member(id) => write!(f, "Member#{id}"),
            EntityKey::Delivery(id) => write!(f, "Delivery#{id}"),
            EntityKey::Item(id) => write!(f, "Item#{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Member(Member),
    Delivery(Delivery),
    Item(Item),
}

// ============================================================================
// Read Queries
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ReadQuery {
    /// Root orders, own columns only
    Orders {
        search: OrderSearch,
        page: Option<Page>,
    },
    /// Root orders with member and delivery joined in
    OrdersWithMemberDelivery {
        search: OrderSearch,
        page: Option<Page>,
    },
    /// Line collection of one order, items unresolved
    LinesOfOrder { order_id: OrderId },
    /// One projection row per order with its to-one fields inlined
    OrderSummaries {
        search: OrderSearch,
        page: Option<Page>,
    },
    /// Line projections for a batch of orders
    OrderLineSummaries { order_ids: Vec<OrderId> },
    /// One row per (order, line) pair
    FlatOrderLines {
        search: OrderSearch,
        page: Option<Page>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Orders,
    OrdersWithMemberDelivery,
    LinesOfOrder,
    OrderSummaries,
    OrderLineSummaries,
    FlatOrderLines,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Orders => "orders",
            QueryKind::OrdersWithMemberDelivery => "orders_with_member_delivery",
            QueryKind::LinesOfOrder => "lines_of_order",
            QueryKind::OrderSummaries => "order_summaries",
            QueryKind::OrderLineSummaries => "order_line_summaries",
            QueryKind::FlatOrderLines => "flat_order_lines",
        }
    }
}

impl ReadQuery {
    pub fn kind(&self) -> QueryKind {
        match self {
            ReadQuery::Orders { .. } => QueryKind::Orders,
            ReadQuery::OrdersWithMemberDelivery { .. } => QueryKind::OrdersWithMemberDelivery,
            ReadQuery::LinesOfOrder { .. } => QueryKind::LinesOfOrder,
            ReadQuery::OrderSummaries { .. } => QueryKind::OrderSummaries,
            ReadQuery::OrderLineSummaries { .. } => QueryKind::OrderLineSummaries,
            ReadQuery::FlatOrderLines { .. } => QueryKind::FlatOrderLines,
        }
    }
}

// ============================================================================
// Result Rows
// ============================================================================

#[derive(Debug, Clone)]
pub enum Row {
    Order(Order),
    OrderLine(OrderLine),
    Summary(OrderSummaryRow),
    LineSummary(OrderLineRow),
    Flat(FlatOrderRow),
}

impl Row {
    fn kind_name(&self) -> &'static str {
        match self {
            Row::Order(_) => "order",
            Row::OrderLine(_) => "order line",
            Row::Summary(_) => "order summary",
            Row::LineSummary(_) => "order line summary",
            Row::Flat(_) => "flat order line",
        }
    }

    fn unexpected(self, expected: &str) -> StoreError {
        StoreError::Decode(format!("expected {expected} row, got {}", self.kind_name()))
    }

    pub fn into_order(self) -> Result<Order, StoreError> {
        match self {
            Row::Order(order) => Ok(order),
            other => Err(other.unexpected("order")),
        }
    }

    pub fn into_order_line(self) -> Result<OrderLine, StoreError> {
        match self {
            Row::OrderLine(line) => Ok(line),
            other => Err(other.unexpected("order line")),
        }
    }

    pub fn into_summary(self) -> Result<OrderSummaryRow, StoreError> {
        match self {
            Row::Summary(row) => Ok(row),
            other => Err(other.unexpected("order summary")),
        }
    }

    pub fn into_line_summary(self) -> Result<OrderLineRow, StoreError> {
        match self {
            Row::LineSummary(row) => Ok(row),
            other => Err(other.unexpected("order line summary")),
        }
    }

    pub fn into_flat(self) -> Result<FlatOrderRow, StoreError> {
        match self {
            Row::Flat(row) => Ok(row),
            other => Err(other.unexpected("flat order line")),
        }
    }
}
