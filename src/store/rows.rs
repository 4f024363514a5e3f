use chrono::{DateTime, Utc};

use crate::domain::{Address, OrderId, OrderLineId, OrderStatus};

// ============================================================================
// Projection Rows
// ============================================================================
//
// Flat rows produced by constructor-style projection queries. They carry
// copied scalar values only, never entity references.
//
// ============================================================================

/// One row per order, to-one fields already inlined
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummaryRow {
    pub order_id: OrderId,
    pub member_name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    /// Delivery address
    pub address: Address,
}

/// One row per order line, keyed by its parent order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineRow {
    pub order_id: OrderId,
    pub order_line_id: OrderLineId,
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

/// One row per (order, line) pair of an inner join.
///
/// `line_total` is the number of lines the order has in the store, computed
/// before any paging, so a consumer can tell a complete group of rows from a
/// truncated one.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatOrderRow {
    pub order_id: OrderId,
    pub member_name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_line_id: OrderLineId,
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
    pub line_total: i64,
}

impl FlatOrderRow {
    /// Order-level half of the row
    pub fn head(&self) -> OrderSummaryRow {
        OrderSummaryRow {
            order_id: self.order_id,
            member_name: self.member_name.clone(),
            order_date: self.order_date,
            order_status: self.order_status,
            address: self.address.clone(),
        }
    }

    /// Line-level half of the row
    pub fn line(&self) -> OrderLineRow {
        OrderLineRow {
            order_id: self.order_id,
            order_line_id: self.order_line_id,
            item_name: self.item_name.clone(),
            order_price: self.order_price,
            count: self.count,
        }
    }
}
