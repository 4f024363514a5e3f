use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Address, OrderId, OrderStatus};
use crate::store::{OrderLineRow, OrderSummaryRow};

// ============================================================================
// Read-Model Projections
// ============================================================================
//
// Display values built fresh for each request. They copy scalars out of the
// entities (member name, item name, delivery address) and hold no entity
// references, so they serialize without cycles.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub member_name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    /// Delivery address
    pub address: Address,
    /// Ordered by line id. Empty for an order without lines.
    pub order_lines: Vec<OrderLineSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineSummary {
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

/// Order header without the line collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleOrderSummary {
    pub order_id: OrderId,
    pub member_name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
}

impl OrderSummary {
    /// Pair a header row with its line rows, in any order
    pub fn assemble(head: OrderSummaryRow, lines: Vec<OrderLineRow>) -> Self {
        Self {
            order_id: head.order_id,
            member_name: head.member_name,
            order_date: head.order_date,
            order_status: head.order_status,
            address: head.address,
            order_lines: ordered_lines(lines),
        }
    }
}

impl From<OrderLineRow> for OrderLineSummary {
    fn from(row: OrderLineRow) -> Self {
        Self {
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        }
    }
}

impl From<OrderSummaryRow> for SimpleOrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            order_id: row.order_id,
            member_name: row.member_name,
            order_date: row.order_date,
            order_status: row.order_status,
            address: row.address,
        }
    }
}

fn ordered_lines(mut lines: Vec<OrderLineRow>) -> Vec<OrderLineSummary> {
    lines.sort_by_key(|line| line.order_line_id);
    lines.into_iter().map(OrderLineSummary::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderLineId;
    use chrono::TimeZone;

    fn head() -> OrderSummaryRow {
        OrderSummaryRow {
            order_id: OrderId(1),
            member_name: "member1".to_string(),
            order_date: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            order_status: OrderStatus::Ordered,
            address: Address::new("Seoul", "test1", "11111"),
        }
    }

    fn line(id: i64, item_name: &str, order_price: i32, count: i32) -> OrderLineRow {
        OrderLineRow {
            order_id: OrderId(1),
            order_line_id: OrderLineId(id),
            item_name: item_name.to_string(),
            order_price,
            count,
        }
    }

    #[test]
    fn test_assemble_orders_lines_by_id() {
        let summary = OrderSummary::assemble(
            head(),
            vec![line(2, "itemB", 20000, 1), line(1, "itemA", 10000, 2)],
        );

        let names: Vec<_> = summary.order_lines.iter().map(|l| l.item_name.as_str()).collect();
        assert_eq!(names, ["itemA", "itemB"]);
        assert_eq!(summary.order_lines.len(), 2);
    }

    #[test]
    fn test_serializes_camel_case_without_ids_of_lines() {
        let summary = OrderSummary::assemble(head(), vec![line(1, "itemA", 10000, 2)]);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["orderId"], 1);
        assert_eq!(json["memberName"], "member1");
        assert_eq!(json["orderStatus"], "ORDERED");
        assert_eq!(json["address"]["city"], "Seoul");
        assert_eq!(
            json["orderLines"],
            serde_json::json!([{ "itemName": "itemA", "orderPrice": 10000, "count": 2 }])
        );
    }

    #[test]
    fn test_order_without_lines_serializes_empty_array() {
        let summary = OrderSummary::assemble(head(), Vec::new());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["orderLines"], serde_json::json!([]));
    }
}
