use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lazy::{OrderLines, Ref};
use super::value_objects::*;

// ============================================================================
// Entities
// ============================================================================
//
// Ownership follows the aggregate:
//   Order ──owns──> OrderLine ──refs──> Item
//     ├──refs──> Member
//     └──refs──> Delivery
//
// Only the owning direction is modelled. A Member does not list its orders
// and an OrderLine only keeps the id of its parent order, so no entity graph
// can form a cycle.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub address: Address,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: i32,
    pub stock_quantity: i32,
}

/// Aggregate root
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub member: Ref<Member>,
    pub delivery: Ref<Delivery>,
    pub lines: OrderLines,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

impl Order {
    /// An order as a root query returns it: own columns only, every
    /// association left as an unresolved handle.
    pub fn unresolved(
        id: OrderId,
        member_id: MemberId,
        delivery_id: DeliveryId,
        status: OrderStatus,
        order_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            member: Ref::Unloaded(member_id),
            delivery: Ref::Unloaded(delivery_id),
            lines: OrderLines::Unloaded(id),
            status,
            order_date,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub item: Ref<Item>,
    /// Unit price captured when the order was placed
    pub order_price: i32,
    pub count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_order_has_no_loaded_associations() {
        let order = Order::unresolved(
            OrderId(1),
            MemberId(10),
            DeliveryId(20),
            OrderStatus::Ordered,
            Utc::now(),
        );

        assert!(!order.member.is_loaded());
        assert!(!order.delivery.is_loaded());
        assert!(!order.lines.is_loaded());
        assert_eq!(order.member.id(), MemberId(10));
        assert_eq!(order.delivery.id(), DeliveryId(20));
    }
}
