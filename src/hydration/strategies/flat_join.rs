use std::collections::HashMap;

use crate::domain::{OrderId, OrderSearch, Page};
use crate::hydration::{HydrationError, OrderSummary};
use crate::store::{FlatOrderRow, OrderLineRow, OrderSummaryRow, ReadQuery, Row, StoreSession};

use super::decode_rows;

// The line collection joined straight into the root query: one row per
// (order, line) pair. Offset and limit then count rows, not orders, so a
// page can stop in the middle of an order's lines. Every row carries the
// order's full line count, and a group that comes back short is rejected
// instead of being passed off as a complete order.
//
// Orders without lines drop out of the inner join altogether.

struct Group {
    head: OrderSummaryRow,
    expected: i64,
    lines: Vec<OrderLineRow>,
}

pub async fn hydrate(
    session: &StoreSession<'_>,
    search: &OrderSearch,
    page: Option<Page>,
) -> Result<Vec<OrderSummary>, HydrationError> {
    let rows = session
        .query(&ReadQuery::FlatOrderLines {
            search: search.clone(),
            page,
        })
        .await?;

    let groups = collapse(decode_rows(rows, Row::into_flat)?);

    let mut summaries = Vec::with_capacity(groups.len());
    for group in groups {
        let loaded = group.lines.len();
        if i64::try_from(loaded).ok() != Some(group.expected) {
            tracing::warn!(
                session_id = %session.id(),
                order_id = %group.head.order_id,
                expected = group.expected,
                loaded = loaded,
                "Flat join page split an order's lines"
            );
            return Err(HydrationError::PartialCollection {
                order_id: group.head.order_id,
                expected: group.expected,
                loaded,
            });
        }
        summaries.push(OrderSummary::assemble(group.head, group.lines));
    }
    Ok(summaries)
}

/// Fold rows into one group per order, in first-seen order
fn collapse(rows: Vec<FlatOrderRow>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<OrderId, usize> = HashMap::new();

    for row in rows {
        let line = row.line();
        match index.get(&row.order_id) {
            Some(&at) => groups[at].lines.push(line),
            None => {
                index.insert(row.order_id, groups.len());
                groups.push(Group {
                    head: row.head(),
                    expected: row.line_total,
                    lines: vec![line],
                });
            }
        }
    }
    groups
}
