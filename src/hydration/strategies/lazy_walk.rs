use crate::domain::{Order, OrderSearch, Page};
use crate::hydration::{HydrationError, OrderLineSummary, OrderSummary};
use crate::store::{ReadQuery, Row, StoreSession};

use super::decode_rows;

// Root orders with their own columns only. Member, delivery, lines and every
// line's item are resolved on first touch. The session's identity map keeps a
// target shared by several orders down to one round trip.

pub async fn hydrate(
    session: &StoreSession<'_>,
    search: &OrderSearch,
    page: Option<Page>,
) -> Result<Vec<OrderSummary>, HydrationError> {
    let rows = session
        .query(&ReadQuery::Orders {
            search: search.clone(),
            page,
        })
        .await?;

    let mut summaries = Vec::with_capacity(rows.len());
    for mut order in decode_rows(rows, Row::into_order)? {
        summaries.push(walk(session, &mut order).await?);
    }
    Ok(summaries)
}

/// Touch every association of the order and copy out the displayed fields.
/// Associations that are already loaded cost nothing.
pub(super) async fn walk(
    session: &StoreSession<'_>,
    order: &mut Order,
) -> Result<OrderSummary, HydrationError> {
    let member_name = order.member.load(session).await?.name.clone();
    let address = order.delivery.load(session).await?.address.clone();

    let lines = order.lines.load(session).await?;
    lines.sort_by_key(|line| line.id);

    let mut order_lines = Vec::with_capacity(lines.len());
    for line in lines.iter_mut() {
        let item_name = line.item.load(session).await?.name.clone();
        order_lines.push(OrderLineSummary {
            item_name,
            order_price: line.order_price,
            count: line.count,
        });
    }

    Ok(OrderSummary {
        order_id: order.id,
        member_name,
        order_date: order.order_date,
        order_status: order.status,
        address,
        order_lines,
    })
}
