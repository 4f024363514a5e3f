use crate::domain::{OrderSearch, Page};
use crate::hydration::{HydrationError, OrderSummary};
use crate::store::{ReadQuery, Row, StoreSession};

use super::{decode_rows, lazy_walk};

// Member and delivery are joined into the root query. To-one joins never
// multiply rows, so paging stays correct; the line collection is left out of
// the join and resolved per order.

pub async fn hydrate(
    session: &StoreSession<'_>,
    search: &OrderSearch,
    page: Option<Page>,
) -> Result<Vec<OrderSummary>, HydrationError> {
    let rows = session
        .query(&ReadQuery::OrdersWithMemberDelivery {
            search: search.clone(),
            page,
        })
        .await?;

    let mut summaries = Vec::with_capacity(rows.len());
    for mut order in decode_rows(rows, Row::into_order)? {
        summaries.push(lazy_walk::walk(session, &mut order).await?);
    }
    Ok(summaries)
}
