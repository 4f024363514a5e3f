use crate::domain::{OrderSearch, Page};
use crate::hydration::{HydrationError, OrderSummary};
use crate::store::{ReadQuery, Row, StoreSession};

use super::decode_rows;

// Header projection first, then one line projection query per order.

pub async fn hydrate(
    session: &StoreSession<'_>,
    search: &OrderSearch,
    page: Option<Page>,
) -> Result<Vec<OrderSummary>, HydrationError> {
    let rows = session
        .query(&ReadQuery::OrderSummaries {
            search: search.clone(),
            page,
        })
        .await?;

    let mut summaries = Vec::with_capacity(rows.len());
    for head in decode_rows(rows, Row::into_summary)? {
        let lines = session
            .query(&ReadQuery::OrderLineSummaries {
                order_ids: vec![head.order_id],
            })
            .await?;
        let lines = decode_rows(lines, Row::into_line_summary)?;
        summaries.push(OrderSummary::assemble(head, lines));
    }
    Ok(summaries)
}
