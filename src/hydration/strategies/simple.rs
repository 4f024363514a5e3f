use crate::domain::{OrderSearch, Page};
use crate::hydration::{HydrationError, SimpleOrderSummary};
use crate::store::{ReadQuery, Row, StoreSession};

use super::{decode_rows, SimpleStrategy};

// Order headers only: id, member name, date, status, delivery address.

pub async fn hydrate(
    session: &StoreSession<'_>,
    search: &OrderSearch,
    page: Option<Page>,
    strategy: SimpleStrategy,
) -> Result<Vec<SimpleOrderSummary>, HydrationError> {
    let search = search.clone();
    match strategy {
        SimpleStrategy::LazyWalk => {
            let rows = session.query(&ReadQuery::Orders { search, page }).await?;
            walk_headers(session, rows).await
        }
        SimpleStrategy::JoinFetch => {
            let rows = session
                .query(&ReadQuery::OrdersWithMemberDelivery { search, page })
                .await?;
            walk_headers(session, rows).await
        }
        SimpleStrategy::Projection => {
            let rows = session
                .query(&ReadQuery::OrderSummaries { search, page })
                .await?;
            Ok(decode_rows(rows, Row::into_summary)?
                .into_iter()
                .map(SimpleOrderSummary::from)
                .collect())
        }
    }
}

async fn walk_headers(
    session: &StoreSession<'_>,
    rows: Vec<Row>,
) -> Result<Vec<SimpleOrderSummary>, HydrationError> {
    let mut summaries = Vec::with_capacity(rows.len());
    for mut order in decode_rows(rows, Row::into_order)? {
        let member_name = order.member.load(session).await?.name.clone();
        let address = order.delivery.load(session).await?.address.clone();
        summaries.push(SimpleOrderSummary {
            order_id: order.id,
            member_name,
            order_date: order.order_date,
            order_status: order.status,
            address,
        });
    }
    Ok(summaries)
}
