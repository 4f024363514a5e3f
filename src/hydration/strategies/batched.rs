use std::collections::HashMap;

use crate::domain::{OrderId, OrderSearch, Page};
use crate::hydration::{HydrationError, OrderSummary};
use crate::store::{OrderLineRow, ReadQuery, Row, StoreSession};

use super::decode_rows;

// Two-phase hydration:
// 1. One projection row per order with the to-one fields inlined. Paging
//    applies here, so it counts orders.
// 2. One grouped query for the lines of every order from phase 1.
// The merge walks phase-1 rows in the order they came back and looks each
// order's group up by id, so the order of phase-2 rows does not matter.

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
    let heads = decode_rows(rows, Row::into_summary)?;

    if heads.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids = heads.iter().map(|head| head.order_id).collect();
    let rows = session
        .query(&ReadQuery::OrderLineSummaries { order_ids })
        .await?;
    let mut groups = group_by_order(decode_rows(rows, Row::into_line_summary)?);

    Ok(heads
        .into_iter()
        .map(|head| {
            let lines = groups.remove(&head.order_id).unwrap_or_default();
            OrderSummary::assemble(head, lines)
        })
        .collect())
}

fn group_by_order(rows: Vec<OrderLineRow>) -> HashMap<OrderId, Vec<OrderLineRow>> {
    let mut groups: HashMap<OrderId, Vec<OrderLineRow>> = HashMap::new();
    for row in rows {
        groups.entry(row.order_id).or_default().push(row);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, OrderLineId};
    use crate::store::{InMemoryStore, QueryKind, StoreError};

    #[tokio::test]
    async fn test_two_queries_regardless_of_size() {
        let mut store = InMemoryStore::demo();
        let member = store.add_member("member3", Address::new("Incheon", "3", "33333"));
        let item = store.add_item("itemD", 1000, 10);
        for count in 1..=20 {
            store.place_order(member, &[(item, count), (item, 1)]).unwrap();
        }
        let session = StoreSession::new(&store);

        let summaries = hydrate(&session, &OrderSearch::all(), None).await.unwrap();

        assert_eq!(summaries.len(), 22);
        assert_eq!(session.round_trips(), 2);
    }

    #[tokio::test]
    async fn test_empty_first_phase_skips_line_query() {
        let store = InMemoryStore::demo();
        let session = StoreSession::new(&store);

        let summaries = hydrate(&session, &OrderSearch::by_member("nobody"), None)
            .await
            .unwrap();

        assert!(summaries.is_empty());
        assert_eq!(session.round_trips(), 1);
    }

    #[tokio::test]
    async fn test_order_without_lines_gets_empty_sequence() {
        let mut store = InMemoryStore::demo();
        let member = store.add_member("member3", Address::new("Incheon", "3", "33333"));
        store.place_order(member, &[]).unwrap();
        let session = StoreSession::new(&store);

        let summaries = hydrate(&session, &OrderSearch::all(), None).await.unwrap();

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[2].member_name, "member3");
        assert!(summaries[2].order_lines.is_empty());
    }

    #[tokio::test]
    async fn test_second_phase_failure_aborts() {
        let store = InMemoryStore::demo().fail_queries(QueryKind::OrderLineSummaries);
        let session = StoreSession::new(&store);

        let err = hydrate(&session, &OrderSearch::all(), None).await.unwrap_err();

        assert!(matches!(err, HydrationError::StoreUnavailable(StoreError::Unavailable(_))));
        assert_eq!(session.round_trips(), 2);
    }

    #[test]
    fn test_grouping_is_keyed_by_order() {
        let row = |order: i64, line: i64| OrderLineRow {
            order_id: OrderId(order),
            order_line_id: OrderLineId(line),
            item_name: format!("item{line}"),
            order_price: 100,
            count: 1,
        };

        let groups = group_by_order(vec![row(2, 3), row(1, 1), row(2, 4), row(1, 2)]);

        assert_eq!(groups[&OrderId(1)].len(), 2);
        assert_eq!(groups[&OrderId(2)].len(), 2);
    }
}
