use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::{OrderSearch, Page};
use crate::metrics::Metrics;
use crate::store::{Store, StoreSession};

use super::strategies::{self, SimpleStrategy, Strategy};
use super::{HydrationError, OrderSummary, SimpleOrderSummary};

// ============================================================================
// Order Hydrator - Facade over the strategies
// ============================================================================
//
// Each call:
// 1. Opens a fresh StoreSession (identity map + round-trip counter)
// 2. Runs the chosen strategy inside a span tagged with a request id
// 3. Drops the session, then logs and records the outcome
//
// Nothing survives between calls. Store failures are returned as they are,
// without retry and without partial results.
//
// ============================================================================

#[derive(Clone)]
pub struct OrderHydrator {
    store: Arc<dyn Store>,
    metrics: Option<Arc<Metrics>>,
}

/// Summaries plus the number of store round trips spent on them
#[derive(Debug)]
pub struct Hydrated<T> {
    pub summaries: Vec<T>,
    pub round_trips: usize,
}

/// Build a search from raw filter values; malformed values are InvalidArgument
pub fn parse_filter(
    member_name: Option<&str>,
    status: Option<&str>,
) -> Result<OrderSearch, HydrationError> {
    Ok(OrderSearch::parse(member_name, status)?)
}

impl OrderHydrator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn fetch_order_summaries(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
        strategy: Strategy,
    ) -> Result<Vec<OrderSummary>, HydrationError> {
        Ok(self.fetch_with_stats(search, page, strategy).await?.summaries)
    }

    pub async fn fetch_with_stats(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
        strategy: Strategy,
    ) -> Result<Hydrated<OrderSummary>, HydrationError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "hydrate_orders",
            %request_id,
            strategy = strategy.as_str(),
            backend = self.backend()
        );

        async {
            let session = StoreSession::new(self.store.as_ref());
            let started = Instant::now();

            let result = match strategy {
                Strategy::LazyWalk => strategies::lazy_walk::hydrate(&session, search, page).await,
                Strategy::JoinFetch => strategies::join_fetch::hydrate(&session, search, page).await,
                Strategy::FlatJoin => strategies::flat_join::hydrate(&session, search, page).await,
                Strategy::PerOrderProjection => {
                    strategies::per_order::hydrate(&session, search, page).await
                }
                Strategy::BatchedProjection => {
                    strategies::batched::hydrate(&session, search, page).await
                }
            };

            self.finish(strategy.as_str(), result, session.round_trips(), started.elapsed())
        }
        .instrument(span)
        .await
    }

    /// Order headers without lines
    pub async fn fetch_simple_summaries(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
        strategy: SimpleStrategy,
    ) -> Result<Hydrated<SimpleOrderSummary>, HydrationError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "hydrate_simple_orders",
            %request_id,
            strategy = strategy.as_str(),
            backend = self.backend()
        );

        async {
            let session = StoreSession::new(self.store.as_ref());
            let started = Instant::now();
            let result = strategies::simple::hydrate(&session, search, page, strategy).await;
            self.finish(strategy.label(), result, session.round_trips(), started.elapsed())
        }
        .instrument(span)
        .await
    }

    fn finish<T>(
        &self,
        label: &str,
        result: Result<Vec<T>, HydrationError>,
        round_trips: usize,
        elapsed: Duration,
    ) -> Result<Hydrated<T>, HydrationError> {
        match result {
            Ok(summaries) => {
                tracing::info!(
                    orders = summaries.len(),
                    round_trips = round_trips,
                    elapsed_us = elapsed.as_micros() as u64,
                    "Hydrated orders"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_success(label, round_trips, summaries.len(), elapsed.as_secs_f64());
                }
                Ok(Hydrated {
                    summaries,
                    round_trips,
                })
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    reason = err.reason(),
                    round_trips = round_trips,
                    "Hydration failed"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(label, err.reason(), round_trips, elapsed.as_secs_f64());
                }
                Err(err)
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, OrderId, OrderStatus};
    use crate::store::{InMemoryStore, QueryKind};

    const EQUIVALENT: [Strategy; 4] = [
        Strategy::LazyWalk,
        Strategy::JoinFetch,
        Strategy::PerOrderProjection,
        Strategy::BatchedProjection,
    ];

    fn hydrator(store: InMemoryStore) -> OrderHydrator {
        OrderHydrator::new(Arc::new(store))
    }

    /// Shared items, a shared member, an order without lines, a cancelled order
    fn mixed_store() -> InMemoryStore {
        let mut store = InMemoryStore::demo();
        let member3 = store.add_member("member3", Address::new("Incheon", "3", "33333"));
        let item_d = store.add_item("itemD", 7000, 50);
        let item_a = crate::domain::ItemId(1);
        store.place_order(member3, &[(item_d, 4), (item_a, 1)]).unwrap();
        store.place_order(member3, &[]).unwrap();
        let cancelled = store.place_order(member3, &[(item_d, 2)]).unwrap();
        store.cancel_order(cancelled);
        store
    }

    async fn all_equivalent(hydrator: &OrderHydrator, search: &OrderSearch, page: Option<Page>) {
        let baseline = hydrator
            .fetch_order_summaries(search, page, Strategy::LazyWalk)
            .await
            .unwrap();
        let baseline_json = serde_json::to_string(&baseline).unwrap();

        for strategy in EQUIVALENT {
            let summaries = hydrator
                .fetch_order_summaries(search, page, strategy)
                .await
                .unwrap();
            assert_eq!(summaries, baseline, "{strategy} differs from lazy-walk");
            assert_eq!(serde_json::to_string(&summaries).unwrap(), baseline_json);
        }
    }

    #[tokio::test]
    async fn test_strategies_produce_identical_output() {
        let hydrator = hydrator(mixed_store());

        all_equivalent(&hydrator, &OrderSearch::all(), None).await;
        all_equivalent(&hydrator, &OrderSearch::by_member("member3"), None).await;
        all_equivalent(
            &hydrator,
            &OrderSearch::all().with_status(OrderStatus::Cancelled),
            None,
        )
        .await;
        all_equivalent(&hydrator, &OrderSearch::all(), Some(Page::new(1, 2).unwrap())).await;
        all_equivalent(&hydrator, &OrderSearch::by_member("nobody"), None).await;
    }

    #[tokio::test]
    async fn test_line_row_order_does_not_change_output() {
        let forward = hydrator(mixed_store());
        let reversed = hydrator(mixed_store().reverse_line_summaries());

        let expected = forward
            .fetch_order_summaries(&OrderSearch::all(), None, Strategy::BatchedProjection)
            .await
            .unwrap();
        let actual = reversed
            .fetch_order_summaries(&OrderSearch::all(), None, Strategy::BatchedProjection)
            .await
            .unwrap();

        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_round_trips_per_strategy() {
        let hydrator = hydrator(InMemoryStore::demo());
        let search = OrderSearch::all();

        let mut trips = Vec::new();
        for strategy in EQUIVALENT {
            let hydrated = hydrator.fetch_with_stats(&search, None, strategy).await.unwrap();
            trips.push((strategy, hydrated.round_trips));
        }

        assert_eq!(
            trips,
            [
                (Strategy::LazyWalk, 10),
                (Strategy::JoinFetch, 6),
                (Strategy::PerOrderProjection, 3),
                (Strategy::BatchedProjection, 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_demo_scenario_with_batched_projection() {
        let hydrator = hydrator(InMemoryStore::demo());

        let hydrated = hydrator
            .fetch_with_stats(&OrderSearch::all(), None, Strategy::BatchedProjection)
            .await
            .unwrap();

        assert_eq!(hydrated.round_trips, 2);
        let summaries = hydrated.summaries;
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].order_id, OrderId(1));
        assert_eq!(summaries[0].member_name, "member1");
        let first: Vec<_> = summaries[0]
            .order_lines
            .iter()
            .map(|l| (l.item_name.as_str(), l.order_price, l.count))
            .collect();
        assert_eq!(first, [("itemA", 10000, 2), ("itemB", 20000, 1)]);
        assert_eq!(summaries[0].order_lines.len(), 2);

        assert_eq!(summaries[1].order_id, OrderId(2));
        assert_eq!(summaries[1].member_name, "member2");
        let second: Vec<_> = summaries[1]
            .order_lines
            .iter()
            .map(|l| (l.item_name.as_str(), l.order_price, l.count))
            .collect();
        assert_eq!(second, [("itemC", 5000, 3)]);
        assert!(summaries[0].order_date < summaries[1].order_date);
    }

    #[tokio::test]
    async fn test_member_filter_returns_only_their_order() {
        let hydrator = hydrator(InMemoryStore::demo());
        let search = parse_filter(Some("member2"), None).unwrap();

        for strategy in EQUIVALENT {
            let summaries = hydrator
                .fetch_order_summaries(&search, None, strategy)
                .await
                .unwrap();
            assert_eq!(summaries.len(), 1, "{strategy}");
            assert_eq!(summaries[0].order_id, OrderId(2));
        }
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let hydrator = hydrator(InMemoryStore::new());

        for strategy in Strategy::ALL {
            let summaries = hydrator
                .fetch_order_summaries(&OrderSearch::all(), None, strategy)
                .await
                .unwrap();
            assert!(summaries.is_empty());
        }
    }

    #[test]
    fn test_malformed_status_is_invalid_argument() {
        let err = parse_filter(None, Some("SHIPPED")).unwrap_err();
        assert!(matches!(err, HydrationError::InvalidArgument(msg) if msg.contains("SHIPPED")));
    }

    #[tokio::test]
    async fn test_store_failure_propagates_for_every_strategy() {
        let hydrator = hydrator(
            InMemoryStore::demo()
                .fail_queries(QueryKind::Orders)
                .fail_queries(QueryKind::OrdersWithMemberDelivery)
                .fail_queries(QueryKind::OrderSummaries)
                .fail_queries(QueryKind::FlatOrderLines),
        );

        for strategy in Strategy::ALL {
            let err = hydrator
                .fetch_order_summaries(&OrderSearch::all(), None, strategy)
                .await
                .unwrap_err();
            assert!(matches!(err, HydrationError::StoreUnavailable(_)), "{strategy}");
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_aborts_lazy_walk() {
        let hydrator = hydrator(InMemoryStore::demo().fail_lookups());

        let err = hydrator
            .fetch_order_summaries(&OrderSearch::all(), None, Strategy::LazyWalk)
            .await
            .unwrap_err();

        assert!(matches!(err, HydrationError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_sessions_do_not_leak_between_calls() {
        let hydrator = hydrator(InMemoryStore::demo());

        let first = hydrator
            .fetch_with_stats(&OrderSearch::all(), None, Strategy::LazyWalk)
            .await
            .unwrap();
        let second = hydrator
            .fetch_with_stats(&OrderSearch::all(), None, Strategy::LazyWalk)
            .await
            .unwrap();

        assert_eq!(first.round_trips, second.round_trips);
    }

    #[tokio::test]
    async fn test_metrics_are_recorded_per_strategy() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let hydrator = hydrator(InMemoryStore::demo()).with_metrics(metrics.clone());

        hydrator
            .fetch_order_summaries(&OrderSearch::all(), None, Strategy::BatchedProjection)
            .await
            .unwrap();
        hydrator
            .fetch_order_summaries(&OrderSearch::all(), Some(Page::new(0, 1).unwrap()), Strategy::FlatJoin)
            .await
            .unwrap_err();

        assert_eq!(
            metrics
                .hydration_round_trips
                .with_label_values(&["batched"])
                .get(),
            2
        );
        assert_eq!(
            metrics
                .hydration_failures
                .with_label_values(&["flat-join", "partial_collection"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_simple_summaries_report_round_trips() {
        let hydrator = hydrator(InMemoryStore::demo());

        let hydrated = hydrator
            .fetch_simple_summaries(&OrderSearch::all(), None, SimpleStrategy::LazyWalk)
            .await
            .unwrap();

        assert_eq!(hydrated.summaries.len(), 2);
        assert_eq!(hydrated.round_trips, 5);
    }
}
