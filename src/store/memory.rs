use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::*;

use super::{
    Entity, EntityKey, FlatOrderRow, OrderLineRow, OrderSummaryRow, QueryKind, ReadQuery, Row,
    Store, StoreError,
};

// ============================================================================
// In-Memory Store
// ============================================================================
//
// Ordered maps standing in for the five tables. Root queries come back in
// order-id order, the same as the SQL backend.
//
// Test hooks:
// - fail_queries(kind) / fail_lookups(): answer with StoreError::Unavailable
// - reverse_line_summaries(): emit batched line rows in reverse order
//
// ============================================================================

#[derive(Debug, Clone)]
struct OrderRecord {
    id: OrderId,
    member_id: MemberId,
    delivery_id: DeliveryId,
    status: OrderStatus,
    order_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct LineRecord {
    id: OrderLineId,
    order_id: OrderId,
    item_id: ItemId,
    order_price: i32,
    count: i32,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    members: BTreeMap<MemberId, Member>,
    deliveries: BTreeMap<DeliveryId, Delivery>,
    items: BTreeMap<ItemId, Item>,
    orders: BTreeMap<OrderId, OrderRecord>,
    lines: BTreeMap<OrderLineId, LineRecord>,
    failing_queries: HashSet<QueryKind>,
    failing_lookups: bool,
    reversed_line_summaries: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two members, three items, two orders:
    /// - order #1 by member1: itemA x2 @10000, itemB x1 @20000
    /// - order #2 by member2: itemC x3 @5000
    pub fn demo() -> Self {
        let mut store = Self::new();
        let member1 = store.add_member("member1", Address::new("Seoul", "test1", "11111"));
        let member2 = store.add_member("member2", Address::new("Busan", "222", "22222"));
        let item_a = store.add_item("itemA", 10000, 100);
        let item_b = store.add_item("itemB", 20000, 100);
        let item_c = store.add_item("itemC", 5000, 100);

        let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single().unwrap_or_else(Utc::now);
        store.insert_order(member1, &[(item_a, 2), (item_b, 1)], base);
        store.insert_order(member2, &[(item_c, 3)], base + Duration::minutes(1));
        store
    }

    // ------------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------------

    pub fn add_member(&mut self, name: impl Into<String>, address: Address) -> MemberId {
        let id = MemberId(next_key(&self.members, |id| id.0));
        self.members.insert(
            id,
            Member {
                id,
                name: name.into(),
                address,
            },
        );
        id
    }

    pub fn add_item(&mut self, name: impl Into<String>, price: i32, stock_quantity: i32) -> ItemId {
        let id = ItemId(next_key(&self.items, |id| id.0));
        self.items.insert(
            id,
            Item {
                id,
                name: name.into(),
                price,
                stock_quantity,
            },
        );
        id
    }

    #[cfg(test)]
    /// Place an order shipped to the member's address. Each line captures
    /// the item's current price.
    pub fn place_order(
        &mut self,
        member_id: MemberId,
        lines: &[(ItemId, i32)],
    ) -> Result<OrderId, StoreError> {
        if !self.members.contains_key(&member_id) {
            return Err(StoreError::NotFound(EntityKey::Member(member_id)));
        }
        if let Some((missing, _)) = lines.iter().find(|(item_id, _)| !self.items.contains_key(item_id)) {
            return Err(StoreError::NotFound(EntityKey::Item(*missing)));
        }

        let order_date = self
            .orders
            .values()
            .map(|order| order.order_date + Duration::minutes(1))
            .max()
            .unwrap_or_else(Utc::now);
        Ok(self.insert_order(member_id, lines, order_date))
    }

    #[cfg(test)]
    /// Returns false when no such order exists
    pub fn cancel_order(&mut self, order_id: OrderId) -> bool {
        match self.orders.get_mut(&order_id) {
            Some(order) => {
                order.status = OrderStatus::Cancelled;
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    /// Remove an item row while lines still point at it
    pub fn remove_item(&mut self, item_id: ItemId) -> Option<Item> {
        self.items.remove(&item_id)
    }

    fn insert_order(
        &mut self,
        member_id: MemberId,
        lines: &[(ItemId, i32)],
        order_date: DateTime<Utc>,
    ) -> OrderId {
        let address = self
            .members
            .get(&member_id)
            .map(|member| member.address.clone())
            .unwrap_or_else(|| Address::new("", "", ""));

        let delivery_id = DeliveryId(next_key(&self.deliveries, |id| id.0));
        self.deliveries.insert(
            delivery_id,
            Delivery {
                id: delivery_id,
                address,
                status: DeliveryStatus::Ready,
            },
        );

        let order_id = OrderId(next_key(&self.orders, |id| id.0));
        self.orders.insert(
            order_id,
            OrderRecord {
                id: order_id,
                member_id,
                delivery_id,
                status: OrderStatus::Ordered,
                order_date,
            },
        );

        for (item_id, count) in lines {
            let order_price = self.items.get(item_id).map(|item| item.price).unwrap_or(0);
            let line_id = OrderLineId(next_key(&self.lines, |id| id.0));
            self.lines.insert(
                line_id,
                LineRecord {
                    id: line_id,
                    order_id,
                    item_id: *item_id,
                    order_price,
                    count: *count,
                },
            );
        }

        order_id
    }

    // ------------------------------------------------------------------------
    // Test Hooks
    // ------------------------------------------------------------------------

    #[cfg(test)]
    pub fn fail_queries(mut self, kind: QueryKind) -> Self {
        self.failing_queries.insert(kind);
        self
    }

    #[cfg(test)]
    pub fn fail_lookups(mut self) -> Self {
        self.failing_lookups = true;
        self
    }

    #[cfg(test)]
    pub fn reverse_line_summaries(mut self) -> Self {
        self.reversed_line_summaries = true;
        self
    }

    // ------------------------------------------------------------------------
    // Query Evaluation
    // ------------------------------------------------------------------------

    fn member(&self, id: MemberId) -> Result<&Member, StoreError> {
        self.members
            .get(&id)
            .ok_or(StoreError::NotFound(EntityKey::Member(id)))
    }

    fn delivery(&self, id: DeliveryId) -> Result<&Delivery, StoreError> {
        self.deliveries
            .get(&id)
            .ok_or(StoreError::NotFound(EntityKey::Delivery(id)))
    }

    fn item(&self, id: ItemId) -> Result<&Item, StoreError> {
        self.items
            .get(&id)
            .ok_or(StoreError::NotFound(EntityKey::Item(id)))
    }

    /// Orders matching the search, in id order, before paging
    fn matching_orders(&self, search: &OrderSearch) -> Result<Vec<&OrderRecord>, StoreError> {
        let mut matching = Vec::new();
        for order in self.orders.values() {
            let member = self.member(order.member_id)?;
            if search.matches(&member.name, order.status) {
                matching.push(order);
            }
        }
        Ok(matching)
    }

    fn paged_orders(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<&OrderRecord>, StoreError> {
        let matching = self.matching_orders(search)?;
        Ok(match page {
            Some(page) => page.slice(matching),
            None => matching,
        })
    }

    fn lines_of(&self, order_id: OrderId) -> impl Iterator<Item = &LineRecord> {
        self.lines.values().filter(move |line| line.order_id == order_id)
    }

    fn summary_row(&self, order: &OrderRecord) -> Result<OrderSummaryRow, StoreError> {
        Ok(OrderSummaryRow {
            order_id: order.id,
            member_name: self.member(order.member_id)?.name.clone(),
            order_date: order.order_date,
            order_status: order.status,
            address: self.delivery(order.delivery_id)?.address.clone(),
        })
    }

    fn line_row(&self, line: &LineRecord) -> Result<OrderLineRow, StoreError> {
        Ok(OrderLineRow {
            order_id: line.order_id,
            order_line_id: line.id,
            item_name: self.item(line.item_id)?.name.clone(),
            order_price: line.order_price,
            count: line.count,
        })
    }

    fn evaluate(&self, query: &ReadQuery) -> Result<Vec<Row>, StoreError> {
        match query {
            ReadQuery::Orders { search, page } => Ok(self
                .paged_orders(search, *page)?
                .into_iter()
                .map(|order| {
                    Row::Order(Order::unresolved(
                        order.id,
                        order.member_id,
                        order.delivery_id,
                        order.status,
                        order.order_date,
                    ))
                })
                .collect()),

            ReadQuery::OrdersWithMemberDelivery { search, page } => self
                .paged_orders(search, *page)?
                .into_iter()
                .map(|order| {
                    Ok(Row::Order(Order {
                        id: order.id,
                        member: Ref::Loaded(self.member(order.member_id)?.clone()),
                        delivery: Ref::Loaded(self.delivery(order.delivery_id)?.clone()),
                        lines: OrderLines::Unloaded(order.id),
                        status: order.status,
                        order_date: order.order_date,
                    }))
                })
                .collect::<Result<Vec<_>, StoreError>>(),

            ReadQuery::LinesOfOrder { order_id } => Ok(self
                .lines_of(*order_id)
                .map(|line| {
                    Row::OrderLine(OrderLine {
                        id: line.id,
                        order_id: line.order_id,
                        item: Ref::Unloaded(line.item_id),
                        order_price: line.order_price,
                        count: line.count,
                    })
                })
                .collect()),

            ReadQuery::OrderSummaries { search, page } => self
                .paged_orders(search, *page)?
                .into_iter()
                .map(|order| self.summary_row(order).map(Row::Summary))
                .collect::<Result<Vec<_>, StoreError>>(),

            ReadQuery::OrderLineSummaries { order_ids } => {
                let wanted: HashSet<OrderId> = order_ids.iter().copied().collect();
                let mut rows = self
                    .lines
                    .values()
                    .filter(|line| wanted.contains(&line.order_id))
                    .map(|line| self.line_row(line).map(Row::LineSummary))
                    .collect::<Result<Vec<_>, _>>()?;
                if self.reversed_line_summaries {
                    rows.reverse();
                }
                Ok(rows)
            }

            ReadQuery::FlatOrderLines { search, page } => {
                let line_totals: HashMap<OrderId, i64> =
                    self.lines.values().fold(HashMap::new(), |mut totals, line| {
                        *totals.entry(line.order_id).or_insert(0) += 1;
                        totals
                    });

                let mut rows = Vec::new();
                for order in self.matching_orders(search)? {
                    let head = self.summary_row(order)?;
                    for line in self.lines_of(order.id) {
                        rows.push(FlatOrderRow {
                            order_id: head.order_id,
                            member_name: head.member_name.clone(),
                            order_date: head.order_date,
                            order_status: head.order_status,
                            address: head.address.clone(),
                            order_line_id: line.id,
                            item_name: self.item(line.item_id)?.name.clone(),
                            order_price: line.order_price,
                            count: line.count,
                            line_total: line_totals.get(&order.id).copied().unwrap_or(0),
                        });
                    }
                }

                let rows = match page {
                    Some(page) => page.slice(rows),
                    None => rows,
                };
                Ok(rows.into_iter().map(Row::Flat).collect())
            }
        }
    }
}

fn next_key<K: Ord, V>(table: &BTreeMap<K, V>, raw: impl Fn(&K) -> i64) -> i64 {
    table.keys().next_back().map(|key| raw(key) + 1).unwrap_or(1)
}

#[async_trait]
impl Store for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_by_id(&self, key: EntityKey) -> Result<Entity, StoreError> {
        if self.failing_lookups {
            return Err(StoreError::Unavailable(format!("lookup of {key} refused")));
        }

        match key {
            EntityKey::Member(id) => self.member(id).cloned().map(Entity::Member),
            EntityKey::Delivery(id) => self.delivery(id).cloned().map(Entity::Delivery),
            EntityKey::Item(id) => self.item(id).cloned().map(Entity::Item),
        }
    }

    async fn query(&self, query: &ReadQuery) -> Result<Vec<Row>, StoreError> {
        let kind = query.kind();
        if self.failing_queries.contains(&kind) {
            return Err(StoreError::Unavailable(format!(
                "{} query refused",
                kind.as_str()
            )));
        }
        self.evaluate(query)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
