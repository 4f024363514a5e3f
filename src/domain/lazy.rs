use std::fmt;

use crate::store::{Entity, EntityKey, ReadQuery, Row, StoreError, StoreSession};

use super::entities::{Delivery, Item, Member, OrderLine};
use super::value_objects::{DeliveryId, ItemId, MemberId, OrderId};

// ============================================================================
// Lazy Associations
// ============================================================================
//
// An association that was not fetched together with its owner is held as an
// unresolved handle. Resolving it is an explicit call that takes the request's
// StoreSession, so every extra round trip is visible at the call site and is
// counted by the session.
//
// ============================================================================

/// Entity that can sit behind a to-one [`Ref`]
pub trait Loadable: Clone + Sized {
    type Id: Copy + fmt::Debug + PartialEq;

    fn id(&self) -> Self::Id;

    fn key(id: Self::Id) -> EntityKey;

    fn from_entity(entity: Entity) -> Option<Self>;
}

/// To-one association: either the resolved value or the handle to fetch it
#[derive(Debug, Clone)]
pub enum Ref<T: Loadable> {
    Loaded(T),
    Unloaded(T::Id),
}

impl<T: Loadable> Ref<T> {
    pub fn id(&self) -> T::Id {
        match self {
            Ref::Loaded(value) => value.id(),
            Ref::Unloaded(id) => *id,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Ref::Loaded(_))
    }

    /// The value, if already resolved. Never touches the store.
    #[cfg(test)]
    pub fn get(&self) -> Option<&T> {
        match self {
            Ref::Loaded(value) => Some(value),
            Ref::Unloaded(_) => None,
        }
    }

    /// Resolve through the session on first touch, then serve the cached value
    pub async fn load(&mut self, session: &StoreSession<'_>) -> Result<&T, StoreError> {
        if !self.is_loaded() {
            let key = T::key(self.id());
            let entity = session.resolve(key).await?;
            let value = T::from_entity(entity).ok_or_else(|| {
                StoreError::Decode(format!("{key} resolved to a different entity kind"))
            })?;
            *self = Ref::Loaded(value);
        }

        match self {
            Ref::Loaded(value) => Ok(value),
            Ref::Unloaded(id) => Err(StoreError::NotFound(T::key(*id))),
        }
    }
}

/// To-many association from an order to its lines
#[derive(Debug, Clone)]
pub enum OrderLines {
    Loaded(Vec<OrderLine>),
    Unloaded(OrderId),
}

impl OrderLines {
    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        matches!(self, OrderLines::Loaded(_))
    }

    #[cfg(test)]
    pub fn get(&self) -> Option<&[OrderLine]> {
        match self {
            OrderLines::Loaded(lines) => Some(lines),
            OrderLines::Unloaded(_) => None,
        }
    }

    /// Fetch the whole collection with one query on first touch
    pub async fn load(
        &mut self,
        session: &StoreSession<'_>,
    ) -> Result<&mut Vec<OrderLine>, StoreError> {
        if let OrderLines::Unloaded(order_id) = *self {
            let rows = session.query(&ReadQuery::LinesOfOrder { order_id }).await?;
            let lines = rows
                .into_iter()
                .map(Row::into_order_line)
                .collect::<Result<Vec<_>, _>>()?;
            *self = OrderLines::Loaded(lines);
        }

        match self {
            OrderLines::Loaded(lines) => Ok(lines),
            OrderLines::Unloaded(order_id) => Err(StoreError::Decode(format!(
                "lines of order {order_id} were not materialized"
            ))),
        }
    }
}

// ============================================================================
// Loadable Implementations
// ============================================================================

impl Loadable for Member {
    type Id = MemberId;

    fn id(&self) -> MemberId {
        self.id
    }

    fn key(id: MemberId) -> EntityKey {
        EntityKey::Member(id)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Member(member) => Some(member),
            _ => None,
        }
    }
}

impl Loadable for Delivery {
    type Id = DeliveryId;

    fn id(&self) -> DeliveryId {
        self.id
    }

    fn key(id: DeliveryId) -> EntityKey {
        EntityKey::Delivery(id)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Delivery(delivery) => Some(delivery),
            _ => None,
        }
    }
}

impl Loadable for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }

    fn key(id: ItemId) -> EntityKey {
        EntityKey::Item(id)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Item(item) => Some(item),
            _ => None,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;
    use crate::store::InMemoryStore;

    fn store_with_member() -> (InMemoryStore, MemberId) {
        let mut store = InMemoryStore::new();
        let member_id = store.add_member("member1", Address::new("Seoul", "test1", "11111"));
        (store, member_id)
    }

    #[tokio::test]
    async fn test_ref_load_issues_one_round_trip_then_caches() {
        let (store, member_id) = store_with_member();
        let session = StoreSession::new(&store);
        let mut member: Ref<Member> = Ref::Unloaded(member_id);

        assert_eq!(member.load(&session).await.unwrap().name, "member1");
        assert_eq!(member.load(&session).await.unwrap().name, "member1");

        assert!(member.is_loaded());
        assert_eq!(session.round_trips(), 1);
    }

    #[tokio::test]
    async fn test_distinct_refs_to_same_target_share_the_identity_map() {
        let (store, member_id) = store_with_member();
        let session = StoreSession::new(&store);
        let mut first: Ref<Member> = Ref::Unloaded(member_id);
        let mut second: Ref<Member> = Ref::Unloaded(member_id);

        first.load(&session).await.unwrap();
        second.load(&session).await.unwrap();

        assert_eq!(session.round_trips(), 1);
    }

    #[tokio::test]
    async fn test_loaded_ref_never_touches_the_store() {
        let (store, member_id) = store_with_member();
        let session = StoreSession::new(&store);
        let mut member = Ref::Loaded(Member {
            id: member_id,
            name: "preloaded".to_string(),
            address: Address::new("Busan", "222", "22222"),
        });

        assert_eq!(member.load(&session).await.unwrap().name, "preloaded");
        assert_eq!(session.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_ref_to_missing_row_is_not_found() {
        let store = InMemoryStore::new();
        let session = StoreSession::new(&store);
        let mut item: Ref<Item> = Ref::Unloaded(ItemId(99));

        let err = item.load(&session).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(EntityKey::Item(ItemId(99)))));
        assert!(!item.is_loaded());
    }

    #[tokio::test]
    async fn test_order_lines_load_as_one_query() {
        let mut store = InMemoryStore::new();
        let member = store.add_member("member1", Address::new("Seoul", "test1", "11111"));
        let item_a = store.add_item("itemA", 10000, 100);
        let item_b = store.add_item("itemB", 20000, 100);
        let order_id = store.place_order(member, &[(item_a, 2), (item_b, 1)]).unwrap();

        let session = StoreSession::new(&store);
        let mut lines = OrderLines::Unloaded(order_id);
        let loaded = lines.load(&session).await.unwrap();

        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|line| !line.item.is_loaded()));
        assert_eq!(session.round_trips(), 1);

        lines.load(&session).await.unwrap();
        assert_eq!(session.round_trips(), 1);
        assert_eq!(lines.get().map(<[OrderLine]>::len), Some(2));
    }
}
