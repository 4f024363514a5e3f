use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Entity, EntityKey, ReadQuery, Row, Store, StoreError};

// ============================================================================
// Store Session - Request-Scoped Store Handle
// ============================================================================
//
// Acquire a session, run one hydration, drop the session.
//
// The session borrows the store, so the store outlives every lazy
// resolution made through it. It holds:
// - An identity map: each EntityKey is fetched at most once per session
// - A round-trip counter: every query and every uncached lookup counts one
//
// Sessions are never shared between requests and keep nothing afterwards.
//
// ============================================================================

pub struct StoreSession<'s> {
    store: &'s dyn Store,
    session_id: Uuid,
    identity_map: Mutex<HashMap<EntityKey, Entity>>,
    round_trips: AtomicUsize,
}

impl<'s> StoreSession<'s> {
    pub fn new(store: &'s dyn Store) -> Self {
        Self {
            store,
            session_id: Uuid::now_v7(),
            identity_map: Mutex::new(HashMap::new()),
            round_trips: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.session_id
    }

    /// Round trips issued so far, cache hits excluded
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    /// Lookup by key, served from the identity map when already resolved.
    ///
    /// The map stays locked across the store fetch, so concurrent resolves
    /// of one key within a session reach the store once.
    pub async fn resolve(&self, key: EntityKey) -> Result<Entity, StoreError> {
        let mut identity_map = self.identity_map.lock().await;
        if let Some(entity) = identity_map.get(&key) {
            return Ok(entity.clone());
        }

        self.round_trips.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            session_id = %self.session_id,
            backend = self.store.backend(),
            key = %key,
            "Resolving lazy association"
        );

        let entity = self.store.get_by_id(key).await?;
        identity_map.insert(key, entity.clone());
        Ok(entity)
    }

    pub async fn query(&self, query: &ReadQuery) -> Result<Vec<Row>, StoreError> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);

        let rows = self.store.query(query).await?;

        tracing::debug!(
            session_id = %self.session_id,
            backend = self.store.backend(),
            query = query.kind().as_str(),
            rows = rows.len(),
            "Executed read query"
        );

        Ok(rows)
    }
}
