// ============================================================================
// Domain Layer - Order Aggregate and Its Associations
// ============================================================================
//
// Read-side view of the shop domain:
// - Value objects (ids, Address, OrderStatus, DeliveryStatus)
// - Entities (Order, OrderLine, Member, Delivery, Item)
// - Lazy references for associations that are not fetched with their owner
// - Order search filter and paging
//
// Entities are produced by the store and consumed read-only by the
// hydration layer. Nothing here writes to the store.
//
// ============================================================================

pub mod value_objects;
pub mod entities;
pub mod lazy;
pub mod search;

// Re-export for convenience
pub use value_objects::*;
pub use entities::*;
pub use lazy::*;
pub use search::*;
