// ============================================================================
// Order Hydration - Read models for the order aggregate
// ============================================================================
//
// Turns orders, their member, delivery and lines into flat OrderSummary
// values. The strategies differ only in how many round trips they spend
// and in how they page.
//
// ============================================================================

mod errors;
mod hydrator;
mod projection;
pub mod strategies;

pub use errors::HydrationError;
pub use hydrator::{parse_filter, OrderHydrator};
pub use projection::{OrderLineSummary, OrderSummary, SimpleOrderSummary};
pub use strategies::{SimpleStrategy, Strategy};
