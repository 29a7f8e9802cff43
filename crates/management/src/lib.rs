//! Campaign management backend — in-memory store plus the thin REST layer
//! over the dispatch engine.
//!
//! Data stored in DashMap (development); swap the `MessageStore`
//! implementation for a database in production.

pub mod auth;
pub mod handlers;
pub mod models;
pub mod router;
pub mod store;

pub use handlers::ManagementState;
pub use router::management_router;
pub use store::InMemoryStore;
