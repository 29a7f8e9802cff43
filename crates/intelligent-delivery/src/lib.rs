//! Delivery suppression — the unsubscribe registry and the per-run filter
//! the dispatcher consults before contacting the provider.

pub mod unsubscribe;

pub use unsubscribe::{UnsubscribeEntry, UnsubscribeFilter, UnsubscribeList};
