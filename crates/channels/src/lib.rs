//! Outbound delivery channels.
//!
//! The dispatch engine only sees [`DeliveryProvider`]: send one text to one
//! phone, get back accepted/rejected plus the provider's response body.

pub mod provider;
pub mod sms;

pub use provider::{DeliveryError, DeliveryProvider, DeliveryResponse};
pub use sms::HttpSmsProvider;
