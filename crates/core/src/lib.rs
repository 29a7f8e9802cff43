//! Core domain for SMS campaign dispatch: campaigns, per-recipient messages,
//! dispatch jobs, configuration, and the collaborator traits the dispatch
//! engine is written against.

pub mod config;
pub mod error;
pub mod phone;
pub mod store;
pub mod templates;
pub mod text;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use phone::normalize_phone;
pub use store::{MessageStore, UnsubscribeRegistry};
pub use templates::render_template;
