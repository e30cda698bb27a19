pub mod card;
pub mod comments;
pub mod compose;
pub mod config;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod inflight;
pub mod models;
pub mod notice;
pub mod profile;
#[cfg(feature = "rest-gateway")]
pub mod rest;
pub mod session;

// Re-export commonly used items for tests / external users
pub use card::{PostCard, ViewContext};
pub use engagement::{LikeReconciler, Phase, ToggleOutcome};
pub use error::{ActionError, GatewayError};
pub use feed::{FeedList, LanguageFilter};
pub use gateway::Gateway;
pub use profile::ProfileView;
