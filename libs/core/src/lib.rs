//! Instadesign core contracts and value types.
//!
//! This crate exposes the data structures shared between the gateway and the
//! remote-API client crates, the inbound-message intent classifier, and the
//! session-keyed access-token store.
pub mod intent;
pub mod token_store;
pub mod types;

pub use intent::*;
pub use token_store::*;
pub use types::*;
