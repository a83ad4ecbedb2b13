//! Typed client for the remote design platform.
//!
//! Covers the OAuth2 authorization-code-with-PKCE flow, the small set of REST
//! operations the bot performs on behalf of a user (upload asset, create
//! design, list designs, export), and the bounded export-status poller.
pub mod auth;
pub mod client;
pub mod export;
pub mod pkce;

pub use auth::{AuthError, Authorizer, TokenExchanger};
pub use client::{DesignClient, PlatformError};
pub use export::{ExportOutcome, ExportStatusSource, PollPolicy, poll_export};
pub use pkce::{PkcePair, challenge_for, generate_pair};
