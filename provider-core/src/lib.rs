//! provider-core: Shared client infrastructure for the identity-adapter workspace.
pub mod client;
pub mod error;
pub mod http;
pub mod pagination;
pub mod types;

pub use async_trait;
pub use serde;
pub use serde_json;
