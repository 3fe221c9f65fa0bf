//! identity-adapter: mediates between an application and a hosted
//! identity provider.
//!
//! Two halves: change-tracked [`models::Group`] / [`models::User`]
//! entities synchronized against the provider's canonical records, and
//! the [`session::AuthSession`] state machine driving login, challenge
//! response, and sign-out.

pub mod config;
pub mod models;
pub mod services;
pub mod session;

pub use provider_core;
