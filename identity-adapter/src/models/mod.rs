//! Remote-backed entities with snapshot change tracking.

pub mod group;
pub mod tracked;
pub mod user;

pub use group::{Group, UserHandle};
pub use tracked::{Tracked, TrackedAttrs};
pub use user::User;
