//! Services layer for the identity adapter.
//!
//! Holds the directory handle over the provider plus the collaborator
//! seams (invite mail, message catalog) the entities and session
//! depend on.

mod directory;
pub mod error;
mod mailer;
mod messages;

pub use directory::Directory;
pub use error::AdapterError;
pub use mailer::{InviteMailer, MockInviteMailer};
pub use messages::MessageCatalog;
