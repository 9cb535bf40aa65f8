//! Mock account management.
//!
//! Accounts are client-side only: the server knows nothing about them. The
//! directory persists to a single JSON document and the session to a
//! second, both under the client data directory.

pub mod directory;
pub mod session;

pub use directory::{NewUser, Role, UserDirectory, UserError, UserRecord, UserUpdate, DEFAULT_ADMIN_ID};
pub use session::{Session, SessionStore};
