//! Services layer: the external collaborators the auth core consults.

pub mod database;
pub mod error;
pub mod identity_provider;
pub mod metrics;
pub mod permission_store;
pub mod session_store;

pub use error::ServiceError;
pub use identity_provider::{OidcTokenValidator, StaticTokenValidator, TokenValidator};
pub use permission_store::{InMemoryPermissionStore, PermissionStore, PgPermissionStore};
pub use session_store::{MockSessionStore, RedisSessionStore, SessionStore};
