//! Authentication method resolution and authorization.

pub mod backends;
pub mod context;
pub mod error;
pub mod factory;
pub mod method;
pub mod methods;
pub mod namespace_access;
pub mod session_validity;

pub use backends::{AuthBackends, RequestCredentials};
pub use context::AuthContext;
pub use error::AuthError;
pub use factory::AuthFactory;
pub use method::{AuthMethod, AuthMethodKind, AuthMethodResolver, NamespacePermissionMap};
pub use namespace_access::NamespaceAuthorizer;
pub use session_validity::{check_session, SessionCheck};
