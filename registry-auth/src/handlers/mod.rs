pub mod identity;
pub mod metrics;
pub mod namespaces;

pub use identity::get_identity;
pub use namespaces::get_namespace_access;
