pub mod namespace;
pub mod permission;
pub mod provider_source;
pub mod session;
pub mod user_group;

pub use namespace::Namespace;
pub use permission::{NamespacePermission, PermissionLevel};
pub use provider_source::{ProviderSource, ProviderSourceType, ProviderSources};
pub use session::{AuthenticationType, OrganisationType, SessionRecord};
pub use user_group::UserGroup;
