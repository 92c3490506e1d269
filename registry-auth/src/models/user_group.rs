//! User group model - named groups that SSO identities are members of.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User group. `site_admin` grants access to every namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserGroup {
    pub name: String,
    pub site_admin: bool,
}

impl UserGroup {
    pub fn new(name: &str, site_admin: bool) -> Self {
        Self {
            name: name.to_string(),
            site_admin,
        }
    }
}
