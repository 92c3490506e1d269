//! Namespace permission model - per-group access levels on a namespace.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Access level a group holds on a namespace.
///
/// Variant order is the permission order: `Full` dominates `Modify`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionLevel {
    Modify,
    Full,
}

impl PermissionLevel {
    /// Whether holding `self` is enough for a request at `requested`.
    pub fn satisfies(self, requested: PermissionLevel) -> bool {
        self >= requested
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Modify => "MODIFY",
            PermissionLevel::Full => "FULL",
        }
    }
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PermissionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MODIFY" => Ok(PermissionLevel::Modify),
            "FULL" => Ok(PermissionLevel::Full),
            _ => Err(format!("Invalid permission level: {}", s)),
        }
    }
}

/// Stored (group, namespace) permission row. At most one per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NamespacePermission {
    pub group_name: String,
    pub namespace: String,
    #[sqlx(try_from = "String")]
    pub permission_type: PermissionLevel,
}

impl TryFrom<String> for PermissionLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl NamespacePermission {
    pub fn new(group_name: &str, namespace: &str, permission_type: PermissionLevel) -> Self {
        Self {
            group_name: group_name.to_string(),
            namespace: namespace.to_string(),
            permission_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_dominates_modify() {
        assert!(PermissionLevel::Full > PermissionLevel::Modify);
        assert!(PermissionLevel::Full.satisfies(PermissionLevel::Modify));
        assert!(PermissionLevel::Full.satisfies(PermissionLevel::Full));
        assert!(PermissionLevel::Modify.satisfies(PermissionLevel::Modify));
        assert!(!PermissionLevel::Modify.satisfies(PermissionLevel::Full));
    }

    #[test]
    fn test_parse_permission_level() {
        assert_eq!("full".parse::<PermissionLevel>(), Ok(PermissionLevel::Full));
        assert_eq!(
            "MODIFY".parse::<PermissionLevel>(),
            Ok(PermissionLevel::Modify)
        );
        assert!("read".parse::<PermissionLevel>().is_err());
    }

    #[test]
    fn test_serializes_uppercase() {
        let json = serde_json::to_string(&PermissionLevel::Modify).unwrap();
        assert_eq!(json, "\"MODIFY\"");
    }
}
