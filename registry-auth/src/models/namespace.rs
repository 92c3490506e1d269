//! Namespace model - the unit packages are grouped and authorized under.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Namespace {
    pub name: String,
    pub display_name: Option<String>,
}

impl Namespace {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: None,
        }
    }
}
