//! Session model - server-side key/value bag keyed by an opaque session id.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Session keys read by the auth core. Written by the login flows.
pub mod keys {
    pub const IS_ADMIN_AUTHENTICATED: &str = "is_admin_authenticated";
    pub const AUTHENTICATION_TYPE: &str = "authentication_type";

    pub const OPENID_CONNECT_ID_TOKEN: &str = "openid_connect_id_token";
    pub const OPENID_CONNECT_EXPIRES_AT: &str = "openid_connect_expires_at";
    pub const OPENID_USERNAME: &str = "openid_username";
    pub const OPENID_GROUPS: &str = "openid_groups";

    pub const SAML_NAME_ID: &str = "saml_name_id";
    pub const SAML_USER_DATA: &str = "saml_user_data";

    pub const GITHUB_USERNAME: &str = "github_username";
    pub const ORGANISATIONS: &str = "organisations";
    pub const PROVIDER_SOURCE: &str = "provider_source";
}

/// Which login flow produced a session. Exactly one per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticationType {
    SessionPassword,
    SessionOpenidConnect,
    SessionSaml,
    SessionGithub,
}

impl AuthenticationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationType::SessionPassword => "SESSION_PASSWORD",
            AuthenticationType::SessionOpenidConnect => "SESSION_OPENID_CONNECT",
            AuthenticationType::SessionSaml => "SESSION_SAML",
            AuthenticationType::SessionGithub => "SESSION_GITHUB",
        }
    }
}

impl std::str::FromStr for AuthenticationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SESSION_PASSWORD" => Ok(AuthenticationType::SessionPassword),
            "SESSION_OPENID_CONNECT" => Ok(AuthenticationType::SessionOpenidConnect),
            "SESSION_SAML" => Ok(AuthenticationType::SessionSaml),
            "SESSION_GITHUB" => Ok(AuthenticationType::SessionGithub),
            _ => Err(format!("Invalid authentication type: {}", s)),
        }
    }
}

/// Kind of GitHub account recorded against a login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganisationType {
    User,
    Organisation,
}

/// Stored session: id, absolute expiry and the data bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub expiry: DateTime<Utc>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl SessionRecord {
    pub fn new(session_id: &str, ttl: Duration) -> Self {
        Self {
            session_id: session_id.to_string(),
            expiry: Utc::now() + ttl,
            data: Map::new(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expiry <= Utc::now()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Builder-style `set` for constructing sessions in login flows and tests.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Only a literal `true` counts; missing, `false`, `1` or `"true"` do not.
    pub fn is_admin_authenticated(&self) -> bool {
        matches!(
            self.data.get(keys::IS_ADMIN_AUTHENTICATED),
            Some(Value::Bool(true))
        )
    }

    pub fn authentication_type(&self) -> Option<AuthenticationType> {
        self.get_str(keys::AUTHENTICATION_TYPE)?.parse().ok()
    }

    /// String list stored under `key`; non-string entries are skipped.
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.data
            .get(key)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// GitHub organisation map recorded at login. Entries with an unknown
    /// account type are skipped; a non-object value reads as empty.
    pub fn organisations(&self) -> BTreeMap<String, OrganisationType> {
        let Some(entries) = self.data.get(keys::ORGANISATIONS).and_then(Value::as_object) else {
            return BTreeMap::new();
        };

        entries
            .iter()
            .filter_map(|(name, kind)| {
                match serde_json::from_value::<OrganisationType>(kind.clone()) {
                    Ok(kind) => Some((name.clone(), kind)),
                    Err(e) => {
                        tracing::debug!(
                            organisation = %name,
                            account_type = %kind,
                            error = %e,
                            "Skipping organisation with unknown account type"
                        );
                        None
                    }
                }
            })
            .collect()
    }
}
