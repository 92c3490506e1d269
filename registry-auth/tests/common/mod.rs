//! Shared fixtures for registry-auth integration tests.
//!
//! Everything runs against in-process stores; no Redis or PostgreSQL needed.

#![allow(dead_code)]

use chrono::Duration;
use registry_auth::{
    auth::{AuthBackends, AuthFactory, RequestCredentials},
    config::{
        AuthConfig, AuthSettings, CorsConfig, DatabaseConfig, Environment, OpenidConnectConfig,
        RedisConfig, SamlConfig,
    },
    models::{session::keys, ProviderSource, ProviderSourceType, ProviderSources, SessionRecord},
    services::{InMemoryPermissionStore, MockSessionStore, StaticTokenValidator},
    AppState,
};
use serde_json::json;
use std::sync::Arc;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const UPLOAD_KEY: &str = "upload-key";
pub const PUBLISH_KEY: &str = "publish-key";

/// Settings with every mechanism configured and access controls on.
pub fn all_enabled_settings() -> AuthSettings {
    AuthSettings {
        secret_key: "test-secret-key-0123456789".to_string(),
        admin_authentication_token: ADMIN_TOKEN.to_string(),
        upload_api_keys: vec![UPLOAD_KEY.to_string()],
        publish_api_keys: vec![PUBLISH_KEY.to_string()],
        enable_access_controls: true,
        allow_unauthenticated_access: true,
        openid_connect: OpenidConnectConfig {
            client_id: "registry".to_string(),
            client_secret: "client-secret".to_string(),
            issuer: "https://idp.example.com".to_string(),
            verification_key: "verification-key".to_string(),
        },
        saml: SamlConfig {
            idp_metadata_url: "https://idp.example.com/metadata".to_string(),
            entity_id: "registry".to_string(),
            group_attribute: "groups".to_string(),
        },
        provider_sources: ProviderSources::new(vec![github_source(false)]),
    }
}

pub fn github_source(auto_generate: bool) -> ProviderSource {
    ProviderSource {
        name: "GitHub".to_string(),
        source_type: ProviderSourceType::Github,
        enabled: true,
        login_button_text: Some("Login with GitHub".to_string()),
        base_url: Some("https://github.com".to_string()),
        api_url: Some("https://api.github.com".to_string()),
        auto_generate_github_organisation_namespaces: auto_generate,
    }
}

/// The permission fixture used across scenarios.
pub fn seeded_permissions() -> InMemoryPermissionStore {
    let store = InMemoryPermissionStore::new();
    store.add_group("siteadmins", true);
    store.add_group("modifyonly", false);
    store.add_group("fullaccess", false);
    store.grant(
        "modifyonly",
        "first-namespace",
        registry_auth::models::PermissionLevel::Modify,
    );
    store.grant(
        "fullaccess",
        "first-namespace",
        registry_auth::models::PermissionLevel::Full,
    );
    store
}

pub struct TestBackends {
    pub settings: AuthSettings,
    pub sessions: MockSessionStore,
    pub permissions: Arc<InMemoryPermissionStore>,
    pub token_valid: bool,
}

impl TestBackends {
    pub fn new(settings: AuthSettings) -> Self {
        Self {
            settings,
            sessions: MockSessionStore::new(),
            permissions: Arc::new(seeded_permissions()),
            token_valid: true,
        }
    }

    pub fn with_session(mut self, session: SessionRecord) -> Self {
        self.sessions = self.sessions.with_session(session);
        self
    }

    pub fn build(self) -> AuthBackends {
        AuthBackends::new(
            self.settings,
            Arc::new(self.sessions),
            self.permissions,
            Arc::new(StaticTokenValidator(self.token_valid)),
        )
    }

    pub fn factory(self) -> AuthFactory {
        AuthFactory::new(&self.build())
    }
}

pub fn session_with_tag(id: &str, tag: &str) -> SessionRecord {
    SessionRecord::new(id, Duration::minutes(30))
        .with(keys::IS_ADMIN_AUTHENTICATED, true)
        .with(keys::AUTHENTICATION_TYPE, tag)
}

pub fn password_session(id: &str) -> SessionRecord {
    session_with_tag(id, "SESSION_PASSWORD")
}

pub fn saml_session(id: &str, groups: &[&str]) -> SessionRecord {
    session_with_tag(id, "SESSION_SAML")
        .with(keys::SAML_NAME_ID, "saml-user")
        .with(keys::SAML_USER_DATA, json!({ "groups": groups }))
}

pub fn oidc_session(id: &str, groups: &[&str]) -> SessionRecord {
    session_with_tag(id, "SESSION_OPENID_CONNECT")
        .with(keys::OPENID_CONNECT_ID_TOKEN, "id-token")
        .with(
            keys::OPENID_CONNECT_EXPIRES_AT,
            chrono::Utc::now().timestamp() + 600,
        )
        .with(keys::OPENID_USERNAME, "oidc-user")
        .with(keys::OPENID_GROUPS, json!(groups))
}

pub fn github_session(id: &str, organisations: serde_json::Value) -> SessionRecord {
    session_with_tag(id, "SESSION_GITHUB")
        .with(keys::GITHUB_USERNAME, "octocat")
        .with(keys::PROVIDER_SOURCE, "github")
        .with(keys::ORGANISATIONS, organisations)
}

pub fn session_credentials(id: &str) -> RequestCredentials {
    RequestCredentials::default().with_session_id(id)
}

pub fn api_key_credentials(key: &str) -> RequestCredentials {
    RequestCredentials::default().with_api_key(key)
}

pub fn test_config(settings: AuthSettings) -> AuthConfig {
    AuthConfig {
        common: registry_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "registry-auth-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        redis: RedisConfig {
            url: "redis://127.0.0.1:6379".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/registry_test".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5000".to_string()],
        },
        auth: settings,
    }
}

pub fn test_state(backends: TestBackends) -> AppState {
    let config = test_config(backends.settings.clone());
    AppState::new(config, backends.build())
}
