use crate::models::ProviderSources;
use registry_core::config as core_config;
use registry_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub redis: RedisConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// Everything the auth core reads. Read-only after startup.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Session signing secret. Empty disables every session-backed method.
    pub secret_key: String,
    /// Enables the admin API key and admin password session methods.
    pub admin_authentication_token: String,
    pub upload_api_keys: Vec<String>,
    pub publish_api_keys: Vec<String>,
    /// When false every SSO identity is treated as a site admin.
    pub enable_access_controls: bool,
    pub allow_unauthenticated_access: bool,
    pub openid_connect: OpenidConnectConfig,
    pub saml: SamlConfig,
    pub provider_sources: ProviderSources,
}

#[derive(Debug, Clone, Default)]
pub struct OpenidConnectConfig {
    pub client_id: String,
    pub client_secret: String,
    pub issuer: String,
    /// PEM encoded RSA or EC public key, or a shared secret for HMAC signed
    /// tokens. The key type fixes the accepted token algorithms.
    pub verification_key: String,
}

#[derive(Debug, Clone)]
pub struct SamlConfig {
    pub idp_metadata_url: String,
    pub entity_id: String,
    pub group_attribute: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            admin_authentication_token: String::new(),
            upload_api_keys: Vec::new(),
            publish_api_keys: Vec::new(),
            enable_access_controls: false,
            allow_unauthenticated_access: true,
            openid_connect: OpenidConnectConfig::default(),
            saml: SamlConfig::default(),
            provider_sources: ProviderSources::default(),
        }
    }
}

impl Default for SamlConfig {
    fn default() -> Self {
        Self {
            idp_metadata_url: String::new(),
            entity_id: String::new(),
            group_attribute: "groups".to_string(),
        }
    }
}

impl AuthSettings {
    pub fn sessions_enabled(&self) -> bool {
        !self.secret_key.is_empty()
    }

    pub fn admin_token_enabled(&self) -> bool {
        !self.admin_authentication_token.is_empty()
    }

    pub fn upload_keys_enabled(&self) -> bool {
        self.upload_api_keys.iter().any(|k| !k.is_empty())
    }

    pub fn publish_keys_enabled(&self) -> bool {
        self.publish_api_keys.iter().any(|k| !k.is_empty())
    }
}

impl OpenidConnectConfig {
    pub fn is_enabled(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.issuer.is_empty()
    }
}

impl SamlConfig {
    pub fn is_enabled(&self) -> bool {
        !self.idp_metadata_url.is_empty() && !self.entity_id.is_empty()
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let provider_sources =
            ProviderSources::from_json(&get_optional_env("PROVIDER_SOURCES").unwrap_or_default())
                .map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid PROVIDER_SOURCES: {}", e))
                })?;

        let config = AuthConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("registry-auth"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
            redis: RedisConfig {
                url: get_env("REDIS_URL", Some("redis://127.0.0.1:6379"), is_prod)?,
            },
            database: DatabaseConfig {
                url: get_env(
                    "DATABASE_URL",
                    Some("postgres://localhost/registry"),
                    is_prod,
                )?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 1)?,
            },
            cors: CorsConfig {
                allowed_origins: split_list(&get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:5000"),
                    is_prod,
                )?),
            },
            auth: AuthSettings {
                secret_key: get_optional_env("SECRET_KEY").unwrap_or_default(),
                admin_authentication_token: get_optional_env("ADMIN_AUTHENTICATION_TOKEN")
                    .unwrap_or_default(),
                upload_api_keys: split_list(
                    &get_optional_env("UPLOAD_API_KEYS").unwrap_or_default(),
                ),
                publish_api_keys: split_list(
                    &get_optional_env("PUBLISH_API_KEYS").unwrap_or_default(),
                ),
                enable_access_controls: parse_env("ENABLE_ACCESS_CONTROLS", false)?,
                allow_unauthenticated_access: parse_env("ALLOW_UNAUTHENTICATED_ACCESS", true)?,
                openid_connect: OpenidConnectConfig {
                    client_id: get_optional_env("OPENID_CONNECT_CLIENT_ID").unwrap_or_default(),
                    client_secret: get_optional_env("OPENID_CONNECT_CLIENT_SECRET")
                        .unwrap_or_default(),
                    issuer: get_optional_env("OPENID_CONNECT_ISSUER").unwrap_or_default(),
                    verification_key: get_optional_env("OPENID_CONNECT_VERIFICATION_KEY")
                        .unwrap_or_default(),
                },
                saml: SamlConfig {
                    idp_metadata_url: get_optional_env("SAML2_IDP_METADATA_URL")
                        .unwrap_or_default(),
                    entity_id: get_optional_env("SAML2_ENTITY_ID").unwrap_or_default(),
                    group_attribute: get_optional_env("SAML2_GROUP_ATTRIBUTE")
                        .unwrap_or_else(|| "groups".to_string()),
                },
                provider_sources,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.auth.openid_connect.is_enabled()
            && self.auth.openid_connect.verification_key.is_empty()
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "OPENID_CONNECT_VERIFICATION_KEY is required when OpenID Connect is configured"
            )));
        }

        if self.environment == Environment::Prod {
            if self.auth.sessions_enabled() && self.auth.secret_key.len() < 16 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "SECRET_KEY must be at least 16 bytes in production"
                )));
            }

            if self.cors.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if !self.auth.enable_access_controls {
                tracing::warn!(
                    "Access controls are disabled - every SSO user is treated as a site admin"
                );
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

/// Optional settings: unset and empty are the same thing.
fn get_optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e))
        }),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
