//! Provider source model - configured instances of external SSO mechanisms.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSourceType {
    Github,
}

/// One configured SSO provider instance (e.g. a GitHub Enterprise host).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSource {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: ProviderSourceType,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub login_button_text: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    /// Treat organisation membership recorded at login as FULL namespace
    /// access and create the matching namespaces on demand.
    #[serde(default)]
    pub auto_generate_github_organisation_namespaces: bool,
}

fn default_enabled() -> bool {
    true
}

impl ProviderSource {
    /// URL-safe name used to reference the source from sessions.
    pub fn api_name(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect()
    }

    pub fn is_usable_github(&self) -> bool {
        self.enabled && self.source_type == ProviderSourceType::Github
    }
}

/// Read-only registry of the provider sources known to this deployment.
#[derive(Debug, Clone, Default)]
pub struct ProviderSources {
    sources: Vec<ProviderSource>,
}

impl ProviderSources {
    pub fn new(sources: Vec<ProviderSource>) -> Self {
        Self { sources }
    }

    /// Parse the `PROVIDER_SOURCES` JSON list.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let sources: Vec<ProviderSource> = serde_json::from_str(raw)?;
        Ok(Self::new(sources))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderSource> {
        self.sources.iter()
    }

    /// Look up a source by its API name.
    pub fn get_by_api_name(&self, api_name: &str) -> Option<&ProviderSource> {
        self.sources.iter().find(|s| s.api_name() == api_name)
    }

    /// Resolve a session's recorded source to a usable GitHub source.
    /// Missing, disabled or non-GitHub sources resolve to `None`.
    pub fn github_source(&self, api_name: &str) -> Option<&ProviderSource> {
        self.get_by_api_name(api_name)
            .filter(|source| source.is_usable_github())
    }

    pub fn has_github_sources(&self) -> bool {
        self.sources.iter().any(ProviderSource::is_usable_github)
    }
}
