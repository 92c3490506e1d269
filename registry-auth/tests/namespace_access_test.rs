//! Namespace authorization through resolved SSO identities.

mod common;

use common::*;
use registry_auth::auth::{AuthFactory, AuthMethod, AuthMethodKind};
use registry_auth::config::AuthSettings;
use registry_auth::models::{PermissionLevel, ProviderSources};
use registry_auth::services::PermissionStore;
use serde_json::json;
use std::sync::Arc;

const NAMESPACES: [&str; 3] = ["first-namespace", "second-namespace", "acme"];
const LEVELS: [PermissionLevel; 2] = [PermissionLevel::Modify, PermissionLevel::Full];

async fn resolve(factory: &AuthFactory, session_id: &str) -> Arc<dyn AuthMethod> {
    factory
        .resolve(&session_credentials(session_id))
        .await
        .unwrap()
}

fn sso_factory(settings: AuthSettings, groups: &[&str]) -> AuthFactory {
    TestBackends::new(settings)
        .with_session(saml_session("saml", groups))
        .with_session(oidc_session("oidc", groups))
        .factory()
}

#[tokio::test]
async fn modify_only_group_scenario() {
    let factory = sso_factory(all_enabled_settings(), &["modifyonly"]);

    for id in ["saml", "oidc"] {
        let method = resolve(&factory, id).await;
        assert!(!method.is_admin().await.unwrap());
        assert!(!method
            .check_namespace_access(PermissionLevel::Full, "first-namespace")
            .await
            .unwrap());
        assert!(method
            .check_namespace_access(PermissionLevel::Modify, "first-namespace")
            .await
            .unwrap());
        assert!(!method
            .check_namespace_access(PermissionLevel::Modify, "second-namespace")
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn full_access_implies_modify_access() {
    let group_sets: [&[&str]; 5] = [
        &[],
        &["modifyonly"],
        &["fullaccess"],
        &["modifyonly", "fullaccess"],
        &["unknown-group"],
    ];

    for groups in group_sets {
        let factory = sso_factory(all_enabled_settings(), groups);
        let method = resolve(&factory, "saml").await;
        for namespace in NAMESPACES {
            let full = method
                .check_namespace_access(PermissionLevel::Full, namespace)
                .await
                .unwrap();
            let modify = method
                .check_namespace_access(PermissionLevel::Modify, namespace)
                .await
                .unwrap();
            assert!(!full || modify, "groups {:?} namespace {}", groups, namespace);
        }
    }
}

#[tokio::test]
async fn site_admin_group_needs_no_permission_rows() {
    let factory = sso_factory(all_enabled_settings(), &["siteadmins"]);

    for id in ["saml", "oidc"] {
        let method = resolve(&factory, id).await;
        assert!(method.is_admin().await.unwrap());
        for namespace in NAMESPACES {
            for level in LEVELS {
                assert!(method
                    .check_namespace_access(level, namespace)
                    .await
                    .unwrap());
            }
        }
    }
}

#[tokio::test]
async fn open_mode_grants_every_identity() {
    let mut settings = all_enabled_settings();
    settings.enable_access_controls = false;
    let factory = sso_factory(settings, &[]);

    let method = resolve(&factory, "oidc").await;
    assert!(method.is_admin().await.unwrap());
    for namespace in NAMESPACES {
        for level in LEVELS {
            assert!(method
                .check_namespace_access(level, namespace)
                .await
                .unwrap());
        }
    }
}

#[tokio::test]
async fn most_permissive_level_is_reported() {
    for groups in [["modifyonly", "fullaccess"], ["fullaccess", "modifyonly"]] {
        let factory = sso_factory(all_enabled_settings(), &groups);
        let method = resolve(&factory, "saml").await;

        let permissions = method.get_all_namespace_permissions().await.unwrap();
        assert_eq!(
            permissions.get("first-namespace"),
            Some(&PermissionLevel::Full)
        );

        // Reported levels must agree with access checks.
        for (namespace, level) in &permissions {
            assert!(method
                .check_namespace_access(*level, namespace)
                .await
                .unwrap());
        }
    }
}

#[tokio::test]
async fn publish_and_upload_follow_allow_lists() {
    // No keys configured: anyone may publish and upload anywhere.
    let mut open = all_enabled_settings();
    open.publish_api_keys.clear();
    open.upload_api_keys.clear();
    let factory = sso_factory(open, &["modifyonly"]);
    let method = resolve(&factory, "saml").await;
    for namespace in NAMESPACES {
        assert!(method.can_publish_module_version(namespace).await.unwrap());
        assert!(method.can_upload_module_version(namespace).await.unwrap());
    }

    // Keys configured: gated on MODIFY access.
    let factory = sso_factory(all_enabled_settings(), &["modifyonly"]);
    let method = resolve(&factory, "saml").await;
    for namespace in NAMESPACES {
        let modify = method
            .check_namespace_access(PermissionLevel::Modify, namespace)
            .await
            .unwrap();
        assert_eq!(
            method.can_publish_module_version(namespace).await.unwrap(),
            modify
        );
        assert_eq!(
            method.can_upload_module_version(namespace).await.unwrap(),
            modify
        );
    }
}

#[tokio::test]
async fn anonymous_publish_bypass_only_without_keys() {
    let mut settings = AuthSettings::default();
    let factory = TestBackends::new(settings.clone()).factory();
    let anonymous = factory.resolve(&Default::default()).await.unwrap();
    assert!(anonymous
        .can_publish_module_version("first-namespace")
        .await
        .unwrap());

    settings.publish_api_keys = vec![PUBLISH_KEY.to_string()];
    let factory = TestBackends::new(settings).factory();
    let anonymous = factory.resolve(&Default::default()).await.unwrap();
    assert!(!anonymous
        .can_publish_module_version("first-namespace")
        .await
        .unwrap());
}

fn github_factory(auto_generate: bool, backends: TestBackends) -> AuthFactory {
    let mut backends = backends;
    backends.settings.provider_sources = ProviderSources::new(vec![github_source(auto_generate)]);
    backends
        .with_session(github_session(
            "gh",
            json!({"acme": "organisation", "octocat": "user"}),
        ))
        .factory()
}

#[tokio::test]
async fn github_organisation_without_auto_provisioning() {
    let backends = TestBackends::new(all_enabled_settings());
    let permissions = backends.permissions.clone();
    let factory = github_factory(false, backends);

    let method = resolve(&factory, "gh").await;
    assert_eq!(method.kind(), AuthMethodKind::GithubSession);
    assert!(!method
        .check_namespace_access(PermissionLevel::Modify, "acme")
        .await
        .unwrap());
    assert!(!method
        .get_all_namespace_permissions()
        .await
        .unwrap()
        .contains_key("acme"));
    assert!(permissions.find_namespace("acme").await.unwrap().is_none());
}

#[tokio::test]
async fn github_organisation_with_auto_provisioning() {
    let backends = TestBackends::new(all_enabled_settings());
    let permissions = backends.permissions.clone();
    let factory = github_factory(true, backends);

    let method = resolve(&factory, "gh").await;
    assert!(method
        .check_namespace_access(PermissionLevel::Full, "acme")
        .await
        .unwrap());
    assert!(permissions.find_namespace("acme").await.unwrap().is_none());

    let all = method.get_all_namespace_permissions().await.unwrap();
    assert_eq!(all.get("acme"), Some(&PermissionLevel::Full));
    assert!(permissions.find_namespace("acme").await.unwrap().is_some());

    // Provisioning twice is harmless.
    method.get_all_namespace_permissions().await.unwrap();
    assert_eq!(permissions.namespace_count(), 2);
}

#[tokio::test]
async fn github_organisation_site_admin_group() {
    let backends = TestBackends::new(all_enabled_settings());
    backends.permissions.add_group("acme", true);
    let factory = github_factory(false, backends);

    let method = resolve(&factory, "gh").await;
    assert!(method.is_admin().await.unwrap());
    assert!(method
        .check_namespace_access(PermissionLevel::Full, "second-namespace")
        .await
        .unwrap());
}
