use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static AUTH_METHOD_RESOLUTIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static NAMESPACE_ACCESS_CHECKS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    let resolutions = IntCounterVec::new(
        Opts::new(
            "auth_method_resolutions_total",
            "Requests resolved to each authentication method",
        ),
        &["method"],
    )?;

    let access_checks = IntCounterVec::new(
        Opts::new(
            "namespace_access_checks_total",
            "Namespace access decisions by requested level and outcome",
        ),
        &["level", "outcome"],
    )?;

    registry.register(Box::new(resolutions.clone()))?;
    registry.register(Box::new(access_checks.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = AUTH_METHOD_RESOLUTIONS_TOTAL.set(resolutions);
    let _ = NAMESPACE_ACCESS_CHECKS_TOTAL.set(access_checks);
    Ok(())
}

/// No-op until [`init_metrics`] has run.
pub fn record_resolution(method: &str) {
    if let Some(counter) = AUTH_METHOD_RESOLUTIONS_TOTAL.get() {
        counter.with_label_values(&[method]).inc();
    }
}

pub fn record_access_check(level: &str, allowed: bool) {
    if let Some(counter) = NAMESPACE_ACCESS_CHECKS_TOTAL.get() {
        let outcome = if allowed { "allowed" } else { "denied" };
        counter.with_label_values(&[level, outcome]).inc();
    }
}

/// Render the registry in Prometheus text format.
pub fn gather() -> Result<String, anyhow::Error> {
    let Some(registry) = REGISTRY.get() else {
        return Ok(String::new());
    };

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
