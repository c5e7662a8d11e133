//! Probes declared in configuration

mod checkers;

pub use checkers::*;

use std::sync::Arc;
use vitals_core::{Probe, ProbeRegistration, ProbeRegistry};

use crate::config::{ProbeConfig, ProbeKind};

/// Build the registration for one declared probe
///
/// Probes are instantiated per cycle so no connection or client outlives
/// the cycle that created it.
pub fn registration_for(config: &ProbeConfig) -> ProbeRegistration {
    let timeout = config.timeout();
    let name = config.name.as_str();
    let registration = match config.kind.clone() {
        ProbeKind::Tcp { address } => ProbeRegistration::from_factory(name, move || {
            Arc::new(TcpProbe::new(address.clone(), timeout)) as Arc<dyn Probe>
        }),
        ProbeKind::Http { url } => ProbeRegistration::from_factory(name, move || {
            Arc::new(HttpProbe::new(url.clone(), timeout)) as Arc<dyn Probe>
        }),
    };
    registration.with_tags(config.tags.iter().cloned())
}

/// Registry holding every declared probe, in declaration order
pub fn build_registry(probes: &[ProbeConfig]) -> ProbeRegistry {
    probes
        .iter()
        .map(registration_for)
        .fold(ProbeRegistry::new(), ProbeRegistry::with_registration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::HealthCheckEngine;

    fn tcp(name: &str, tags: &[&str]) -> ProbeConfig {
        ProbeConfig {
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            timeout_ms: 100,
            kind: ProbeKind::Tcp {
                address: "127.0.0.1:1".to_string(),
            },
        }
    }

    #[test]
    fn test_build_registry_keeps_order_and_tags() {
        let registry = build_registry(&[tcp("db", &["ready"]), tcp("cache", &[])]);
        assert_eq!(registry.names(), vec!["db", "cache"]);

        let registration = registration_for(&tcp("db", &["ready", "storage"]));
        assert!(registration.has_tag("ready"));
        assert!(registration.has_tag("storage"));
    }

    #[test]
    fn test_duplicate_declarations_rejected_by_engine() {
        let registry = build_registry(&[tcp("db", &[]), tcp("DB", &[])]);
        assert!(HealthCheckEngine::new(registry).is_err());
    }
}
