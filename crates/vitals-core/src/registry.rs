//! Probe registrations and probe sources
//!
//! The host application owns the registered probe set. The engine only asks
//! a [`ProbeSource`] for a point-in-time enumeration at the start of every
//! cycle, and each registration produces a fresh probe instance per cycle so
//! probes can hold per-invocation resources (a scoped connection, a client).

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::name::ProbeName;
use crate::probe::Probe;

type ProbeFactory = Arc<dyn Fn() -> Arc<dyn Probe> + Send + Sync>;

/// A registered probe: identity, metadata and how to obtain an instance
#[derive(Clone)]
pub struct ProbeRegistration {
    name: ProbeName,
    tags: BTreeSet<String>,
    factory: ProbeFactory,
}

impl ProbeRegistration {
    /// Register a single shared probe instance
    pub fn new<P: Probe + 'static>(name: impl Into<ProbeName>, probe: P) -> Self {
        let probe: Arc<dyn Probe> = Arc::new(probe);
        Self::from_factory(name, move || probe.clone())
    }

    /// Register a factory invoked once per evaluation cycle
    pub fn from_factory<F>(name: impl Into<ProbeName>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Probe> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tags: BTreeSet::new(),
            factory: Arc::new(factory),
        }
    }

    /// Add tags (builder pattern)
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &ProbeName {
        &self.name
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Obtain the probe instance for one cycle
    pub fn instantiate(&self) -> Arc<dyn Probe> {
        (self.factory)()
    }
}

impl fmt::Debug for ProbeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistration")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Supplies the current probe enumeration
///
/// Called at engine construction for validation and again at the start of
/// every cycle. Implementations must not assume results are cached.
pub trait ProbeSource: Send + Sync {
    fn registrations(&self) -> Vec<ProbeRegistration>;
}

/// In-memory probe set
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    registrations: Vec<ProbeRegistration>,
}

impl fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("probes", &self.names())
            .finish()
    }
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a probe (builder pattern)
    pub fn with_probe<P: Probe + 'static>(mut self, name: impl Into<ProbeName>, probe: P) -> Self {
        self.registrations.push(ProbeRegistration::new(name, probe));
        self
    }

    /// Add a prepared registration (builder pattern)
    pub fn with_registration(mut self, registration: ProbeRegistration) -> Self {
        self.registrations.push(registration);
        self
    }

    pub fn register(&mut self, registration: ProbeRegistration) {
        self.registrations.push(registration);
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.name().as_str()).collect()
    }

    /// Check the set for ambiguous names without building an engine
    pub fn validate(&self) -> Result<(), RegistryError> {
        validate_unique_names(&self.registrations)
    }
}

impl ProbeSource for ProbeRegistry {
    fn registrations(&self) -> Vec<ProbeRegistration> {
        self.registrations.clone()
    }
}

impl<S: ProbeSource + ?Sized> ProbeSource for Arc<S> {
    fn registrations(&self) -> Vec<ProbeRegistration> {
        (**self).registrations()
    }
}

/// Names colliding under case-insensitive comparison, every spelling included
pub fn duplicate_names(registrations: &[ProbeRegistration]) -> Vec<String> {
    let mut counts: HashMap<&ProbeName, usize> = HashMap::new();
    for registration in registrations {
        *counts.entry(registration.name()).or_default() += 1;
    }

    registrations
        .iter()
        .filter(|r| counts.get(r.name()).copied().unwrap_or(0) > 1)
        .map(|r| r.name().to_string())
        .collect()
}

/// Fail if any two registrations share a name
pub fn validate_unique_names(registrations: &[ProbeRegistration]) -> Result<(), RegistryError> {
    let names = duplicate_names(registrations);
    if names.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::DuplicateNames { names })
    }
}
