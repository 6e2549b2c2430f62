//! Named component registry.
//!
//! Each kind of pluggable component (HTTP service, HTTP middleware, gRPC
//! interceptor, token manager) gets its own [`Registry`] holding constructors
//! keyed by name. Registries are explicit values with an injected lifetime:
//! the process builds them once at startup and hands references to the
//! servers, and tests build isolated ones per case.
//!
//! Registration normally completes before the first lookup, but the map is
//! still guarded by a mutex so dynamically loaded components cannot race a
//! concurrent lookup.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Errors produced by registry lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An enabled name has no registered constructor.
    #[error("{kind} component not found: {name}")]
    ComponentNotFound {
        /// The component kind (e.g. "http service").
        kind: &'static str,
        /// The missing component name.
        name: String,
    },
}

/// A write-mostly-once mapping from component name to constructor.
///
/// Re-registering a name silently overwrites the previous constructor; this
/// is acceptable because registration happens at deterministic init time.
///
/// # Example
///
/// ```
/// use pharos_core::Registry;
///
/// let registry: Registry<u32> = Registry::new("demo");
/// registry.register("answer", 42);
/// assert_eq!(registry.lookup("answer").unwrap(), 42);
/// assert!(registry.lookup("question").is_err());
/// ```
pub struct Registry<C> {
    kind: &'static str,
    entries: Mutex<HashMap<String, C>>,
}

impl<C: Clone> Registry<C> {
    /// Creates an empty registry for the given component kind.
    ///
    /// The kind label only appears in diagnostics.
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the component kind label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// Stores `constructor` under `name`. Last registration wins.
    pub fn register(&self, name: impl Into<String>, constructor: C) {
        let name = name.into();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.insert(name.clone(), constructor).is_some() {
            tracing::debug!(kind = self.kind, name = %name, "component re-registered");
        }
    }

    /// Returns the constructor registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ComponentNotFound`] naming both the component
    /// and its kind when no constructor is registered.
    pub fn lookup(&self, name: &str) -> Result<C, RegistryError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ComponentNotFound {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    /// Returns `true` if a constructor is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(name)
    }

    /// Returns the registered names, sorted for stable diagnostics.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        names
    }
}

impl<C> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("kind", &self.kind).finish()
    }
}
