//! Constructor registries for gRPC interceptors.

use std::sync::Arc;

use serde_json::Value;

use pharos_core::Registry;

use crate::chain::{StreamEntry, UnaryEntry};
use crate::error::GrpcError;
use crate::interceptor::{StreamInterceptor, UnaryInterceptor};

/// Constructor signature unary interceptors register under a name.
///
/// Returns the interceptor together with its chain priority.
pub type NewUnaryInterceptor =
    Arc<dyn Fn(&Value) -> anyhow::Result<(Arc<dyn UnaryInterceptor>, i32)> + Send + Sync>;

/// Constructor signature stream interceptors register under a name.
pub type NewStreamInterceptor =
    Arc<dyn Fn(&Value) -> anyhow::Result<(Arc<dyn StreamInterceptor>, i32)> + Send + Sync>;

/// The registries enabled interceptor names are resolved against.
///
/// One instance covers both call shapes; an interceptor that exists in
/// only one shape registers only there.
#[derive(Debug)]
pub struct GrpcRegistry {
    unary: Registry<NewUnaryInterceptor>,
    stream: Registry<NewStreamInterceptor>,
}

impl GrpcRegistry {
    /// Creates an empty registry pair.
    #[must_use]
    pub fn new() -> Self {
        Self {
            unary: Registry::new("grpc unary interceptor"),
            stream: Registry::new("grpc stream interceptor"),
        }
    }

    /// Registers a unary interceptor constructor under `name`.
    pub fn register_unary(&self, name: impl Into<String>, constructor: NewUnaryInterceptor) {
        self.unary.register(name, constructor);
    }

    /// Registers a stream interceptor constructor under `name`.
    pub fn register_stream(&self, name: impl Into<String>, constructor: NewStreamInterceptor) {
        self.stream.register(name, constructor);
    }

    /// The unary constructor registry.
    #[must_use]
    pub const fn unary(&self) -> &Registry<NewUnaryInterceptor> {
        &self.unary
    }

    /// The stream constructor registry.
    #[must_use]
    pub const fn stream(&self) -> &Registry<NewStreamInterceptor> {
        &self.stream
    }

    /// Resolves enabled names into unary chain entries.
    ///
    /// Each name is looked up, constructed with its configuration blob from
    /// `configs`, and paired with the priority its constructor reported. Any
    /// failure aborts the whole resolution.
    ///
    /// # Errors
    ///
    /// Returns [`GrpcError::ComponentNotFound`] for unknown names and
    /// [`GrpcError::Interceptor`] when a constructor fails.
    pub fn unary_entries(
        &self,
        enabled: &[String],
        configs: &serde_json::Map<String, Value>,
    ) -> Result<Vec<UnaryEntry>, GrpcError> {
        let mut entries = Vec::with_capacity(enabled.len());
        for name in enabled {
            let ctor = self.unary.lookup(name)?;
            let conf = configs.get(name).cloned().unwrap_or(Value::Null);
            let (interceptor, priority) =
                ctor(&conf).map_err(|source| GrpcError::Interceptor {
                    name: name.clone(),
                    source,
                })?;
            tracing::info!(interceptor = %name, priority, "grpc unary interceptor enabled");
            entries.push(UnaryEntry::new(name.clone(), priority, interceptor));
        }
        Ok(entries)
    }

    /// Resolves enabled names into stream chain entries.
    ///
    /// # Errors
    ///
    /// Same conditions as [`unary_entries`](Self::unary_entries).
    pub fn stream_entries(
        &self,
        enabled: &[String],
        configs: &serde_json::Map<String, Value>,
    ) -> Result<Vec<StreamEntry>, GrpcError> {
        let mut entries = Vec::with_capacity(enabled.len());
        for name in enabled {
            let ctor = self.stream.lookup(name)?;
            let conf = configs.get(name).cloned().unwrap_or(Value::Null);
            let (interceptor, priority) =
                ctor(&conf).map_err(|source| GrpcError::Interceptor {
                    name: name.clone(),
                    source,
                })?;
            tracing::info!(interceptor = %name, priority, "grpc stream interceptor enabled");
            entries.push(StreamEntry::new(name.clone(), priority, interceptor));
        }
        Ok(entries)
    }
}

impl Default for GrpcRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers the auth interceptor pair under the name `auth`.
///
/// The token manager registry is captured so the constructors can resolve
/// the configured manager at build time.
pub fn register_auth(
    registry: &GrpcRegistry,
    token_managers: Arc<pharos_core::TokenManagerRegistry>,
) {
    let managers = Arc::clone(&token_managers);
    registry.register_unary(
        "auth",
        Arc::new(move |conf| Ok(crate::auth::new_unary(conf, &managers)?)),
    );

    let managers = token_managers;
    registry.register_stream(
        "auth",
        Arc::new(move |conf| Ok(crate::auth::new_stream(conf, &managers)?)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharos_core::fixtures::{demo_user, StaticTokenManager};
    use pharos_core::{NewTokenManager, TokenManager, TokenManagerRegistry};
    use serde_json::json;

    fn token_managers() -> Arc<TokenManagerRegistry> {
        let registry = TokenManagerRegistry::new("token manager");
        let ctor: NewTokenManager = Arc::new(|_conf| {
            Ok(Arc::new(StaticTokenManager::with_token("tok", demo_user()))
                as Arc<dyn TokenManager>)
        });
        registry.register("static", ctor);
        Arc::new(registry)
    }

    #[test]
    fn test_register_auth_covers_both_shapes() {
        let registry = GrpcRegistry::new();
        register_auth(&registry, token_managers());

        assert!(registry.unary().contains("auth"));
        assert!(registry.stream().contains("auth"));
    }

    #[test]
    fn test_unary_entries_resolve_with_config() {
        let registry = GrpcRegistry::new();
        register_auth(&registry, token_managers());

        let mut configs = serde_json::Map::new();
        configs.insert(
            "auth".to_string(),
            json!({ "token_manager": "static", "priority": 42 }),
        );

        let entries = registry
            .unary_entries(&["auth".to_string()], &configs)
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].priority, 42);
    }

    #[test]
    fn test_unknown_interceptor_name_fails() {
        let registry = GrpcRegistry::new();
        let err = registry
            .unary_entries(&["ghost".to_string()], &serde_json::Map::new())
            .unwrap_err();
        assert!(matches!(err, GrpcError::ComponentNotFound(_)));
    }

    #[test]
    fn test_failing_constructor_reports_name() {
        let registry = GrpcRegistry::new();
        register_auth(&registry, token_managers());

        // default token manager "jwt" is not registered
        let err = registry
            .unary_entries(&["auth".to_string()], &serde_json::Map::new())
            .unwrap_err();
        assert!(err.to_string().contains("auth"));
    }
}
