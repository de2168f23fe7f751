//! Backend registration.
//!
//! A [`BackendRegistry`] maps backend ids to [`BackendDescriptor`]s. It is an
//! ordinary value owned by the caller; there is no global registry.
//!
//! ```rust
//! use iofacade::{BackendRegistry, FileSystemExt};
//! use serde_json::Map;
//!
//! let registry = BackendRegistry::with_defaults();
//! let fs = registry.create("memory", &Map::new()).unwrap();
//! assert_eq!(fs.get_path("/x").unwrap().backend_id(), "memory");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{ConfigSchema, FieldDescriptor};
use crate::{FsError, LocalConfig, LocalFs, MemoryFs, SharedFs};

type Factory = Box<dyn Fn(Value) -> Result<SharedFs, FsError> + Send + Sync>;

/// Everything needed to instantiate one backend kind from configuration.
pub struct BackendDescriptor {
    id: String,
    name: String,
    schema: ConfigSchema,
    factory: Factory,
}

impl BackendDescriptor {
    /// Describe a backend kind.
    ///
    /// `factory` receives the configuration already resolved against `schema`.
    pub fn new<F>(id: impl Into<String>, name: impl Into<String>, schema: ConfigSchema, factory: F) -> Self
    where
        F: Fn(Value) -> Result<SharedFs, FsError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            schema,
            factory: Box::new(factory),
        }
    }

    /// The [`LocalFs`] backend: one optional `root` property, default `"/"`.
    pub fn local() -> Self {
        let schema =
            ConfigSchema::new().field(FieldDescriptor::string("root").with_default("/"));
        Self::new(LocalFs::ID, "Local Filesystem", schema, |config| {
            let config: LocalConfig =
                serde_json::from_value(config).map_err(|e| FsError::InvalidConfig {
                    name: LocalFs::ID.into(),
                    details: e.to_string(),
                })?;
            Ok(Arc::new(LocalFs::from_config(config)) as SharedFs)
        })
    }

    /// The [`MemoryFs`] backend; takes no properties.
    pub fn memory() -> Self {
        Self::new(MemoryFs::ID, "In-Memory Filesystem", ConfigSchema::new(), |_| {
            Ok(Arc::new(MemoryFs::new()) as SharedFs)
        })
    }

    /// Backend-kind tag.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted configuration.
    pub fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    /// Resolve `config` against the schema and build a backend instance.
    ///
    /// The factory sees passwords as given; the `debug` event logs
    /// [`ConfigSchema::redacted`] instead.
    pub fn create(&self, config: &Map<String, Value>) -> Result<SharedFs, FsError> {
        let resolved = self.schema.resolve(config)?;
        debug!(
            backend = %self.id,
            config = %self.schema.redacted(&resolved),
            "creating backend"
        );
        (self.factory)(resolved)
    }
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Registry of backend kinds, keyed by id.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, BackendDescriptor>,
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in [`LocalFs`] and [`MemoryFs`] backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for descriptor in [BackendDescriptor::local(), BackendDescriptor::memory()] {
            registry.backends.insert(descriptor.id.clone(), descriptor);
        }
        registry
    }

    /// Add a backend kind.
    ///
    /// # Errors
    ///
    /// - [`FsError::DuplicateBackend`] if the id is already taken
    pub fn register(&mut self, descriptor: BackendDescriptor) -> Result<(), FsError> {
        if self.backends.contains_key(&descriptor.id) {
            return Err(FsError::DuplicateBackend { id: descriptor.id });
        }
        debug!(backend = %descriptor.id, name = %descriptor.name, "registered backend");
        self.backends.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    /// Look up a backend kind.
    pub fn get(&self, id: &str) -> Option<&BackendDescriptor> {
        self.backends.get(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    /// Instantiate backend `id` from raw configuration.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnknownBackend`] if no such id is registered
    /// - configuration errors from [`ConfigSchema::resolve`] or the factory
    pub fn create(&self, id: &str, config: &Map<String, Value>) -> Result<SharedFs, FsError> {
        self.get(id)
            .ok_or_else(|| FsError::UnknownBackend { id: id.into() })?
            .create(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_registered() {
        let registry = BackendRegistry::with_defaults();
        assert_eq!(registry.ids().collect::<Vec<_>>(), ["local", "memory"]);
        assert_eq!(registry.get("local").unwrap().name(), "Local Filesystem");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = BackendRegistry::with_defaults();
        let err = registry.register(BackendDescriptor::memory()).unwrap_err();
        assert!(matches!(err, FsError::DuplicateBackend { ref id } if id == "memory"));
    }

    #[test]
    fn unknown_backend() {
        let registry = BackendRegistry::new();
        assert!(matches!(
            registry.create("ftp", &Map::new()),
            Err(FsError::UnknownBackend { .. })
        ));
    }

    #[test]
    fn local_backend_takes_root_from_config() {
        let temp = tempfile::tempdir().unwrap();
        let registry = BackendRegistry::with_defaults();
        let config = json!({ "Root": temp.path() });
        let fs = registry
            .create("local", config.as_object().unwrap())
            .unwrap();
        let local = fs.as_any().downcast_ref::<LocalFs>().unwrap();
        assert_eq!(local.root(), temp.path());
    }

    #[test]
    fn local_root_defaults_to_host_root() {
        let registry = BackendRegistry::with_defaults();
        let fs = registry.create("local", &Map::new()).unwrap();
        let local = fs.as_any().downcast_ref::<LocalFs>().unwrap();
        assert_eq!(local.root(), std::path::Path::new("/"));
    }

    #[test]
    fn factories_receive_unmasked_passwords() {
        let mut registry = BackendRegistry::new();
        let schema = ConfigSchema::new().field(FieldDescriptor::password("secret"));
        registry
            .register(BackendDescriptor::new("vault", "Vault", schema, |config| {
                if config["secret"] == "hunter2" {
                    Ok(Arc::new(MemoryFs::new()) as SharedFs)
                } else {
                    Err(FsError::Backend(format!("unexpected config {config}")))
                }
            }))
            .unwrap();
        let raw = json!({ "secret": "hunter2" });
        registry.create("vault", raw.as_object().unwrap()).unwrap();

        let descriptor = registry.get("vault").unwrap();
        let resolved = descriptor.schema().resolve(raw.as_object().unwrap()).unwrap();
        let logged = descriptor.schema().redacted(&resolved).to_string();
        assert!(!logged.contains("hunter2"), "{logged}");
    }

    #[test]
    fn custom_backends_receive_resolved_config() {
        let mut registry = BackendRegistry::new();
        let schema = ConfigSchema::new().field(FieldDescriptor::int("size"));
        registry
            .register(BackendDescriptor::new("sized", "Sized", schema, |config| {
                if config == json!({ "size": 4 }) {
                    Ok(Arc::new(MemoryFs::new()) as SharedFs)
                } else {
                    Err(FsError::Backend(format!("unexpected config {config}")))
                }
            }))
            .unwrap();
        registry
            .create("sized", json!({ "SIZE": "4" }).as_object().unwrap())
            .unwrap();
        assert!(matches!(
            registry.create("sized", &Map::new()),
            Err(FsError::MissingProperty { .. })
        ));
    }
}
