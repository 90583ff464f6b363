//! Directory registry for resolving backends by name.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use peoplesync_common::{Error, Result};

use crate::directory::RemoteDirectory;

/// Factory function type for creating directories.
pub type DirectoryFactory = Box<dyn Fn(Value) -> Result<Arc<dyn RemoteDirectory>> + Send + Sync>;

/// Registry for remote directory factories.
///
/// Resolves a directory backend from a provider name and its JSON
/// configuration, as read from the application config file.
pub struct DirectoryRegistry {
    factories: HashMap<String, DirectoryFactory>,
}

impl DirectoryRegistry {
    /// Resolve a directory by name and configuration.
    ///
    /// # Errors
    /// - Directory not found
    /// - Configuration invalid
    pub fn resolve(&self, name: &str, config: Value) -> Result<Arc<dyn RemoteDirectory>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Directory '{}' is not registered", name)))?;
        factory(config)
    }
}

/// Create a registry with the built-in directories.
pub fn create_default_registry() -> DirectoryRegistry {
    let mut factories: HashMap<String, DirectoryFactory> = HashMap::new();

    // In-memory directory (for testing)
    factories.insert(
        "memory".to_string(),
        Box::new(|_config| Ok(Arc::new(crate::memory::MemoryDirectory::new()))),
    );

    // JSON document on disk
    factories.insert(
        "file".to_string(),
        Box::new(|config| {
            let path = config
                .get("path")
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::InvalidInput("File directory requires 'path'".to_string()))?;
            Ok(Arc::new(crate::file::FileDirectory::new(path)?))
        }),
    );

    DirectoryRegistry { factories }
}
