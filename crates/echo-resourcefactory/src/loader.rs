// SPDX-License-Identifier: Apache-2.0
//! Typed resource loaders, registered per extension: dynamic dispatch via
//! a trait-object registry keyed by extension, rather than an enum of
//! known resource kinds.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ResourceError;
use crate::factory::Factory;

/// A resource type's create/destroy/recreate behavior, registered under
/// a file extension. Implementations receive `factory` so a `create`
/// call may itself `Get` dependent resources (the resource factory contract: "Recursive
/// `Get` calls from within a `create_fn` are allowed").
pub trait ResourceType: Send + Sync {
    /// Builds the typed resource from its raw bytes.
    ///
    /// # Errors
    ///
    /// Any error aborts the enclosing `Get`; the factory releases every
    /// resource this call acquired before propagating it.
    fn create(
        &self,
        factory: &Factory,
        bytes: Vec<u8>,
    ) -> Result<Box<dyn Any + Send + Sync>, ResourceError>;

    /// Tears down a resource whose `ref_count` has reached zero.
    fn destroy(&self, factory: &Factory, resource: Box<dyn Any + Send + Sync>);

    /// Rebuilds `resource` in place from freshly-read `bytes`, so
    /// handles already held by callers remain valid across a hot-reload.
    ///
    /// Types that don't support in-place reload can leave this at its
    /// default, which reports the operation as unsupported.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Invalid`] by default; implementations
    /// that support reload return their own construction errors instead.
    fn recreate(
        &self,
        _factory: &Factory,
        _bytes: Vec<u8>,
        _resource: &mut Box<dyn Any + Send + Sync>,
    ) -> Result<(), ResourceError> {
        Err(ResourceError::Invalid(
            "resource type does not support reload".into(),
        ))
    }
}

/// The factory's extension → loader table.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: HashMap<String, Arc<dyn ResourceType>>,
}

impl LoaderRegistry {
    /// Registers `loader` under `extension`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Invalid`] if `extension` starts with
    /// `.` or is empty, or [`ResourceError::AlreadyExists`] if an
    /// extension is registered twice.
    pub fn register(
        &mut self,
        extension: &str,
        loader: Arc<dyn ResourceType>,
    ) -> Result<(), ResourceError> {
        if extension.is_empty() || extension.starts_with('.') {
            return Err(ResourceError::Invalid(format!(
                "bad extension for loader registration: {extension:?}"
            )));
        }
        if self.loaders.contains_key(extension) {
            return Err(ResourceError::AlreadyExists(format!(
                "loader already registered for extension {extension:?}"
            )));
        }
        self.loaders.insert(extension.to_string(), loader);
        Ok(())
    }

    /// Looks up the loader registered for `extension`.
    #[must_use]
    pub fn get(&self, extension: &str) -> Option<Arc<dyn ResourceType>> {
        self.loaders.get(extension).cloned()
    }
}

/// Extracts the extension (the substring after the final `.`, not
/// including it) from `path`.
///
/// # Errors
///
/// Returns [`ResourceError::Invalid`] if `path` has no `.` or ends with
/// one.
pub fn extension_of(path: &str) -> Result<String, ResourceError> {
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Ok(ext.to_string()),
        _ => Err(ResourceError::Invalid(format!(
            "path has no extension: {path:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_of_strips_leading_components() {
        assert_eq!(extension_of("main/go.goc").unwrap(), "goc");
    }

    #[test]
    fn extension_of_rejects_missing_extension() {
        assert!(extension_of("main/go").is_err());
    }

    #[test]
    fn register_rejects_dotted_extension() {
        struct Noop;
        impl ResourceType for Noop {
            fn create(
                &self,
                _factory: &Factory,
                _bytes: Vec<u8>,
            ) -> Result<Box<dyn Any + Send + Sync>, ResourceError> {
                Ok(Box::new(()))
            }
            fn destroy(&self, _factory: &Factory, _resource: Box<dyn Any + Send + Sync>) {}
        }
        let mut registry = LoaderRegistry::default();
        assert!(matches!(
            registry.register(".foo", Arc::new(Noop)),
            Err(ResourceError::Invalid(_))
        ));
    }
}
