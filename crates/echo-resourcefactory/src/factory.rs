// SPDX-License-Identifier: Apache-2.0
//! The typed resource factory: slot table, name-hash map, loader
//! registry, and reload-callback list (the resource factory contract "Factory").
//!
//! `Get`/`Release` use content-addressed identity: a resource's handle
//! *is* its `name_hash`, the hash of its canonicalized path, rather than
//! a separate `{generation, slot_index}` pair. A released resource's
//! hash simply isn't in the slot table any more; re-`Get`-ting the same
//! path produces a fresh descriptor keyed by the same hash, which is
//! exactly the round-trip the testable properties requires ("`Release` followed by
//! `Get` of the same path produces a fresh descriptor with
//! `ref_count == 1`") — no generation counter is needed to detect a
//! stale handle, because content addressing already makes "stale" and
//! "not currently loaded" the same condition.
//!
//! Interior mutability (`RefCell`) lets `Get` take `&self` rather than
//! `&mut self`, so a `create_fn` can recursively call back into the same
//! factory (the resource factory contract: "Recursive `Get` calls from within a
//! `create_fn` are allowed"). Every borrow is dropped before calling
//! into loader code, mirroring `echo-msgbus`'s socket dispatch: lock,
//! extract, drop the guard, then invoke the caller-supplied callback
//! with nothing held.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::descriptor::ResourceDescriptor;
use crate::error::ResourceError;
use crate::loader::{extension_of, LoaderRegistry, ResourceType};
use crate::path::path_hash;
use crate::provider::ResourceProvider;

type ReloadCallback = Box<dyn Fn(&ResourceDescriptor, &str) + Send + Sync>;

struct FactoryState {
    slots: HashMap<u64, ResourceDescriptor>,
    loading: HashSet<u64>,
    load_stack: Vec<u64>,
    acquired_during: HashMap<u64, Vec<u64>>,
}

/// The resource factory. Not `Sync`: the resource factory contract restricts the
/// factory to "a single thread per instance".
pub struct Factory {
    state: RefCell<FactoryState>,
    loaders: RefCell<LoaderRegistry>,
    reload_callbacks: RefCell<Vec<ReloadCallback>>,
    providers: Vec<Box<dyn ResourceProvider>>,
    max_resources: usize,
}

impl Factory {
    /// Builds a factory that tries `providers` in order for resource
    /// bytes, with a slot table bounded at `max_resources`.
    #[must_use]
    pub fn new(providers: Vec<Box<dyn ResourceProvider>>, max_resources: usize) -> Self {
        Self {
            state: RefCell::new(FactoryState {
                slots: HashMap::new(),
                loading: HashSet::new(),
                load_stack: Vec::new(),
                acquired_during: HashMap::new(),
            }),
            loaders: RefCell::new(LoaderRegistry::default()),
            reload_callbacks: RefCell::new(Vec::new()),
            providers,
            max_resources,
        }
    }

    /// Registers `loader` for `extension`.
    ///
    /// # Errors
    ///
    /// See [`LoaderRegistry::register`].
    pub fn register_type(
        &self,
        extension: &str,
        loader: Arc<dyn ResourceType>,
    ) -> Result<(), ResourceError> {
        self.loaders.borrow_mut().register(extension, loader)
    }

    /// Registers a callback invoked whenever [`Factory::reload_resource`]
    /// succeeds.
    pub fn register_reload_callback(&self, callback: ReloadCallback) {
        self.reload_callbacks.borrow_mut().push(callback);
    }

    /// Resolves `path` to a loaded, ref-counted resource, creating it if
    /// it isn't already loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::LoopError`] if `path` is already being
    /// constructed further up the call stack, [`ResourceError::OutOfResources`]
    /// if the slot table is full, or any error the resolved loader's
    /// `create` raises (in which case every resource this call acquired
    /// is released before the error propagates).
    pub fn get(&self, path: &str) -> Result<u64, ResourceError> {
        let name_hash = path_hash(path);

        {
            let mut state = self.state.borrow_mut();
            if let Some(desc) = state.slots.get_mut(&name_hash) {
                desc.ref_count += 1;
                Self::record_acquisition(&mut state, name_hash);
                return Ok(name_hash);
            }
            if state.loading.contains(&name_hash) {
                return Err(ResourceError::LoopError(name_hash));
            }
            if state.slots.len() >= self.max_resources {
                warn!(path, "factory: slot table full");
                return Err(ResourceError::OutOfResources(
                    "resource slot table is full".into(),
                ));
            }
            state.loading.insert(name_hash);
            state.load_stack.push(name_hash);
            state.acquired_during.insert(name_hash, Vec::new());
        }

        let result = self.create_descriptor(path, name_hash);

        let mut state = self.state.borrow_mut();
        state.loading.remove(&name_hash);
        state.load_stack.pop();
        let acquired = state.acquired_during.remove(&name_hash).unwrap_or_default();

        match result {
            Ok(descriptor) => {
                state.slots.insert(name_hash, descriptor);
                Self::record_acquisition(&mut state, name_hash);
                debug!(path, name_hash, "factory: resource created");
                drop(state);
                Ok(name_hash)
            }
            Err(err) => {
                drop(state);
                for dependency in acquired {
                    // Best-effort: a dependency release should not itself
                    // fail in practice, but a failed create must not
                    // panic the caller over a rollback error.
                    let _ = self.release(dependency);
                }
                Err(err)
            }
        }
    }

    fn record_acquisition(state: &mut FactoryState, name_hash: u64) {
        if let Some(&parent) = state.load_stack.last() {
            if parent != name_hash {
                state
                    .acquired_during
                    .entry(parent)
                    .or_default()
                    .push(name_hash);
            }
        }
    }

    fn create_descriptor(
        &self,
        path: &str,
        name_hash: u64,
    ) -> Result<ResourceDescriptor, ResourceError> {
        let extension = extension_of(path)?;
        let loader = self
            .loaders
            .borrow()
            .get(&extension)
            .ok_or_else(|| {
                ResourceError::Invalid(format!("no loader registered for extension {extension:?}"))
            })?;

        let bytes = self.read_bytes(path, name_hash)?;
        let resource = loader.create(self, bytes)?;

        Ok(ResourceDescriptor {
            name_hash,
            extension,
            resource,
            ref_count: 1,
            mtime: 0,
        })
    }

    fn read_bytes(&self, path: &str, name_hash: u64) -> Result<Vec<u8>, ResourceError> {
        let content_hash = name_hash.to_be_bytes();
        for provider in &self.providers {
            if let Some(bytes) = provider.read(path, &content_hash)? {
                return Ok(bytes);
            }
        }
        Err(ResourceError::NotFound(path.to_string()))
    }

    /// Bypasses the typed cache: reads and returns `path`'s raw bytes
    /// without creating or caching a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if no provider has `path`.
    pub fn get_raw(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let name_hash = path_hash(path);
        self.read_bytes(path, name_hash)
    }

    /// Decrements `handle`'s reference count, destroying the resource
    /// when it reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if `handle` names no loaded
    /// resource.
    pub fn release(&self, handle: u64) -> Result<(), ResourceError> {
        let outcome = {
            let mut state = self.state.borrow_mut();
            let ref_count = {
                let desc = state
                    .slots
                    .get_mut(&handle)
                    .ok_or_else(|| ResourceError::NotFound(format!("{handle:#x}")))?;
                desc.ref_count = desc.ref_count.saturating_sub(1);
                desc.ref_count
            };
            if ref_count == 0 {
                state.slots.remove(&handle)
            } else {
                None
            }
        };

        if let Some(descriptor) = outcome {
            let loader = self.loaders.borrow().get(&descriptor.extension);
            if let Some(loader) = loader {
                loader.destroy(self, descriptor.resource);
            }
            debug!(handle, "factory: resource destroyed");
        }
        Ok(())
    }

    /// Re-reads `path`'s bytes and rebuilds its resource in place via
    /// the registered loader's `recreate`, then notifies every
    /// registered reload callback.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] without mutating the
    /// resource if the bytes can no longer be located, or the loader's
    /// `recreate` error otherwise.
    pub fn reload_resource(&self, path: &str) -> Result<(), ResourceError> {
        let name_hash = path_hash(path);
        let extension = extension_of(path)?;
        let loader = self.loaders.borrow().get(&extension).ok_or_else(|| {
            ResourceError::Invalid(format!("no loader registered for extension {extension:?}"))
        })?;

        let bytes = self.read_bytes(path, name_hash)?;

        let mut resource: Box<dyn Any + Send + Sync> = {
            let mut state = self.state.borrow_mut();
            let desc = state
                .slots
                .get_mut(&name_hash)
                .ok_or_else(|| ResourceError::NotFound(path.to_string()))?;
            std::mem::replace(&mut desc.resource, Box::new(()))
        };

        let recreate_result = loader.recreate(self, bytes, &mut resource);

        {
            let mut state = self.state.borrow_mut();
            if let Some(desc) = state.slots.get_mut(&name_hash) {
                desc.resource = resource;
            }
        }

        recreate_result?;

        let state = self.state.borrow();
        if let Some(desc) = state.slots.get(&name_hash) {
            let callbacks = self.reload_callbacks.borrow();
            for callback in callbacks.iter() {
                callback(desc, path);
            }
        }
        debug!(path, "factory: resource reloaded");
        Ok(())
    }

    /// Runs `f` against the typed resource behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if `handle` isn't loaded, or
    /// [`ResourceError::TypeMismatch`] if the stored resource isn't a
    /// `T`.
    pub fn with_resource<T: 'static, R>(
        &self,
        handle: u64,
        f: impl FnOnce(&T) -> R,
    ) -> Result<R, ResourceError> {
        let state = self.state.borrow();
        let desc = state
            .slots
            .get(&handle)
            .ok_or_else(|| ResourceError::NotFound(format!("{handle:#x}")))?;
        let typed = desc
            .resource
            .downcast_ref::<T>()
            .ok_or_else(|| ResourceError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                actual: desc.extension.clone(),
            })?;
        Ok(f(typed))
    }

    /// Current reference count for `handle`, or `None` if it isn't
    /// loaded.
    #[must_use]
    pub fn ref_count(&self, handle: u64) -> Option<u32> {
        self.state.borrow().slots.get(&handle).map(|d| d.ref_count)
    }

    /// Number of distinct resources currently loaded.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.state.borrow().slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FilesystemProvider;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingLoader {
        creates: Arc<AtomicU32>,
        destroys: Arc<AtomicU32>,
    }

    impl ResourceType for CountingLoader {
        fn create(
            &self,
            _factory: &Factory,
            bytes: Vec<u8>,
        ) -> Result<Box<dyn Any + Send + Sync>, ResourceError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(bytes))
        }

        fn destroy(&self, _factory: &Factory, _resource: Box<dyn Any + Send + Sync>) {
            self.destroys.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn factory_with_fixture(dir: &std::path::Path) -> (Factory, Arc<AtomicU32>, Arc<AtomicU32>) {
        std::fs::write(dir.join("test.foo"), b"payload").expect("write fixture");
        let provider = FilesystemProvider::new(dir.to_path_buf());
        let factory = Factory::new(vec![Box::new(provider)], 16);
        let creates = Arc::new(AtomicU32::new(0));
        let destroys = Arc::new(AtomicU32::new(0));
        let loader = CountingLoader {
            creates: creates.clone(),
            destroys: destroys.clone(),
        };
        factory.register_type("foo", Arc::new(loader)).expect("register");
        (factory, creates, destroys)
    }

    #[test]
    fn ref_counting_matches_scenario_three() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (factory, creates, destroys) = factory_with_fixture(dir.path());

        let handle_a = factory.get("test.foo").expect("first get");
        let handle_b = factory.get("test.foo").expect("second get");
        assert_eq!(handle_a, handle_b);
        assert_eq!(creates.load(Ordering::SeqCst), 1);
        assert_eq!(factory.ref_count(handle_a), Some(2));

        factory.release(handle_a).expect("first release");
        assert_eq!(factory.ref_count(handle_a), Some(1));
        assert_eq!(destroys.load(Ordering::SeqCst), 0);

        factory.release(handle_b).expect("second release");
        assert_eq!(factory.ref_count(handle_a), None);
        assert_eq!(destroys.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_then_get_produces_fresh_descriptor() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (factory, creates, _destroys) = factory_with_fixture(dir.path());

        let handle = factory.get("test.foo").expect("get");
        factory.release(handle).expect("release");
        assert_eq!(factory.ref_count(handle), None);

        let handle_again = factory.get("test.foo").expect("get again");
        assert_eq!(handle_again, handle);
        assert_eq!(factory.ref_count(handle_again), Some(1));
        assert_eq!(creates.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_loader_is_an_invalid_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.unknown"), b"x").expect("write");
        let provider = FilesystemProvider::new(dir.path().to_path_buf());
        let factory = Factory::new(vec![Box::new(provider)], 16);
        assert!(matches!(
            factory.get("a.unknown"),
            Err(ResourceError::Invalid(_))
        ));
    }

    #[test]
    fn slot_table_reports_out_of_resources_at_capacity() {
        let dir = tempfile::tempdir().expect("tempdir");
        let creates = Arc::new(AtomicU32::new(0));
        let destroys = Arc::new(AtomicU32::new(0));
        let provider = FilesystemProvider::new(dir.path().to_path_buf());
        let factory = Factory::new(vec![Box::new(provider)], 1);
        factory
            .register_type(
                "foo",
                Arc::new(CountingLoader {
                    creates: creates.clone(),
                    destroys: destroys.clone(),
                }),
            )
            .expect("register");

        std::fs::write(dir.path().join("one.foo"), b"a").expect("write");
        std::fs::write(dir.path().join("two.foo"), b"b").expect("write");

        factory.get("one.foo").expect("first get fits");
        assert!(matches!(
            factory.get("two.foo"),
            Err(ResourceError::OutOfResources(_))
        ));
    }

    #[test]
    fn reload_resource_rebuilds_in_place_and_notifies_callbacks() {
        struct ReloadableLoader;
        impl ResourceType for ReloadableLoader {
            fn create(
                &self,
                _factory: &Factory,
                bytes: Vec<u8>,
            ) -> Result<Box<dyn Any + Send + Sync>, ResourceError> {
                Ok(Box::new(bytes))
            }
            fn destroy(&self, _factory: &Factory, _resource: Box<dyn Any + Send + Sync>) {}
            fn recreate(
                &self,
                _factory: &Factory,
                bytes: Vec<u8>,
                resource: &mut Box<dyn Any + Send + Sync>,
            ) -> Result<(), ResourceError> {
                *resource = Box::new(bytes);
                Ok(())
            }
        }

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.foo"), b"v1").expect("write");
        let provider = FilesystemProvider::new(dir.path().to_path_buf());
        let factory = Factory::new(vec![Box::new(provider)], 16);
        factory
            .register_type("foo", Arc::new(ReloadableLoader))
            .expect("register");

        let handle = factory.get("a.foo").expect("get");
        let notified = Arc::new(AtomicU32::new(0));
        let notified_clone = notified.clone();
        factory.register_reload_callback(Box::new(move |_desc, _path| {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        }));

        std::fs::write(dir.path().join("a.foo"), b"v2").expect("rewrite");
        factory.reload_resource("a.foo").expect("reload");

        factory
            .with_resource::<Vec<u8>, ()>(handle, |bytes| assert_eq!(bytes, b"v2"))
            .expect("resource still present");
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn self_referential_get_is_rejected_as_a_loop() {
        struct CyclicLoader;
        impl ResourceType for CyclicLoader {
            fn create(
                &self,
                factory: &Factory,
                _bytes: Vec<u8>,
            ) -> Result<Box<dyn Any + Send + Sync>, ResourceError> {
                // Re-enters the same path while it's still under
                // construction, which must fail rather than deadlock or
                // recurse forever.
                factory.get("a.foo")?;
                Ok(Box::new(()))
            }
            fn destroy(&self, _factory: &Factory, _resource: Box<dyn Any + Send + Sync>) {}
        }

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.foo"), b"v1").expect("write");
        let provider = FilesystemProvider::new(dir.path().to_path_buf());
        let factory = Factory::new(vec![Box::new(provider)], 16);
        factory
            .register_type("foo", Arc::new(CyclicLoader))
            .expect("register");

        let err = factory.get("a.foo").expect_err("self-reentrant get must fail");
        assert!(matches!(err, ResourceError::LoopError(_)));
        // The failed create must roll the slot table back to empty.
        assert_eq!(factory.ref_count(path_hash("a.foo")), None);
    }

    #[test]
    fn dependent_get_from_within_create_fn_succeeds() {
        struct DependentLoader {
            creates: Arc<AtomicU32>,
        }
        impl ResourceType for DependentLoader {
            fn create(
                &self,
                factory: &Factory,
                bytes: Vec<u8>,
            ) -> Result<Box<dyn Any + Send + Sync>, ResourceError> {
                if bytes == b"parent" {
                    factory.get("child.foo")?;
                }
                self.creates.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(bytes))
            }
            fn destroy(&self, _factory: &Factory, _resource: Box<dyn Any + Send + Sync>) {}
        }

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("parent.foo"), b"parent").expect("write parent");
        std::fs::write(dir.path().join("child.foo"), b"child").expect("write child");
        let provider = FilesystemProvider::new(dir.path().to_path_buf());
        let factory = Factory::new(vec![Box::new(provider)], 16);
        let creates = Arc::new(AtomicU32::new(0));
        factory
            .register_type(
                "foo",
                Arc::new(DependentLoader {
                    creates: creates.clone(),
                }),
            )
            .expect("register");

        let parent = factory.get("parent.foo").expect("parent load");
        assert_eq!(creates.load(Ordering::SeqCst), 2);
        assert_eq!(factory.ref_count(path_hash("child.foo")), Some(1));

        factory.release(parent).expect("release parent");
        assert_eq!(factory.ref_count(path_hash("child.foo")), Some(1));
    }
}
