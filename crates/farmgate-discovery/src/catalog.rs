//! The set of controllers the process knows how to build.

use crate::controller::{Controller, ControllerMetadata};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type Factory = fn() -> anyhow::Result<Arc<dyn Controller>>;

fn build<C: Controller>() -> anyhow::Result<Arc<dyn Controller>> {
    let controller: Arc<dyn Controller> = Arc::new(C::construct()?);
    Ok(controller)
}

/// A type-erased controller: identifier, source file, metadata and factory.
#[derive(Clone)]
pub struct ControllerDescriptor {
    id: String,
    source_path: PathBuf,
    metadata: fn() -> ControllerMetadata,
    factory: Factory,
}

impl ControllerDescriptor {
    /// Describes controller type `C`, defined in `source_path`.
    #[must_use]
    pub fn of<C: Controller>(id: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            source_path: source_path.into(),
            metadata: C::metadata,
            factory: build::<C>,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the source file whose modification time guards the route cache.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Reads the controller metadata.
    #[must_use]
    pub fn metadata(&self) -> ControllerMetadata {
        (self.metadata)()
    }

    /// Builds a new instance.
    pub fn construct(&self) -> anyhow::Result<Arc<dyn Controller>> {
        (self.factory)()
    }
}

impl std::fmt::Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("id", &self.id)
            .field("source_path", &self.source_path)
            .finish_non_exhaustive()
    }
}

/// Identifier to descriptor map.
#[derive(Debug, Clone, Default)]
pub struct ControllerCatalog {
    descriptors: IndexMap<String, ControllerDescriptor>,
}

impl ControllerCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor, replacing any with the same identifier.
    pub fn add(&mut self, descriptor: ControllerDescriptor) {
        self.descriptors.insert(descriptor.id.clone(), descriptor);
    }

    /// Builder-style [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, descriptor: ControllerDescriptor) -> Self {
        self.add(descriptor);
        self
    }

    /// Looks up a descriptor.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ControllerDescriptor> {
        self.descriptors.get(id)
    }

    /// Returns `true` if `id` is resolvable.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    /// Returns the identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    /// Returns the number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl FromIterator<ControllerDescriptor> for ControllerCatalog {
    fn from_iter<I: IntoIterator<Item = ControllerDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.add(descriptor);
        }
        catalog
    }
}
