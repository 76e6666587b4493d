use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use log::{debug, info, warn};

use crate::error::{ImportError, NotFoundKind, Result};

use super::{CanonicalCatalog, OpDescriptorCatalog, OpDescriptorLoader};

/// What happens when a loader is registered under a framework name that is already taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The latest loader replaces the previous one, with a warning.
    #[default]
    Overwrite,
    /// The registration fails with a configuration error.
    Reject,
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub duplicate_frameworks: DuplicatePolicy,
}

struct RegisteredFramework {
    loader: Arc<dyn OpDescriptorLoader>,
    catalog: Arc<OpDescriptorCatalog>,
}

#[derive(Default)]
struct RegistryState {
    frameworks: HashMap<String, RegisteredFramework>,
    canonical: Arc<CanonicalCatalog>,
}

/// Maps framework names to their loaders and holds the canonical descriptor catalog.
///
/// Loaders are registered during start up, then the registry is frozen and shared
/// (usually as an `Arc`) with every mapping rule. Each registration builds its catalogs
/// before taking the write lock, so readers only ever observe complete snapshots.
pub struct OpDescriptorRegistry {
    config: Config,
    state: RwLock<RegistryState>,
    frozen: AtomicBool,
}

impl Default for OpDescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OpDescriptorRegistry {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            state: RwLock::new(RegistryState::default()),
            frozen: AtomicBool::new(false),
        }
    }

    pub fn current_config(&self) -> Config {
        self.config.clone()
    }

    /// Registers a loader under its framework name and makes its canonical op list the current one.
    pub fn register_loader<L>(&self, loader: L) -> Result<()>
    where
        L: OpDescriptorLoader + 'static,
    {
        self.register_shared(Arc::new(loader))
    }

    pub fn register_boxed(&self, loader: Box<dyn OpDescriptorLoader>) -> Result<()> {
        self.register_shared(Arc::from(loader))
    }

    fn register_shared(&self, loader: Arc<dyn OpDescriptorLoader>) -> Result<()> {
        let framework = loader.framework_name().to_string();
        if self.is_frozen() {
            return Err(ImportError::Configuration(format!(
                "the registry is frozen, {} can't be registered",
                framework
            )));
        }

        let catalog = Arc::new(loader.input_framework_op_descriptor_list()?);
        if catalog.framework() != framework {
            return Err(ImportError::Configuration(format!(
                "loader {} produced a catalog for {}",
                framework,
                catalog.framework()
            )));
        }
        let canonical = Arc::new(CanonicalCatalog::new(loader.nd4j_op_list()?)?);

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // freeze may have landed while the catalogs were being built
        if self.is_frozen() {
            return Err(ImportError::Configuration(format!(
                "the registry was frozen while {} was loading",
                framework
            )));
        }
        if state.frameworks.contains_key(&framework) {
            match self.config.duplicate_frameworks {
                DuplicatePolicy::Reject => {
                    return Err(ImportError::Configuration(format!(
                        "a loader for {} is already registered",
                        framework
                    )))
                }
                DuplicatePolicy::Overwrite => {
                    warn!("Replacing the loader registered for {}", framework)
                }
            }
        }

        debug!(
            "Registered {} with {} ops, canonical catalog has {} ops",
            framework,
            catalog.len(),
            canonical.len()
        );
        state
            .frameworks
            .insert(framework, RegisteredFramework { loader, catalog });
        state.canonical = canonical;
        Ok(())
    }

    /// Registers every loader in order, then freezes the registry.
    ///
    /// Returns the canonical catalog left by the last loader.
    pub fn bootstrap<I>(&self, loaders: I) -> Result<Arc<CanonicalCatalog>>
    where
        I: IntoIterator<Item = Box<dyn OpDescriptorLoader>>,
    {
        for loader in loaders {
            self.register_boxed(loader)?;
        }
        self.freeze();

        let canonical = self.canonical_catalog();
        info!(
            "Registry bootstrapped with frameworks {:?} and {} canonical ops",
            self.frameworks(),
            canonical.len()
        );
        Ok(canonical)
    }

    /// Makes the registry read-only. There is no way back.
    ///
    /// Waits for a registration holding the write lock, so once this returns no
    /// later registration can land.
    pub fn freeze(&self) {
        let _state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.frozen.store(true, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// The native op catalog of a framework.
    pub fn catalog_for(&self, framework: &str) -> Result<Arc<OpDescriptorCatalog>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .frameworks
            .get(framework)
            .map(|entry| entry.catalog.clone())
            .ok_or_else(|| ImportError::not_found(NotFoundKind::Framework, framework))
    }

    pub fn loader_for(&self, framework: &str) -> Result<Arc<dyn OpDescriptorLoader>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .frameworks
            .get(framework)
            .map(|entry| entry.loader.clone())
            .ok_or_else(|| ImportError::not_found(NotFoundKind::Framework, framework))
    }

    pub fn canonical_catalog(&self) -> Arc<CanonicalCatalog> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .canonical
            .clone()
    }

    /// Registered framework names, sorted.
    pub fn frameworks(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut names = state.frameworks.keys().cloned().collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}
