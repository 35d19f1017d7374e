//! Applet construction and the per-applet lifecycle cache.
//!
//! A manifest names its code by `entry_point` and `class_name`. Instead of
//! loading code at runtime, every constructible applet type is registered in an
//! [`AppletRegistry`] as a plain factory function keyed by that pair. The
//! [`AppletLoader`] resolves a catalog entry through the registry the first
//! time it is selected and keeps the instance for the rest of the process, so
//! applet state survives leaving and re-entering it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::applets::{Applet, AppletContext, TemplateApplet};
use crate::error::LoadError;
use crate::input::InputHandle;
use crate::manifest::{Catalog, Manifest};

/// Shared, mutable handle to a constructed applet.
pub type AppletHandle = Rc<RefCell<Box<dyn Applet>>>;

/// Constructs an applet from its capabilities.
pub type AppletFactory = fn(AppletContext) -> Box<dyn Applet>;

// =============================================================================
// Factory Registry
// =============================================================================

/// Entry point → exported type name → factory.
#[derive(Default)]
pub struct AppletRegistry {
    entry_points: HashMap<String, HashMap<String, AppletFactory>>,
}

impl AppletRegistry {
    /// Empty registry. Use [`AppletRegistry::with_builtins`] for the bundled applets.
    pub fn new() -> Self { Self::default() }

    /// Registry with every applet type shipped in this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("template_applet", "TemplateApplet", TemplateApplet::create);
        registry
    }

    /// Export `class_name` from `entry_point`. A later registration replaces an earlier one.
    pub fn register(
        &mut self,
        entry_point: &str,
        class_name: &str,
        factory: AppletFactory,
    ) {
        self.entry_points
            .entry(entry_point.to_owned())
            .or_default()
            .insert(class_name.to_owned(), factory);
    }

    /// Find the factory a manifest refers to.
    pub fn resolve(
        &self,
        manifest: &Manifest,
    ) -> Result<AppletFactory, LoadError> {
        let exports = self
            .entry_points
            .get(&manifest.entry_point)
            .ok_or_else(|| LoadError::EntryPointUnavailable {
                applet: manifest.name.clone(),
                entry_point: manifest.entry_point.clone(),
            })?;
        exports
            .get(&manifest.class_name)
            .copied()
            .ok_or_else(|| LoadError::TypeNotExported {
                applet: manifest.name.clone(),
                entry_point: manifest.entry_point.clone(),
                class_name: manifest.class_name.clone(),
            })
    }
}

impl core::fmt::Debug for AppletRegistry {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        f.debug_map()
            .entries(self.entry_points.iter().map(|(entry, exports)| (entry, exports.keys().collect::<Vec<_>>())))
            .finish()
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Where an applet is in its life.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Phase {
    /// Never selected.
    #[default]
    Unloaded,
    /// Constructed and idle.
    Loaded,
    /// Has control of the surface.
    Running,
    /// `stop` has run; becomes `Loaded` again before the next launch.
    Stopped,
}

/// Runtime state of one catalog entry. Kept apart from the immutable manifest.
#[derive(Default)]
pub struct LifecycleRecord {
    instance: Option<AppletHandle>,
    phase: Phase,
}

impl LifecycleRecord {
    /// Current phase.
    pub const fn phase(&self) -> Phase { self.phase }

    /// The cached instance, once constructed.
    pub fn instance(&self) -> Option<&AppletHandle> { self.instance.as_ref() }
}

// =============================================================================
// Loader
// =============================================================================

/// Lazily constructs catalog applets and caches one instance per name.
pub struct AppletLoader {
    catalog: Catalog,
    registry: AppletRegistry,
    records: HashMap<String, LifecycleRecord>,
    input: InputHandle,
}

impl AppletLoader {
    /// Loader over `catalog`. Nothing is constructed until first use.
    pub fn new(
        catalog: Catalog,
        registry: AppletRegistry,
        input: InputHandle,
    ) -> Self {
        Self {
            catalog,
            registry,
            records: HashMap::new(),
            input,
        }
    }

    /// Entries this loader can construct.
    pub const fn catalog(&self) -> &Catalog { &self.catalog }

    /// Return the cached instance for `name`, constructing it on first use.
    pub fn get_or_create(
        &mut self,
        name: &str,
    ) -> Result<AppletHandle, LoadError> {
        if let Some(handle) = self.records.get(name).and_then(LifecycleRecord::instance) {
            debug!("Reusing applet '{name}'");
            return Ok(Rc::clone(handle));
        }

        let manifest = self
            .catalog
            .find(name)
            .ok_or_else(|| LoadError::UnknownApplet(name.to_owned()))?;
        let factory = self.registry.resolve(manifest)?;

        let context = AppletContext {
            name: manifest.name.clone(),
            input: InputHandle::clone(&self.input),
            options: manifest.options.clone(),
            resource_dir: manifest.resource_dir(),
        };
        let handle: AppletHandle = Rc::new(RefCell::new(factory(context)));
        info!("Loaded applet '{name}' ({}::{})", manifest.entry_point, manifest.class_name);

        self.records.insert(name.to_owned(), LifecycleRecord {
            instance: Some(Rc::clone(&handle)),
            phase: Phase::Loaded,
        });
        Ok(handle)
    }

    /// The cached instance for `name`, if it was ever constructed.
    pub fn instance(
        &self,
        name: &str,
    ) -> Option<AppletHandle> {
        self.records.get(name).and_then(LifecycleRecord::instance).map(Rc::clone)
    }

    /// Current phase of a catalog entry, `None` if it is not in the catalog.
    pub fn phase(
        &self,
        name: &str,
    ) -> Option<Phase> {
        self.catalog.find(name)?;
        Some(self.records.get(name).map_or(Phase::Unloaded, LifecycleRecord::phase))
    }

    /// Move a constructed applet to `phase`. Ignored for entries never constructed.
    pub fn set_phase(
        &mut self,
        name: &str,
        phase: Phase,
    ) {
        if let Some(record) = self.records.get_mut(name) {
            debug!("Applet '{name}': {:?} -> {phase:?}", record.phase);
            record.phase = phase;
        }
    }
}
