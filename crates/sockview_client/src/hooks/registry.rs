use std::collections::HashMap;
use std::rc::Rc;

use super::{ChartRenderer, ContainerWidth, Hook, ScrollHandler};

type HookFactory = Rc<dyn Fn() -> Box<dyn Hook>>;

/// Name-keyed factory map for hook instances.
///
/// The connection looks elements' `data-hook` attribute up here and creates
/// one instance per element. Registries are cheap to clone and immutable once
/// built.
///
/// # Example
///
/// ```rust,ignore
/// let hooks = HookRegistry::builder()
///     .register("ScrollHandler", ScrollHandler::new)
///     .register("ContainerWidth", ContainerWidth::new)
///     .build();
/// ```
#[derive(Clone, Default)]
pub struct HookRegistry {
    factories: Rc<HashMap<String, HookFactory>>,
}

impl HookRegistry {
    /// Create a new builder for constructing a registry.
    pub fn builder() -> HookRegistryBuilder {
        HookRegistryBuilder::new()
    }

    /// Registry with the three standard hooks under their canonical names.
    pub fn standard() -> Self {
        Self::builder()
            .register("ScrollHandler", ScrollHandler::new)
            .register("ContainerWidth", ContainerWidth::new)
            .register("ChartRenderer", ChartRenderer::new)
            .build()
    }

    /// Instantiate the hook registered under `name`, if any.
    pub fn create(&self, name: &str) -> Option<Box<dyn Hook>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// All registered hook names.
    pub fn registered_hooks(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

/// Builder for constructing a [`HookRegistry`].
pub struct HookRegistryBuilder {
    factories: HashMap<String, HookFactory>,
}

impl HookRegistryBuilder {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a hook under the name elements reference in their
    /// `data-hook` attribute. The factory runs once per mounted element.
    pub fn register<H, F>(mut self, name: &str, factory: F) -> Self
    where
        H: Hook + 'static,
        F: Fn() -> H + 'static,
    {
        self.factories
            .insert(name.to_string(), Rc::new(move || Box::new(factory())));
        self
    }

    pub fn build(self) -> HookRegistry {
        HookRegistry {
            factories: Rc::new(self.factories),
        }
    }
}

impl Default for HookRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
