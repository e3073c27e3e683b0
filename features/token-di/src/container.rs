use std::{
    any::type_name,
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    iter,
    rc::{Rc, Weak},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{
    config::{ContainerOptions, ParentFallback},
    consumer::Consumer,
    dependency_graph::DependencyGraph,
    errors::ContainerError,
    inject::{Dependencies, InjectionContext},
    provider::{Provider, ResolveStrategy, Solution},
    registry::{RegisterMode, Registry},
    token::{AnyToken, Token},
    types::{Instance, TokenKey},
};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Registry of providers, resolving and caching their values
///
/// The providers of a container never change. `register`, `override_with` and
/// `fork` hand out new containers, so holders of an older container keep seeing
/// the bindings it was built with.
///
/// `Container` is a cheap handle, clones refer to the same container.
#[derive(Clone)]
pub struct Container(Rc<ContainerInner>);
struct ContainerInner {
    id: u64,
    registry: RefCell<Registry>,
    parent: Option<Container>,
    options: ContainerOptions,
    /// Stateful instances, keyed by the token of their solution
    cache: RefCell<HashMap<TokenKey, Instance>>,
    /// Live containers derived with this one as parent
    children: RefCell<BTreeMap<u64, Weak<ContainerInner>>>,
    /// Tokens whose factories are running right now
    resolving: RefCell<Vec<TokenKey>>,
    disposed: Cell<bool>,
}

/// Outcome of looking a token up through the container hierarchy
enum Resolution {
    Found(Instance),
    NotFound,
    Failed(ContainerError),
}

impl Default for Container {
    /// An empty root container
    fn default() -> Self {
        Container::build(Registry::default(), None, ContainerOptions::default())
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("Container");
        if self.is_disposed() {
            map.field("state", &"disposed");
            return map.finish();
        }

        let registry = self.0.registry.borrow();
        let cache = self.0.cache.borrow();
        for provider in registry.iter() {
            let key = provider.token().key();
            let state = match provider.solution() {
                Solution::Implementation { .. } => "value",
                Solution::Injectable(_) if cache.contains_key(key) => "cached",
                Solution::Injectable(_) => "lazy",
            };
            map.field(key.name(), &state);
        }
        map.finish()
    }
}

impl Container {
    /// Creates a root container from `providers`
    ///
    /// Fails if a token is provided twice or the providers depend on each other in a cycle.
    pub fn new(providers: impl IntoIterator<Item = Provider>) -> Result<Self, ContainerError> {
        Self::with_options(providers, ContainerOptions::default())
    }

    /// Creates a root container whose hierarchy uses `options`
    pub fn with_options(
        providers: impl IntoIterator<Item = Provider>,
        options: ContainerOptions,
    ) -> Result<Self, ContainerError> {
        let registry = Registry::from_providers(providers)?;
        Self::from_registry(registry, None, options)
    }

    fn from_registry(
        registry: Registry,
        parent: Option<Container>,
        options: ContainerOptions,
    ) -> Result<Self, ContainerError> {
        DependencyGraph::new(&registry).check()?;
        Ok(Self::build(registry, parent, options))
    }

    fn build(registry: Registry, parent: Option<Container>, options: ContainerOptions) -> Self {
        let container = Container(Rc::new(ContainerInner {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            registry: RefCell::new(registry),
            parent,
            options,
            cache: RefCell::new(HashMap::new()),
            children: RefCell::new(BTreeMap::new()),
            resolving: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        }));

        if let Some(parent) = &container.0.parent {
            let mut children = parent.0.children.borrow_mut();
            children.retain(|_, child| child.strong_count() > 0);
            children.insert(container.0.id, Rc::downgrade(&container.0));
        }

        tracing::debug!(
            "Built container #{} with {} providers (parent: {:?})",
            container.0.id,
            container.len(),
            container.0.parent.as_ref().map(|parent| parent.0.id)
        );
        container
    }

    /// Returns a new container with `providers` added
    ///
    /// Fails if one of the tokens is already registered in this container.
    pub fn register(
        &self,
        providers: impl IntoIterator<Item = Provider>,
    ) -> Result<Container, ContainerError> {
        self.derive(providers, RegisterMode::Register)
    }

    /// Returns a new container with `providers` added
    ///
    /// Existing providers of the same token are replaced.
    pub fn override_with(
        &self,
        providers: impl IntoIterator<Item = Provider>,
    ) -> Result<Container, ContainerError> {
        self.derive(providers, RegisterMode::Override)
    }

    fn derive(
        &self,
        providers: impl IntoIterator<Item = Provider>,
        mode: RegisterMode,
    ) -> Result<Container, ContainerError> {
        self.ensure_active()?;
        let mut registry = self.0.registry.borrow().clone();
        registry.extend(providers, mode)?;
        Self::from_registry(registry, self.0.parent.clone(), self.0.options.clone())
    }

    /// Creates a child container, falling back to this one for tokens it doesn't provide
    ///
    /// The child is disposed together with this container.
    pub fn fork(
        &self,
        providers: impl IntoIterator<Item = Provider>,
    ) -> Result<Container, ContainerError> {
        self.ensure_active()?;
        let registry = Registry::from_providers(providers)?;
        Self::from_registry(registry, Some(self.clone()), self.0.options.clone())
    }

    /// Resolves the value bound to `token`
    ///
    /// Lookup order: this container, its parent, the default of the token.
    pub fn request<T: 'static>(&self, token: &Token<T>) -> Result<Rc<T>, ContainerError> {
        self.ensure_active()?;
        let instance = self.resolve(&token.erase())?;
        instance
            .downcast::<T>()
            .map_err(|actual_type| ContainerError::DowncastFailed {
                token: token.name().to_string(),
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// Resolves the dependencies of `consumer` and runs it
    pub fn consume<R>(&self, consumer: &Consumer<R>) -> Result<R, ContainerError> {
        self.ensure_active()?;
        let ctx = self.resolve_context(consumer.dependencies())?;
        consumer
            .run(&ctx)
            .map_err(|error| ContainerError::ConsumerFailed(Arc::new(error)))
    }

    /// Drops all cached instances, running their disposers
    ///
    /// Failing disposers are logged and don't stop the others. Children are not touched.
    pub fn clear(&self) -> Result<(), ContainerError> {
        self.ensure_active()?;
        self.clear_cache();
        Ok(())
    }

    /// Clears this container, disposes all live children, and rejects any further use
    pub fn dispose(&self) -> Result<(), ContainerError> {
        self.ensure_active()?;
        tracing::debug!("Disposing container #{}", self.0.id);

        self.clear_cache();
        *self.0.registry.borrow_mut() = Registry::default();

        let children = std::mem::take(&mut *self.0.children.borrow_mut());
        for child in children.into_values().filter_map(|child| child.upgrade()) {
            let child = Container(child);
            if !child.is_disposed() {
                child.dispose()?;
            }
        }

        self.0.disposed.set(true);
        if let Some(parent) = &self.0.parent {
            parent.0.children.borrow_mut().remove(&self.0.id);
        }
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.get()
    }

    /// Whether `token` has a provider in this container, parents are not asked
    pub fn contains<T: 'static>(&self, token: &Token<T>) -> bool {
        self.0.registry.borrow().contains(token.key())
    }

    /// Number of providers registered in this container
    pub fn len(&self) -> usize {
        self.0.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent(&self) -> Option<&Container> {
        self.0.parent.as_ref()
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.0.options
    }

    /// Whether both handles refer to the same container
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn ensure_active(&self) -> Result<(), ContainerError> {
        match self.is_disposed() {
            true => Err(ContainerError::Disposed),
            false => Ok(()),
        }
    }
}

// Resolution
impl Container {
    fn resolve(&self, token: &AnyToken) -> Result<Instance, ContainerError> {
        match self.lookup(token) {
            Resolution::Found(instance) => Ok(instance),
            Resolution::NotFound => Err(ContainerError::ProviderNotFound(token.name().to_string())),
            Resolution::Failed(error) => Err(error),
        }
    }

    fn lookup(&self, token: &AnyToken) -> Resolution {
        if self.is_disposed() {
            return Resolution::Failed(ContainerError::Disposed);
        }

        let key = token.key();
        if key.is_container() {
            return Resolution::Found(Instance::new(self.clone()));
        }

        // Clone the provider out, factories may call back into this container
        let provider = self.0.registry.borrow().get(key).cloned();
        if let Some(provider) = provider {
            return match self.resolve_provider(&provider) {
                Ok(instance) => Resolution::Found(instance),
                Err(error) => Resolution::Failed(error),
            };
        }

        if let Some(parent) = &self.0.parent {
            match parent.lookup(token) {
                Resolution::Found(instance) => return Resolution::Found(instance),
                Resolution::NotFound => {}
                Resolution::Failed(error) => match self.0.options.parent_fallback {
                    ParentFallback::AnyFailure => {
                        tracing::debug!(
                            "Parent failed to resolve {}, falling through: {}",
                            key,
                            error
                        )
                    }
                    ParentFallback::NotFoundOnly => return Resolution::Failed(error),
                },
            }
        }

        match token.default_value() {
            Some(default) => Resolution::Found(default.clone()),
            None => Resolution::NotFound,
        }
    }

    fn resolve_provider(&self, provider: &Provider) -> Result<Instance, ContainerError> {
        let key = provider.token().key();
        let stateful = provider.strategy() == ResolveStrategy::Stateful;

        if stateful {
            if let Some(cached) = self.0.cache.borrow().get(key) {
                tracing::trace!("Resolved {} from cache", key);
                return Ok(cached.clone());
            }
        }

        match provider.solution() {
            Solution::Implementation { value, .. } => Ok(value.clone()),
            Solution::Injectable(injectable) => {
                tracing::trace!("Constructing {} ({:?})", key, provider.strategy());
                let _guard = ResolutionGuard::enter(&self.0.resolving, key)?;

                let ctx = self.resolve_context(injectable.dependencies())?;
                let instance = injectable.construct(&ctx)?;

                if stateful {
                    self.0
                        .cache
                        .borrow_mut()
                        .insert(injectable.token().key().clone(), instance.clone());
                }
                Ok(instance)
            }
        }
    }

    fn resolve_context(
        &self,
        dependencies: &Dependencies,
    ) -> Result<InjectionContext, ContainerError> {
        let mut values = BTreeMap::new();
        for (name, token) in dependencies.iter() {
            let instance = self.resolve(token)?;
            values.insert(name.to_string(), (token.key().clone(), instance));
        }
        Ok(InjectionContext::new(values))
    }

    fn clear_cache(&self) {
        let mut cached = std::mem::take(&mut *self.0.cache.borrow_mut());
        if cached.is_empty() {
            return;
        }
        tracing::debug!(
            "Clearing {} cached instances of container #{}",
            cached.len(),
            self.0.id
        );

        let providers: Vec<Provider> = self
            .0
            .registry
            .borrow()
            .iter()
            .filter(|provider| cached.contains_key(provider.token().key()))
            .cloned()
            .collect();

        for provider in providers {
            let key = provider.token().key();
            let (Some(instance), Solution::Injectable(injectable)) =
                (cached.remove(key), provider.solution())
            else {
                continue;
            };

            if let Err(error) = injectable.dispose(&instance) {
                tracing::error!("Disposer for {} failed: {}", key, error);
            }
        }
    }
}

/// Marks a token as under construction until dropped
struct ResolutionGuard<'a> {
    stack: &'a RefCell<Vec<TokenKey>>,
}
impl<'a> ResolutionGuard<'a> {
    fn enter(stack: &'a RefCell<Vec<TokenKey>>, key: &TokenKey) -> Result<Self, ContainerError> {
        let mut keys = stack.borrow_mut();
        if let Some(start) = keys.iter().position(|k| k == key) {
            let chain = keys[start..].iter().chain(iter::once(key));
            return Err(ContainerError::circular(chain.map(TokenKey::name)));
        }

        keys.push(key.clone());
        Ok(Self { stack })
    }
}
impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// Creates a root container from `providers`
pub fn container(
    providers: impl IntoIterator<Item = Provider>,
) -> Result<Container, ContainerError> {
    Container::new(providers)
}
