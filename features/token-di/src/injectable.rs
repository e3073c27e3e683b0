use std::{fmt::Debug, marker::PhantomData, rc::Rc, sync::Arc};

use crate::{
    container::Container,
    errors::ContainerError,
    inject::{Dependencies, InjectionContext},
    token::{container_token, AnyToken, Token},
    types::{DynError, Instance},
};

type ErasedFactory = Rc<dyn Fn(&InjectionContext) -> Result<Instance, DynError>>;
type ErasedDisposer = Rc<dyn Fn(&Instance) -> Result<(), DynError>>;

/// Name under which dynamic injectables and consumers receive their container
pub(crate) const CONTAINER_DEPENDENCY: &str = "container";

/// A solution which asks for dependencies and builds a `T` from them
pub struct Injectable<T> {
    solution: InjectableSolution,
    _provides: PhantomData<fn() -> T>,
}
impl<T> Clone for Injectable<T> {
    fn clone(&self) -> Self {
        Injectable {
            solution: self.solution.clone(),
            _provides: PhantomData,
        }
    }
}
impl<T> Debug for Injectable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.solution.fmt(f)
    }
}

impl<T: 'static> Injectable<T> {
    pub fn new<F>(token: &Token<T>, dependencies: Dependencies, factory: F) -> Self
    where
        F: Fn(&InjectionContext) -> Result<T, DynError> + 'static,
    {
        Injectable {
            solution: InjectableSolution {
                token: token.erase(),
                dependencies,
                factory: Rc::new(move |ctx: &InjectionContext| factory(ctx).map(Instance::new)),
                disposer: None,
            },
            _provides: PhantomData,
        }
    }

    /// Sets the disposer invoked with the cached instance when its container is cleared
    pub fn with_disposer<D>(mut self, disposer: D) -> Self
    where
        D: Fn(&T) -> Result<(), DynError> + 'static,
    {
        self.solution.disposer = Some(Rc::new(move |instance: &Instance| -> Result<(), DynError> {
            let value = instance.downcast_ref::<T>().map_err(|actual_type| {
                format!(
                    "disposer expected '{}' but got '{actual_type}'",
                    std::any::type_name::<T>()
                )
            })?;
            disposer(value)
        }));
        self
    }

    pub fn token(&self) -> &AnyToken {
        &self.solution.token
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.solution.dependencies
    }

    pub fn has_disposer(&self) -> bool {
        self.solution.disposer.is_some()
    }

    pub(crate) fn into_solution(self) -> InjectableSolution {
        self.solution
    }
}

/// Type erased form of an [`Injectable`], as held by providers
#[derive(Clone)]
pub struct InjectableSolution {
    token: AnyToken,
    dependencies: Dependencies,
    factory: ErasedFactory,
    disposer: Option<ErasedDisposer>,
}
impl Debug for InjectableSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injectable")
            .field("token", &self.token.key())
            .field("dependencies", &self.dependencies)
            .field("has_disposer", &self.disposer.is_some())
            .finish()
    }
}
impl InjectableSolution {
    pub fn token(&self) -> &AnyToken {
        &self.token
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    pub(crate) fn construct(&self, ctx: &InjectionContext) -> Result<Instance, ContainerError> {
        (self.factory)(ctx).map_err(|error| ContainerError::FactoryFailed {
            product: self.token.name().to_string(),
            error: Arc::new(error),
        })
    }

    /// Runs the disposer, if there is one
    pub(crate) fn dispose(&self, instance: &Instance) -> Result<(), DynError> {
        match &self.disposer {
            Some(disposer) => disposer(instance),
            None => Ok(()),
        }
    }
}

pub fn injectable<T, F>(token: &Token<T>, dependencies: Dependencies, factory: F) -> Injectable<T>
where
    T: 'static,
    F: Fn(&InjectionContext) -> Result<T, DynError> + 'static,
{
    Injectable::new(token, dependencies, factory)
}

/// An injectable without any dependencies
pub fn factory<T, F>(token: &Token<T>, func: F) -> Injectable<T>
where
    T: 'static,
    F: Fn() -> Result<T, DynError> + 'static,
{
    Injectable::new(token, Dependencies::new(), move |_| func())
}

/// An injectable whose only dependency is the container resolving it
pub fn dynamic_injectable<T, F>(token: &Token<T>, func: F) -> Injectable<T>
where
    T: 'static,
    F: Fn(&Container) -> Result<T, DynError> + 'static,
{
    let dependencies = Dependencies::new().add(CONTAINER_DEPENDENCY, &container_token());
    Injectable::new(token, dependencies, move |ctx| {
        let ioc = ctx.get::<Container>(CONTAINER_DEPENDENCY)?;
        func(&*ioc)
    })
}
