use std::{fmt::Debug, rc::Rc};

use crate::{
    container::Container,
    inject::{Dependencies, InjectionContext},
    injectable::CONTAINER_DEPENDENCY,
    token::container_token,
    types::DynError,
};

/// Terminal user of dependencies
///
/// A consumer is never registered in a container and can't be requested by others,
/// it is only run through [`Container::consume`].
pub struct Consumer<R> {
    dependencies: Dependencies,
    factory: Rc<dyn Fn(&InjectionContext) -> Result<R, DynError>>,
}
impl<R> Clone for Consumer<R> {
    fn clone(&self) -> Self {
        Consumer {
            dependencies: self.dependencies.clone(),
            factory: self.factory.clone(),
        }
    }
}
impl<R> Debug for Consumer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("dependencies", &self.dependencies)
            .finish()
    }
}
impl<R> Consumer<R> {
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    pub(crate) fn run(&self, ctx: &InjectionContext) -> Result<R, DynError> {
        (self.factory)(ctx)
    }
}

pub fn consumer<R, F>(dependencies: Dependencies, factory: F) -> Consumer<R>
where
    F: Fn(&InjectionContext) -> Result<R, DynError> + 'static,
{
    Consumer {
        dependencies,
        factory: Rc::new(factory),
    }
}

/// A consumer handed the container consuming it
pub fn dynamic_consumer<R, F>(func: F) -> Consumer<R>
where
    F: Fn(&Container) -> Result<R, DynError> + 'static,
{
    let dependencies = Dependencies::new().add(CONTAINER_DEPENDENCY, &container_token());
    consumer(dependencies, move |ctx| {
        let ioc = ctx.get::<Container>(CONTAINER_DEPENDENCY)?;
        func(&*ioc)
    })
}
