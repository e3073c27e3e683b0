use std::{collections::BTreeMap, rc::Rc};

use crate::{
    consumer::{consumer, Consumer},
    errors::ContainerError,
    injectable::{injectable, Injectable},
    token::{AnyToken, Token},
    types::{DynError, Instance, TokenKey},
};

/// Named dependencies of a factory
///
/// The map is copy on write: `add` and `merge` hand back a new map and never
/// touch maps already given to an [`Injector`], [`Injectable`] or [`Consumer`].
/// Entries are visited in the lexical order of their names.
#[derive(Clone, Debug, Default)]
pub struct Dependencies {
    entries: Rc<BTreeMap<String, AnyToken>>,
}
impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `token` under `name`, replacing an existing entry of the same name
    pub fn add<T: 'static>(mut self, name: impl Into<String>, token: &Token<T>) -> Self {
        Rc::make_mut(&mut self.entries).insert(name.into(), token.erase());
        self
    }

    /// Merges `other` into this map, entries of `other` win on name collisions
    pub fn merge(mut self, other: &Dependencies) -> Self {
        let entries = Rc::make_mut(&mut self.entries);
        for (name, token) in other.iter() {
            entries.insert(name.to_string(), token.clone());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&AnyToken> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnyToken)> {
        self.entries.iter().map(|(name, token)| (name.as_str(), token))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &AnyToken> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolved values of a dependency map, handed to factories
pub struct InjectionContext {
    values: BTreeMap<String, (TokenKey, Instance)>,
}
impl InjectionContext {
    pub(crate) fn new(values: BTreeMap<String, (TokenKey, Instance)>) -> Self {
        Self { values }
    }

    /// Returns the value resolved for the dependency named `name`
    pub fn get<T: 'static>(&self, name: &str) -> Result<Rc<T>, ContainerError> {
        let (key, instance) = self
            .values
            .get(name)
            .ok_or_else(|| ContainerError::UnknownDependency(name.to_string()))?;

        instance
            .downcast::<T>()
            .map_err(|actual_type| ContainerError::DowncastFailed {
                token: key.name().to_string(),
                required_type: std::any::type_name::<T>(),
                actual_type,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Fluent builder accumulating a dependency map
#[derive(Clone, Debug)]
pub struct Injector {
    dependencies: Dependencies,
}
impl Injector {
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Returns a new injector with `extra` merged in, `extra` wins on collisions
    pub fn with(&self, extra: &Dependencies) -> Injector {
        Injector {
            dependencies: self.dependencies.clone().merge(extra),
        }
    }

    /// Creates an injectable for `token` based on the accumulated dependencies
    pub fn implements<T, F>(&self, token: &Token<T>, factory: F) -> Injectable<T>
    where
        T: 'static,
        F: Fn(&InjectionContext) -> Result<T, DynError> + 'static,
    {
        injectable(token, self.dependencies.clone(), factory)
    }

    /// Creates a consumer based on the accumulated dependencies
    pub fn consumer<R, F>(&self, factory: F) -> Consumer<R>
    where
        F: Fn(&InjectionContext) -> Result<R, DynError> + 'static,
    {
        consumer(self.dependencies.clone(), factory)
    }
}

pub fn inject(dependencies: Dependencies) -> Injector {
    Injector { dependencies }
}
