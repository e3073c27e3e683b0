use std::collections::HashMap;

use crate::{errors::ContainerError, provider::Provider, types::TokenKey};

/// What to do when a token is already present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegisterMode {
    Register,
    Override,
}

/// Providers of a single container keyed by token
///
/// Derived containers clone the registry and never write to the original.
/// Registration order is kept, it decides where the cycle check starts.
#[derive(Clone, Default)]
pub(crate) struct Registry {
    providers: HashMap<TokenKey, Provider>,
    order: Vec<TokenKey>,
}
impl Registry {
    pub fn from_providers(
        providers: impl IntoIterator<Item = Provider>,
    ) -> Result<Self, ContainerError> {
        let mut registry = Registry::default();
        registry.extend(providers, RegisterMode::Register)?;
        Ok(registry)
    }

    pub fn extend(
        &mut self,
        providers: impl IntoIterator<Item = Provider>,
        mode: RegisterMode,
    ) -> Result<(), ContainerError> {
        for provider in providers {
            self.insert(provider, mode)?;
        }
        Ok(())
    }

    fn insert(&mut self, provider: Provider, mode: RegisterMode) -> Result<(), ContainerError> {
        let key = provider.token().key().clone();
        if key.is_container() {
            tracing::warn!("Ignoring provider for the reserved container token");
            return Ok(());
        }

        match self.providers.insert(key.clone(), provider) {
            None => self.order.push(key),
            Some(existing) if mode == RegisterMode::Register => {
                // Put the original back so a failed registration leaves no trace
                self.providers.insert(key.clone(), existing);
                return Err(ContainerError::DuplicateRegistration(key.name().to_string()));
            }
            Some(_) => tracing::debug!("Overriding provider for {}", key),
        }

        Ok(())
    }

    pub fn get(&self, key: &TokenKey) -> Option<&Provider> {
        self.providers.get(key)
    }

    pub fn contains(&self, key: &TokenKey) -> bool {
        self.providers.contains_key(key)
    }

    /// Providers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.order.iter().filter_map(|key| self.providers.get(key))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}
