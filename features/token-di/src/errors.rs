use std::sync::Arc;

use thiserror::Error;

use crate::types::DynError;

/// Errors raised by containers, injection contexts and the scope helper
#[derive(Error, Debug, Clone)]
pub enum ContainerError {
    /// A token was registered twice without requesting an override
    #[error("Token [{0}] already registered.")]
    DuplicateRegistration(String),
    /// Neither the container, its parents nor the token default could satisfy the request
    #[error("Cannot find provider for [{0}]")]
    ProviderNotFound(String),
    /// The providers of a container depend on each other in a cycle
    #[error("Circular dependency detected: {}", format_chain(.chain))]
    CircularDependency { chain: Vec<String> },
    /// The container was disposed, it rejects every operation
    #[error("Container has been disposed")]
    Disposed,
    /// An injectable factory failed
    #[error("Factory for [{product}] failed - error: {error}")]
    FactoryFailed {
        product: String,
        error: Arc<DynError>,
    },
    /// A consumer factory failed
    #[error("Consumer failed - error: {0}")]
    ConsumerFailed(Arc<DynError>),
    /// The factory asked its context for a name missing from its dependency map
    #[error("'{0}' is not part of the dependency map")]
    UnknownDependency(String),
    #[error("Failed to downcast [{token}], required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        token: String,
        required_type: &'static str,
        actual_type: &'static str,
    },
    /// No container has been pushed with `run_in_scope`
    #[error("Cannot resolve current container.")]
    NoActiveScope,
}

impl ContainerError {
    pub(crate) fn circular<'a>(chain: impl IntoIterator<Item = &'a str>) -> Self {
        ContainerError::CircularDependency {
            chain: chain.into_iter().map(str::to_string).collect(),
        }
    }
}

fn format_chain(chain: &[String]) -> String {
    chain
        .iter()
        .map(|name| format!("[{name}]"))
        .collect::<Vec<_>>()
        .join(" -> ")
}
