use std::{fmt::Debug, rc::Rc};

use crate::{
    container::Container,
    injectable::{dynamic_injectable, Injectable},
    types::{DynError, Instance, TokenKey, CONTAINER_KEY_ID},
};

/// Declaration of a dependency of type `T`
///
/// A token is identified by a key allocated on creation, so two tokens sharing
/// a display name are still distinct dependencies.
pub struct Token<T> {
    key: TokenKey,
    default: Option<Rc<T>>,
}
impl<T> Clone for Token<T> {
    fn clone(&self) -> Self {
        Token {
            key: self.key.clone(),
            default: self.default.clone(),
        }
    }
}
impl<T> Debug for Token<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("key", &self.key)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

impl<T: 'static> Token<T> {
    pub fn new(name: &str) -> Self {
        Token {
            key: TokenKey::allocate(name),
            default: None,
        }
    }

    /// Creates a token which resolves to `value` when nothing else provides it
    pub fn with_default(name: &str, value: T) -> Self {
        Token {
            key: TokenKey::allocate(name),
            default: Some(Rc::new(value)),
        }
    }

    pub fn key(&self) -> &TokenKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn default_value(&self) -> Option<&Rc<T>> {
        self.default.as_ref()
    }

    /// Binds `factory` to this token, handing it the container which resolves it
    pub fn implement_as<F>(&self, factory: F) -> Injectable<T>
    where
        F: Fn(&Container) -> Result<T, DynError> + 'static,
    {
        dynamic_injectable(self, factory)
    }

    pub(crate) fn erase(&self) -> AnyToken {
        AnyToken {
            key: self.key.clone(),
            default: self.default.clone().map(Instance::from_rc),
        }
    }
}

/// A token with its value type erased, as stored in dependency maps
#[derive(Clone, Debug)]
pub struct AnyToken {
    key: TokenKey,
    default: Option<Instance>,
}
impl AnyToken {
    pub fn key(&self) -> &TokenKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub(crate) fn default_value(&self) -> Option<&Instance> {
        self.default.as_ref()
    }
}
impl<T: 'static> From<&Token<T>> for AnyToken {
    fn from(token: &Token<T>) -> Self {
        token.erase()
    }
}

pub fn token<T: 'static>(name: &str) -> Token<T> {
    Token::new(name)
}

pub fn token_with_default<T: 'static>(name: &str, value: T) -> Token<T> {
    Token::with_default(name, value)
}

/// The reserved token standing for "the container resolving this dependency"
///
/// Every call returns the same identity. Providers registered for it are ignored.
pub fn container_token() -> Token<Container> {
    Token {
        key: TokenKey::reserved(CONTAINER_KEY_ID, "Container"),
        default: None,
    }
}

/// A solution which is already a concrete value
pub struct Implementation<T> {
    token: Token<T>,
    value: Rc<T>,
}
impl<T> Clone for Implementation<T> {
    fn clone(&self) -> Self {
        Implementation {
            token: self.token.clone(),
            value: self.value.clone(),
        }
    }
}
impl<T: 'static> Implementation<T> {
    pub fn token(&self) -> &Token<T> {
        &self.token
    }

    pub fn value(&self) -> &Rc<T> {
        &self.value
    }

    pub(crate) fn into_parts(self) -> (AnyToken, Instance) {
        (self.token.erase(), Instance::from_rc(self.value))
    }
}

pub fn implementation<T: 'static>(token: &Token<T>, value: T) -> Implementation<T> {
    Implementation {
        token: token.clone(),
        value: Rc::new(value),
    }
}
