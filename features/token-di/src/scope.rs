//! Ambient container for call sites that can't receive one explicitly
//!
//! Scopes live on a thread local stack. [`run_in_scope`] pushes a container,
//! runs the callback synchronously and pops it again, so scopes strictly nest
//! and never leak across threads.

use std::{cell::RefCell, rc::Rc};

use crate::{container::Container, errors::ContainerError, token::Token};

thread_local! {
    static SCOPES: RefCell<Vec<Container>> = const { RefCell::new(Vec::new()) };
}

/// Pops the scope it pushed, also when the callback panics
struct ScopeGuard;
impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPES.with(|scopes| scopes.borrow_mut().pop());
    }
}

/// Runs `callback` with `container` as the current container
pub fn run_in_scope<R>(container: &Container, callback: impl FnOnce() -> R) -> R {
    SCOPES.with(|scopes| scopes.borrow_mut().push(container.clone()));
    let _guard = ScopeGuard;
    callback()
}

/// The innermost container pushed by [`run_in_scope`]
pub fn current_container() -> Result<Container, ContainerError> {
    SCOPES
        .with(|scopes| scopes.borrow().last().cloned())
        .ok_or(ContainerError::NoActiveScope)
}

/// Requests `token` from the current container
pub fn use_injection<T: 'static>(token: &Token<T>) -> Result<Rc<T>, ContainerError> {
    current_container()?.request(token)
}
