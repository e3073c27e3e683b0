/// Which parent failures a child container falls through on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParentFallback {
    /// Any parent failure falls through to the token default
    #[default]
    AnyFailure,
    /// Only "no provider" falls through, other parent failures are returned to the caller
    NotFoundOnly,
}

/// Options of a container hierarchy
///
/// Set on the root container and inherited by every container derived from it.
///
/// # Example
/// ```rust
/// use token_di::{Container, ContainerOptions, ParentFallback};
///
/// let options = ContainerOptions::new().parent_fallback(ParentFallback::NotFoundOnly);
/// let root = Container::with_options([], options).unwrap();
/// assert_eq!(root.options().parent_fallback, ParentFallback::NotFoundOnly);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContainerOptions {
    pub parent_fallback: ParentFallback,
}
impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent_fallback(mut self, parent_fallback: ParentFallback) -> Self {
        self.parent_fallback = parent_fallback;
        self
    }
}
