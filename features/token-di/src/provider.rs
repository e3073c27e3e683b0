use crate::{
    injectable::{Injectable, InjectableSolution},
    token::{AnyToken, Implementation},
    types::Instance,
};

/// How a provider's value is kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// Created when first requested, then a singleton within the container
    #[default]
    Stateful,
    /// A new instance on every request
    Stateless,
}

/// Binding of a token to either a value or a factory
#[derive(Clone, Debug)]
pub enum Solution {
    Implementation { token: AnyToken, value: Instance },
    Injectable(InjectableSolution),
}
impl Solution {
    pub fn token(&self) -> &AnyToken {
        match self {
            Solution::Implementation { token, .. } => token,
            Solution::Injectable(injectable) => injectable.token(),
        }
    }
}
impl<T: 'static> From<Implementation<T>> for Solution {
    fn from(implementation: Implementation<T>) -> Self {
        let (token, value) = implementation.into_parts();
        Solution::Implementation { token, value }
    }
}
impl<T: 'static> From<Injectable<T>> for Solution {
    fn from(injectable: Injectable<T>) -> Self {
        Solution::Injectable(injectable.into_solution())
    }
}

/// A solution together with its resolve strategy
#[derive(Clone, Debug)]
pub struct Provider {
    solution: Solution,
    strategy: ResolveStrategy,
}
impl Provider {
    pub fn new(solution: impl Into<Solution>, strategy: ResolveStrategy) -> Self {
        Provider {
            solution: solution.into(),
            strategy,
        }
    }

    pub fn stateful(solution: impl Into<Solution>) -> Self {
        Self::new(solution, ResolveStrategy::Stateful)
    }

    /// Only injectables can be stateless, an implementation is a single value already
    pub fn stateless<T: 'static>(solution: Injectable<T>) -> Self {
        Self::new(solution, ResolveStrategy::Stateless)
    }

    pub fn token(&self) -> &AnyToken {
        self.solution.token()
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn strategy(&self) -> ResolveStrategy {
        self.strategy
    }
}

pub fn provider(solution: impl Into<Solution>, strategy: ResolveStrategy) -> Provider {
    Provider::new(solution, strategy)
}

/// Shorthands for [`Provider::stateful`] and [`Provider::stateless`]
pub mod provide {
    use super::{Provider, Solution};
    use crate::injectable::Injectable;

    pub fn stateful(solution: impl Into<Solution>) -> Provider {
        Provider::stateful(solution)
    }

    pub fn stateless<T: 'static>(solution: Injectable<T>) -> Provider {
        Provider::stateless(solution)
    }
}
