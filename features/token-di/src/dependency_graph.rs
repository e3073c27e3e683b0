use std::collections::HashSet;

use crate::{errors::ContainerError, provider::Solution, registry::Registry, types::TokenKey};

/// Graph over the providers of one registry
///
/// Edges only lead to tokens registered in the same registry. Dependencies
/// satisfied by a parent container were checked when the parent was built.
pub(crate) struct DependencyGraph<'a> {
    registry: &'a Registry,
}
impl<'a> DependencyGraph<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Fails with the first cycle found, walking entries in registration order
    pub fn check(&self) -> Result<(), ContainerError> {
        let mut seen = HashSet::new();
        let mut passing = HashSet::new();
        let mut chain = Vec::new();

        for provider in self.registry.iter() {
            check_recurse(
                self,
                &mut seen,
                &mut passing,
                &mut chain,
                provider.token().key(),
            )?;
        }

        return Ok(());

        fn check_recurse<'g>(
            graph: &DependencyGraph<'g>,
            seen: &mut HashSet<&'g TokenKey>,
            passing: &mut HashSet<&'g TokenKey>,
            chain: &mut Vec<&'g TokenKey>,
            key: &'g TokenKey,
        ) -> Result<(), ContainerError> {
            if passing.contains(key) {
                chain.push(key); // Close the loop so the chain reads from start to start
                return Err(ContainerError::circular(chain.iter().map(|k| k.name())));
            }

            // Subtree already verified from another entry point
            if seen.contains(key) {
                return Ok(());
            }

            let Some(provider) = graph.registry.get(key) else {
                return Ok(());
            };

            passing.insert(key);
            chain.push(key);

            if let Solution::Injectable(injectable) = provider.solution() {
                for dependency in injectable.dependencies().tokens() {
                    let dependency = dependency.key();
                    if dependency.is_container() || !graph.registry.contains(dependency) {
                        continue;
                    }
                    check_recurse(graph, seen, passing, chain, dependency)?;
                }
            }

            chain.pop();
            passing.remove(key);
            seen.insert(key);
            Ok(())
        }
    }
}
