//! Circular dependency detection infrastructure.

use crate::error::{DiError, DiResult};

/// Default maximum nesting of a single resolution.
pub(crate) const MAX_DEPTH: usize = 1024;

/// Names currently under construction for one top-level resolution.
///
/// The path travels explicitly down the recursion instead of living in
/// thread-local or global state, so concurrent resolutions never see each
/// other's stacks.
#[derive(Debug)]
pub(crate) struct ResolutionPath {
    stack: Vec<String>,
    max_depth: usize,
}

impl ResolutionPath {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self { stack: Vec::new(), max_depth }
    }

    /// Runs `f` with `name` pushed on the path.
    ///
    /// Fails before calling `f` if `name` is already being resolved or the
    /// path is as deep as allowed.
    pub(crate) fn within<T, F>(&mut self, name: &str, f: F) -> DiResult<T>
    where
        F: FnOnce(&mut Self) -> DiResult<T>,
    {
        // Circular detection BEFORE pushing the new name
        if let Some(start) = self.stack.iter().position(|n| n == name) {
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(name.to_string());
            return Err(DiError::Circular(cycle));
        }
        if self.stack.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(self.stack.len()));
        }

        self.stack.push(name.to_string());
        let result = f(self);
        let popped = self.stack.pop();
        debug_assert_eq!(popped.as_deref(), Some(name));
        result
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }
}
