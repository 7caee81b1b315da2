//! Internal disposal bag for managing cleanup hooks.

/// Container for disposal hooks with LIFO execution order.
#[derive(Default)]
pub(crate) struct DisposeBag {
    hooks: Vec<(String, Box<dyn FnOnce() + Send>)>,
}

impl DisposeBag {
    /// Add a disposal hook owned by `service`.
    pub(crate) fn push(&mut self, service: &str, f: Box<dyn FnOnce() + Send>) {
        self.hooks.push((service.to_string(), f));
    }

    /// Take every hook out, most recently registered first.
    pub(crate) fn drain_reverse(&mut self) -> Vec<(String, Box<dyn FnOnce() + Send>)> {
        let mut hooks = std::mem::take(&mut self.hooks);
        hooks.reverse();
        hooks
    }

    /// Drop every hook without running it.
    pub(crate) fn discard(&mut self) {
        self.hooks.clear();
    }

    /// Owners of the pending hooks, in registration order.
    pub(crate) fn services(&self) -> Vec<String> {
        self.hooks.iter().map(|(service, _)| service.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Check if the bag is empty (no disposers registered).
    pub(crate) fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
