use std::{
    collections::HashSet,
    sync::{Mutex, OnceLock, PoisonError},
};

/// Tracks which engine runtimes have been initialized in this process.
///
/// Engines often rely on process-global state that must be set up exactly
/// once before the first engine starts, no matter how many instances start
/// concurrently. Initialization runs under the registry lock, so callers
/// racing on the same runtime wait for the first to finish. A failed
/// initialization is not recorded and will be retried by the next caller.
#[derive(Debug, Default)]
pub struct Runtime {
    initialized: Mutex<HashSet<&'static str>>,
}

impl Runtime {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide runtime registry.
    pub fn global() -> &'static Runtime {
        static GLOBAL: OnceLock<Runtime> = OnceLock::new();
        GLOBAL.get_or_init(Runtime::new)
    }

    /// Runs `init` unless runtime `id` is already initialized.
    ///
    /// Returns `Ok(true)` if `init` ran and succeeded, `Ok(false)` if the
    /// runtime was already initialized.
    ///
    /// # Errors
    ///
    /// Returns the error from `init`, leaving the runtime uninitialized.
    pub fn ensure<E>(
        &self,
        id: &'static str,
        init: impl FnOnce() -> Result<(), E>,
    ) -> Result<bool, E> {
        let mut initialized = self
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if initialized.contains(id) {
            return Ok(false);
        }

        init()?;
        initialized.insert(id);
        tracing::info!(runtime = id, "initialized engine runtime");
        Ok(true)
    }

    #[must_use]
    pub fn is_initialized(&self, id: &str) -> bool {
        self.initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Forgets that runtime `id` was initialized, returning whether it was.
    pub fn teardown(&self, id: &str) -> bool {
        self.initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    #[test]
    fn initializes_once_across_threads() {
        let runtime = Arc::new(Runtime::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let runtime = Arc::clone(&runtime);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    runtime
                        .ensure("engine", || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, std::io::Error>(())
                        })
                        .unwrap()
                })
            })
            .collect();

        let ran: usize = handles
            .into_iter()
            .map(|handle| usize::from(handle.join().unwrap()))
            .sum();

        assert_eq!(ran, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(runtime.is_initialized("engine"));
    }

    #[test]
    fn failed_initialization_is_retried() {
        let runtime = Runtime::new();

        let first = runtime.ensure("engine", || Err("library missing"));
        assert_eq!(first, Err("library missing"));
        assert!(!runtime.is_initialized("engine"));

        assert_eq!(runtime.ensure("engine", || Ok::<_, &str>(())), Ok(true));
        assert_eq!(runtime.ensure("engine", || Err("not called")), Ok(false));
    }

    #[test]
    fn runtimes_are_independent() {
        let runtime = Runtime::new();
        runtime.ensure("a", || Ok::<_, ()>(())).unwrap();

        assert!(!runtime.is_initialized("b"));
        assert!(runtime.teardown("a"));
        assert!(!runtime.teardown("a"));
        assert!(!runtime.is_initialized("a"));
    }
}
