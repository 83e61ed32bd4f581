//! Scoped ownership of an instance's working directory and engine.
//!
//! | Variant | Created by | Released as |
//! |---------|-----------|-------------|
//! | [`Supplied`](WorkDir::Supplied) | Caller path | Private run directory removed, caller path kept |
//! | [`Temporary`](WorkDir::Temporary) | Auto-generated | Whole directory removed |
//!
//! Release happens exactly once, either through [`Resources::release`] or on
//! drop, and always attempts directory removal even when engine shutdown
//! fails.

use std::path::{Path, PathBuf};

use cosim_core::Engine;

use crate::Error;

/// A working directory owned by one instance.
#[derive(Debug)]
pub enum WorkDir {
    /// A private run directory inside a caller-supplied path.
    Supplied {
        root: PathBuf,
        run: tempfile::TempDir,
    },

    /// An auto-generated temporary directory.
    Temporary(tempfile::TempDir),
}

impl WorkDir {
    /// Creates a private run directory inside `root`, creating `root` if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkingDirectory`] if either directory cannot be
    /// created.
    pub fn supplied(root: &Path, instance_name: &str) -> Result<Self, Error> {
        let io_error = |source| Error::WorkingDirectory {
            path: root.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(root).map_err(io_error)?;
        let run = tempfile::Builder::new()
            .prefix(&format!("{}-", sanitize(instance_name)))
            .tempdir_in(root)
            .map_err(io_error)?;
        Ok(Self::Supplied {
            root: root.to_path_buf(),
            run,
        })
    }

    /// Creates a temporary directory in the system's temp location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkingDirectory`] if the directory cannot be created.
    pub fn temporary(instance_name: &str) -> Result<Self, Error> {
        tempfile::Builder::new()
            .prefix(&format!("cosim-{}-", sanitize(instance_name)))
            .tempdir()
            .map(Self::Temporary)
            .map_err(|source| Error::WorkingDirectory {
                path: std::env::temp_dir(),
                source,
            })
    }

    /// Returns the directory the engine works in.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Supplied { run, .. } => run.path(),
            Self::Temporary(dir) => dir.path(),
        }
    }

    fn close(self) -> std::io::Result<()> {
        match self {
            Self::Supplied { run, .. } => run.close(),
            Self::Temporary(dir) => dir.close(),
        }
    }
}

/// What a call to [`Resources::release`] actually released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Released {
    pub engine: bool,
    pub working_dir: bool,
}

/// The working directory and engine of one instance.
#[derive(Debug)]
pub(crate) struct Resources<E: Engine> {
    workdir: Option<WorkDir>,
    engine: Option<E>,
}

impl<E: Engine> Resources<E> {
    pub(crate) fn new(workdir: WorkDir) -> Self {
        Self {
            workdir: Some(workdir),
            engine: None,
        }
    }

    pub(crate) fn working_dir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(WorkDir::path)
    }

    /// Takes ownership of the engine so it is shut down on release.
    pub(crate) fn attach_engine(&mut self, engine: E) {
        self.engine = Some(engine);
    }

    pub(crate) fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    /// Shuts down the engine and removes the working directory.
    ///
    /// Failures are logged, never returned, and a failed engine shutdown does
    /// not prevent directory removal. Later calls release nothing.
    pub(crate) fn release(&mut self) -> Released {
        let mut released = Released::default();

        if let Some(mut engine) = self.engine.take() {
            if let Err(err) = engine.terminate() {
                let err = Error::engine_shutdown(err);
                tracing::warn!(error = %err, "engine shutdown failed");
            }
            crate::messages::forward(&mut engine);
            released.engine = true;
        }

        if let Some(dir) = self.workdir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => tracing::debug!(path = %path.display(), "removed working directory"),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "cannot remove working directory");
                }
            }
            released.working_dir = true;
        }

        released
    }
}

impl<E: Engine> Drop for Resources<E> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Replaces characters that do not belong in a directory name.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "instance".to_string()
    } else {
        cleaned
    }
}
