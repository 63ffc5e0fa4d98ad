//! Binding generation error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error raised while writing binding output.
#[derive(Debug, Error)]
pub enum BindingError {
    /// An output sink could not be created, written or persisted.
    #[error("failed to write `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A declaration arrived after the emitter was closed.
    #[error("binding output for `{class_name}` is already closed")]
    Closed { class_name: String },
}

impl BindingError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> BindingError {
        let path = path.into();
        move |source| BindingError::Io { path, source }
    }
}

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, BindingError>;
