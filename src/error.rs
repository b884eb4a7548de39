use thiserror::Error;

/// Errors reported by the messenger.
///
/// Subscriber failures are not represented here: a callback that panics
/// unwinds straight out of [`Messenger::send`](crate::Messenger::send) and
/// skips the remaining subscribers for that call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required argument was absent
    #[error("argument must not be null: {name}")]
    ArgumentNull {
        /// Name of the missing argument.
        name: &'static str,
    },
}

impl Error {
    /// Build an [`Error::ArgumentNull`] for the named argument.
    pub fn argument_null(name: &'static str) -> Self {
        Self::ArgumentNull { name }
    }
}

/// Result type alias for messenger operations
pub type Result<T> = std::result::Result<T, Error>;
