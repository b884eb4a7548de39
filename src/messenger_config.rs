//! Messenger configuration.
//!
//! Options fixed at [`Messenger`](crate::Messenger) construction time.

use crate::KeepAliveMode;

/// Which registrations an opportunistic cleanup pass inspects.
///
/// Every `register`, `unregister`, `unregister_for` and `send` starts with a
/// sweep that removes dead registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupScope {
    /// Sweep the collections of every message type. The default.
    #[default]
    AllMessageTypes,

    /// Sweep only the collection of the message type being operated on.
    ///
    /// Dead registrations for other types linger until an operation on
    /// their own type, or until [`Messenger::cleanup`](crate::Messenger::cleanup).
    SentMessageType,
}

/// Messenger configuration.
///
/// # Example
///
/// ```
/// use mom_messenger::{CleanupScope, KeepAliveMode, MessengerConfig};
///
/// let config = MessengerConfig::named("ui")
///     .with_default_keep_alive(KeepAliveMode::KeepAlive)
///     .with_cleanup_scope(CleanupScope::SentMessageType);
///
/// assert_eq!(config.name, "ui");
/// ```
#[derive(Debug, Clone)]
pub struct MessengerConfig {
    // ---
    /// Name used to tag log output from this messenger.
    pub name: String,

    /// Keep-alive mode used by [`Messenger::register`](crate::Messenger::register).
    ///
    /// Default: [`KeepAliveMode::NotKeepAlive`]
    pub default_keep_alive: KeepAliveMode,

    /// Reach of the opportunistic cleanup pass.
    ///
    /// Default: [`CleanupScope::AllMessageTypes`]
    pub cleanup_scope: CleanupScope,
}

impl MessengerConfig {
    /// Create a default configuration with the given log name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_keep_alive: KeepAliveMode::default(),
            cleanup_scope: CleanupScope::default(),
        }
    }

    /// Set the keep-alive mode used when none is given explicitly.
    pub fn with_default_keep_alive(mut self, mode: KeepAliveMode) -> Self {
        self.default_keep_alive = mode;
        self
    }

    /// Set the reach of the opportunistic cleanup pass.
    pub fn with_cleanup_scope(mut self, scope: CleanupScope) -> Self {
        self.cleanup_scope = scope;
        self
    }
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self::named("messenger")
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_defaults() {
        // ---
        let config = MessengerConfig::default();
        assert_eq!(config.name, "messenger");
        assert_eq!(config.default_keep_alive, KeepAliveMode::NotKeepAlive);
        assert_eq!(config.cleanup_scope, CleanupScope::AllMessageTypes);
    }

    #[test]
    fn test_builder_overrides() {
        // ---
        let config = MessengerConfig::named("bus")
            .with_default_keep_alive(KeepAliveMode::KeepAlive)
            .with_cleanup_scope(CleanupScope::SentMessageType);

        assert_eq!(config.name, "bus");
        assert!(config.default_keep_alive.is_strong());
        assert_eq!(config.cleanup_scope, CleanupScope::SentMessageType);
    }
}
