//! Receiver retention policy.
//!
//! Decides whether a [`Messenger`](crate::Messenger) registration holds its
//! receiver strongly or only weakly.

/// How a registration holds on to its receiver.
///
/// - [`NotKeepAlive`](KeepAliveMode::NotKeepAlive): a `Weak` reference. Once
///   every other owner drops the receiver, the registration is dead and is
///   purged by the next registry operation.
/// - [`KeepAlive`](KeepAliveMode::KeepAlive): a strong `Arc`. The receiver
///   lives at least as long as the registration, so callers must unregister
///   or dispose explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeepAliveMode {
    /// Weak receiver reference. The default.
    #[default]
    NotKeepAlive,

    /// Strong receiver reference.
    KeepAlive,
}

impl KeepAliveMode {
    /// Whether this mode extends the receiver's lifetime.
    pub fn is_strong(self) -> bool {
        matches!(self, KeepAliveMode::KeepAlive)
    }
}
