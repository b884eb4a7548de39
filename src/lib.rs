//! Typed in-process messaging with weak subscriber tracking
//!
//! This library provides a [`Messenger`]: an in-process publish/subscribe
//! router keyed by exact message type. Subscribers are held weakly by default,
//! so a dropped receiver quietly stops receiving and its registration is
//! purged by the next registry operation, without any explicit unregister.
//!
//! Alongside it sits [`SynchronizedValue`], a single value guarded by a
//! pluggable [`LockingMechanism`] (exclusive or reader/writer).
//!

// Import all sub modules once...
mod domain;
mod macros;
mod messenger;
mod threading;

mod keep_alive;
mod messenger_config;

mod error;
mod registration_id;

#[allow(unused_imports)]
pub(crate) use macros::{
    // ---
    log_debug,
    log_error,
    log_info,
    log_trace,
};

// Re-export main types
pub use messenger::{Messenger, Registration};

pub use keep_alive::KeepAliveMode;
pub use messenger_config::{CleanupScope, MessengerConfig};

pub use error::{Error, Result};
pub use registration_id::RegistrationId;

// --- public re-exports
pub use domain::{
    //
    MessengerRegistration,
    ReceiverKey,
    RegistrationPtr,
    SubscriptionHandle,
};

pub use threading::{
    //
    Access,
    ExclusiveLock,
    LockingMechanism,
    LockingStrategy,
    MechanismGuard,
    ReadWriteLock,
    SynchronizedValue,
};
