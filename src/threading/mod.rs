//! Synchronized values with pluggable locking.
//!
//! [`SynchronizedValue`] owns the data; a boxed [`LockingMechanism`] owns the
//! locking policy. The two built-in mechanisms are [`ExclusiveLock`] and
//! [`ReadWriteLock`], selectable at runtime through [`LockingStrategy`].

mod locking;
mod synchronized;

pub use locking::{
    //
    Access,
    ExclusiveLock,
    LockingMechanism,
    LockingStrategy,
    MechanismGuard,
    ReadWriteLock,
};
pub use synchronized::SynchronizedValue;
