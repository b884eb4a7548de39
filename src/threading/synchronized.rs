// src/threading/synchronized.rs

//! A single value behind a pluggable lock.

use std::cell::UnsafeCell;
use std::fmt;

use super::locking::{Access, LockingMechanism, LockingStrategy};

/// A value of type `T` guarded by a [`LockingMechanism`].
///
/// Every read and write of the value happens while the mechanism is held.
/// Reads take [`Access::Shared`], writes take [`Access::Exclusive`], so a
/// [`ReadWriteLock`](crate::ReadWriteLock) lets readers proceed in parallel
/// while an [`ExclusiveLock`](crate::ExclusiveLock) serializes everything.
///
/// Lock scope is exactly one instance. Holding two values at once (for
/// example reading one from inside another's [`update`](Self::update)) is the
/// caller's responsibility to order consistently.
///
/// # Example
///
/// ```
/// use mom_messenger::{LockingStrategy, SynchronizedValue};
///
/// let counter = SynchronizedValue::with_strategy(0u64, LockingStrategy::ReadWrite);
/// counter.update(|n| n + 1);
/// assert_eq!(counter.get(), 1);
/// ```
pub struct SynchronizedValue<T> {
    // ---
    value: UnsafeCell<T>,
    mechanism: Box<dyn LockingMechanism>,
}

// SAFETY: all access to `value` goes through `mechanism`, whose `unsafe impl`
// promises the exclusion rules of `LockingMechanism`. Exclusive access hands
// out `&mut T` to one thread at a time (needs `T: Send`); shared access may
// hand out `&T` to several threads at once (needs `T: Sync`).
unsafe impl<T: Send + Sync> Sync for SynchronizedValue<T> {}

impl<T> SynchronizedValue<T> {
    /// Create a value guarded by an [`ExclusiveLock`](crate::ExclusiveLock).
    pub fn new(initial: T) -> Self {
        Self::with_strategy(initial, LockingStrategy::Exclusive)
    }

    /// Create a value guarded by one of the built-in mechanisms.
    pub fn with_strategy(initial: T, strategy: LockingStrategy) -> Self {
        Self::with_mechanism(initial, strategy.build())
    }

    /// Create a value guarded by a caller-supplied mechanism.
    ///
    /// Custom mechanisms are written with `unsafe impl LockingMechanism`,
    /// which is where their exclusion guarantee is asserted.
    pub fn with_mechanism(initial: T, mechanism: Box<dyn LockingMechanism>) -> Self {
        Self {
            value: UnsafeCell::new(initial),
            mechanism,
        }
    }

    /// Name of the guarding mechanism.
    pub fn mechanism_name(&self) -> &'static str {
        self.mechanism.name()
    }

    /// Overwrite the value.
    pub fn set(&self, value: T) {
        // The previous value is dropped here, after the lock is released.
        let _previous = self.replace(value);
    }

    /// Overwrite the value and return the previous one.
    pub fn replace(&self, value: T) -> T {
        let _guard = self.mechanism.lock(Access::Exclusive);
        // SAFETY: exclusive access is held.
        unsafe { std::mem::replace(&mut *self.value.get(), value) }
    }

    /// Atomically replace the value with `transform(&current)`.
    ///
    /// Exclusive access is held from before `transform` runs until the result
    /// is stored, so no reader or writer observes anything between the two.
    /// If `transform` panics the value is left unchanged and the lock is
    /// released during unwinding.
    ///
    /// `transform` must not touch `self`; re-entrant acquisition deadlocks.
    pub fn update<F>(&self, transform: F)
    where
        F: FnOnce(&T) -> T,
    {
        let _guard = self.mechanism.lock(Access::Exclusive);
        // SAFETY: exclusive access is held for the rest of this scope.
        let slot = unsafe { &mut *self.value.get() };
        let next = transform(slot);
        *slot = next;
    }

    /// Run `f` with shared access to the value.
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let _guard = self.mechanism.lock(Access::Shared);
        // SAFETY: shared access is held; no `&mut T` can exist concurrently.
        f(unsafe { &*self.value.get() })
    }

    /// Run `f` with exclusive access to the value.
    pub fn with_mut<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.mechanism.lock(Access::Exclusive);
        // SAFETY: exclusive access is held.
        f(unsafe { &mut *self.value.get() })
    }

    /// Mutable access without locking; `&mut self` already proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Consume the container and return the value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Clone> SynchronizedValue<T> {
    /// Return a copy of the value as it was at some instant during the call.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T: Default> Default for SynchronizedValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for SynchronizedValue<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for SynchronizedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|value| {
            f.debug_struct("SynchronizedValue")
                .field("value", value)
                .field("mechanism", &self.mechanism.name())
                .finish()
        })
    }
}
