// src/threading/locking.rs

//! Pluggable locking mechanisms.
//!
//! A [`LockingMechanism`] decides *how* a [`SynchronizedValue`] is protected,
//! while the value itself decides *what* is protected. Mechanisms wrap a raw
//! `parking_lot` primitive and never hand that primitive out.
//!
//! Callers normally go through [`lock`](trait.LockingMechanism.html#method.lock),
//! which returns a [`MechanismGuard`] that releases on drop.
//!
//! [`SynchronizedValue`]: crate::SynchronizedValue

use std::fmt;

use parking_lot::lock_api::{RawMutex as RawMutexApi, RawRwLock as RawRwLockApi};
use parking_lot::{RawMutex, RawRwLock};

/// Access requested from a [`LockingMechanism`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Intent to only read the protected value.
    Shared,

    /// Intent to mutate the protected value.
    Exclusive,
}

/// Mutual-exclusion strategy guarding a [`SynchronizedValue`](crate::SynchronizedValue).
///
/// `acquire` blocks the calling thread until the requested access is granted;
/// there is no failure path and no timeout. Acquiring again on a thread that
/// already holds the mechanism is not supported and may deadlock.
///
/// # Safety
///
/// [`SynchronizedValue`](crate::SynchronizedValue) hands out `&mut T` and `&T`
/// based solely on what `acquire` grants, so implementors must guarantee:
///
/// - while `acquire(Access::Exclusive)` is held, no other holder of any
///   access mode exists;
/// - while `acquire(Access::Shared)` is held, no exclusive holder exists.
///
/// Granting `Shared` exclusively is allowed. A mechanism that returns from
/// `acquire` without excluding other threads is unsound.
///
/// ```compile_fail
/// use mom_messenger::{Access, LockingMechanism};
///
/// struct NoLock;
///
/// impl LockingMechanism for NoLock {
///     fn acquire(&self, _: Access) {}
///     unsafe fn release(&self, _: Access) {}
///     fn name(&self) -> &'static str { "none" }
/// }
/// ```
pub unsafe trait LockingMechanism: Send + Sync {
    /// Block until `access` is granted.
    fn acquire(&self, access: Access);

    /// Give back access obtained from [`acquire`](LockingMechanism::acquire).
    ///
    /// # Safety
    ///
    /// The caller must hold the mechanism through a prior `acquire` with the
    /// same `access`, and must call `release` exactly once for it.
    unsafe fn release(&self, access: Access);

    /// Short name of the mechanism, used in `Debug` output and logs.
    fn name(&self) -> &'static str;
}

impl dyn LockingMechanism {
    /// Acquire `access` and return a guard that releases it on drop.
    pub fn lock(&self, access: Access) -> MechanismGuard<'_> {
        // ---
        self.acquire(access);
        MechanismGuard {
            mechanism: self,
            access,
        }
    }
}

impl fmt::Debug for dyn LockingMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Proof of a held [`LockingMechanism`]; releases on drop.
#[must_use = "dropping the guard releases the lock immediately"]
pub struct MechanismGuard<'a> {
    mechanism: &'a dyn LockingMechanism,
    access: Access,
}

impl MechanismGuard<'_> {
    /// Access mode this guard holds.
    pub fn access(&self) -> Access {
        self.access
    }
}

impl Drop for MechanismGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: a guard only exists after a successful `acquire` with
        // `self.access`, and is dropped exactly once.
        unsafe { self.mechanism.release(self.access) }
    }
}

impl fmt::Debug for MechanismGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MechanismGuard")
            .field("mechanism", &self.mechanism.name())
            .field("access", &self.access)
            .finish()
    }
}

/// Plain exclusive lock. Shared and exclusive access are both exclusive.
pub struct ExclusiveLock {
    raw: RawMutex,
}

impl ExclusiveLock {
    /// Create an unlocked exclusive lock.
    pub const fn new() -> Self {
        Self {
            raw: <RawMutex as RawMutexApi>::INIT,
        }
    }
}

impl Default for ExclusiveLock {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: every access mode takes the one raw mutex.
unsafe impl LockingMechanism for ExclusiveLock {
    fn acquire(&self, _access: Access) {
        self.raw.lock();
    }

    unsafe fn release(&self, _access: Access) {
        // SAFETY: forwarded from the caller's contract.
        unsafe { self.raw.unlock() }
    }

    fn name(&self) -> &'static str {
        "exclusive"
    }
}

impl fmt::Debug for ExclusiveLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveLock").finish_non_exhaustive()
    }
}

/// Reader/writer lock: any number of shared holders, or one exclusive holder.
pub struct ReadWriteLock {
    raw: RawRwLock,
}

impl ReadWriteLock {
    /// Create an unlocked reader/writer lock.
    pub const fn new() -> Self {
        Self {
            raw: <RawRwLock as RawRwLockApi>::INIT,
        }
    }
}

impl Default for ReadWriteLock {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: `RawRwLock` admits many shared holders or one exclusive holder.
unsafe impl LockingMechanism for ReadWriteLock {
    fn acquire(&self, access: Access) {
        match access {
            Access::Shared => self.raw.lock_shared(),
            Access::Exclusive => self.raw.lock_exclusive(),
        }
    }

    unsafe fn release(&self, access: Access) {
        // SAFETY: forwarded from the caller's contract.
        unsafe {
            match access {
                Access::Shared => self.raw.unlock_shared(),
                Access::Exclusive => self.raw.unlock_exclusive(),
            }
        }
    }

    fn name(&self) -> &'static str {
        "read-write"
    }
}

impl fmt::Debug for ReadWriteLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadWriteLock").finish_non_exhaustive()
    }
}

/// Selector for the built-in mechanisms, for use in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockingStrategy {
    /// [`ExclusiveLock`]. The default.
    #[default]
    Exclusive,

    /// [`ReadWriteLock`].
    ReadWrite,
}

impl LockingStrategy {
    /// Build a fresh mechanism of this kind.
    pub fn build(self) -> Box<dyn LockingMechanism> {
        match self {
            LockingStrategy::Exclusive => Box::new(ExclusiveLock::new()),
            LockingStrategy::ReadWrite => Box::new(ReadWriteLock::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::{Duration, Instant};

    fn shared_holders_overlap(mechanism: Arc<dyn LockingMechanism>) -> bool {
        // ---
        // Each thread takes shared access, then waits (bounded) for the other
        // thread to also be inside. Overlap is only possible with a real
        // shared mode.
        let inside = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..2)
            .map(|_| {
                let mechanism = mechanism.clone();
                let inside = inside.clone();
                thread::spawn(move || {
                    let _guard = mechanism.lock(Access::Shared);
                    inside.fetch_add(1, Ordering::SeqCst);

                    let deadline = Instant::now() + Duration::from_millis(500);
                    while inside.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
                        thread::sleep(Duration::from_millis(5));
                    }
                    inside.load(Ordering::SeqCst) == 2
                })
            })
            .collect();

        workers
            .into_iter()
            .map(|w| w.join().expect("worker panicked"))
            .all(|saw_both| saw_both)
    }

    #[test]
    fn test_read_write_admits_concurrent_readers() {
        // ---
        assert!(shared_holders_overlap(Arc::new(ReadWriteLock::new())));
    }

    #[test]
    fn test_exclusive_serializes_readers() {
        // ---
        assert!(!shared_holders_overlap(Arc::new(ExclusiveLock::new())));
    }

    #[test]
    fn test_exclusive_access_blocks_second_acquirer() {
        // ---
        for strategy in [LockingStrategy::Exclusive, LockingStrategy::ReadWrite] {
            let mechanism: Arc<dyn LockingMechanism> = Arc::from(strategy.build());
            let done = Arc::new(AtomicBool::new(false));
            let (locked_tx, locked_rx) = mpsc::channel();

            let holder = {
                let mechanism = mechanism.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let _guard = mechanism.lock(Access::Exclusive);
                    locked_tx.send(()).expect("send");
                    thread::sleep(Duration::from_millis(100));
                    done.store(true, Ordering::SeqCst);
                })
            };

            locked_rx.recv().expect("holder never locked");
            let guard = mechanism.lock(Access::Shared);
            assert!(done.load(Ordering::SeqCst), "{} let a reader in", mechanism.name());
            assert_eq!(guard.access(), Access::Shared);
            drop(guard);

            holder.join().expect("holder panicked");
        }
    }

    #[test]
    fn test_guard_releases_on_unwind() {
        // ---
        let mechanism: Arc<dyn LockingMechanism> = Arc::new(ExclusiveLock::new());

        let m = mechanism.clone();
        let result = thread::spawn(move || {
            let _guard = m.lock(Access::Exclusive);
            panic!("boom");
        })
        .join();
        assert!(result.is_err());

        // Would block forever if the guard had leaked the lock.
        let _guard = mechanism.lock(Access::Exclusive);
    }

    #[test]
    fn test_strategy_names() {
        // ---
        assert_eq!(LockingStrategy::default(), LockingStrategy::Exclusive);
        assert_eq!(LockingStrategy::Exclusive.build().name(), "exclusive");
        assert_eq!(LockingStrategy::ReadWrite.build().name(), "read-write");
        assert_eq!(format!("{:?}", LockingStrategy::ReadWrite.build()), "read-write");
    }
}
