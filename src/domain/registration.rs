// src/domain/registration.rs

//! Registration domain abstractions.
//!
//! The messenger stores registrations for many receiver and message types in
//! one registry. This module defines the object-safe view of a registration
//! that the registry works with, and the handle given back to subscribers.
//!
//! The concrete, typed registration lives in `src/messenger/registration.rs`.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::{KeepAliveMode, RegistrationId};

/// Identity of a receiver, taken from the address of its `Arc` allocation.
///
/// A weakly held receiver keeps its allocation reserved until the
/// registration drops the `Weak`, so the key cannot be reused by another
/// receiver while the registration is still in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverKey(usize);

impl ReceiverKey {
    /// Key of the receiver behind `receiver`.
    pub fn of<R: ?Sized>(receiver: &Arc<R>) -> Self {
        Self(Arc::as_ptr(receiver) as *const () as usize)
    }
}

/// Type-erased registration as seen by the messenger registry.
///
/// Implementations must make every method callable from any thread, and
/// must never panic from `is_alive`, `targets` or `removed_from_messenger`.
pub trait MessengerRegistration: Send + Sync {
    /// Unique id of this registration.
    fn id(&self) -> RegistrationId;

    /// Exact message type this registration was made for.
    fn message_type(&self) -> TypeId;

    /// Readable name of the message type, for logs.
    fn message_type_name(&self) -> &'static str;

    /// How the receiver is held.
    fn keep_alive(&self) -> KeepAliveMode;

    /// Strong mode: true until removed. Weak mode: true while the receiver
    /// still has another owner.
    fn is_alive(&self) -> bool;

    /// True once the registration has left its messenger.
    fn is_removed(&self) -> bool;

    /// Whether this registration was made for `receiver`.
    fn targets(&self, receiver: ReceiverKey) -> bool;

    /// Deliver `message` if it is of this registration's message type.
    ///
    /// No-op when removed or dead. Panics from the subscriber callback
    /// propagate to the caller.
    fn dispatch(&self, message: &dyn Any);

    /// Hook fired once the messenger has dropped this registration.
    /// Releases the receiver and makes the registration inert. Idempotent.
    fn removed_from_messenger(&self);

    /// Detach from the owning messenger (if it still exists) and become
    /// inert. Idempotent.
    fn dispose(&self);
}

/// Shared pointer to a type-erased registration.
pub type RegistrationPtr = Arc<dyn MessengerRegistration>;

/// Disposable handle returned by [`Messenger::register`](crate::Messenger::register).
///
/// Dropping the handle does **not** unregister; the registration lives until
/// [`dispose`](SubscriptionHandle::dispose), an explicit `unregister`, or (in
/// weak mode) until its receiver is gone and the next registry operation
/// purges it.
#[derive(Clone)]
pub struct SubscriptionHandle {
    // ---
    registration: RegistrationPtr,
}

impl SubscriptionHandle {
    pub(crate) fn new(registration: RegistrationPtr) -> Self {
        Self { registration }
    }

    /// Remove this one registration from its messenger. Idempotent.
    pub fn dispose(&self) {
        self.registration.dispose();
    }

    /// Id of the underlying registration.
    pub fn id(&self) -> RegistrationId {
        self.registration.id()
    }

    /// Whether the registration can still deliver.
    pub fn is_alive(&self) -> bool {
        self.registration.is_alive()
    }

    /// Whether the registration has left its messenger.
    pub fn is_disposed(&self) -> bool {
        self.registration.is_removed()
    }

    /// The underlying registration.
    pub fn registration(&self) -> &RegistrationPtr {
        &self.registration
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.registration.id())
            .field("message_type", &self.registration.message_type_name())
            .field("keep_alive", &self.registration.keep_alive())
            .field("disposed", &self.registration.is_removed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_receiver_key_identity() {
        // ---
        let a = Arc::new(1u8);
        let b = Arc::new(1u8);

        assert_eq!(ReceiverKey::of(&a), ReceiverKey::of(&a.clone()));
        assert_ne!(ReceiverKey::of(&a), ReceiverKey::of(&b));
    }

    #[test]
    fn test_receiver_key_survives_weak_only() {
        // ---
        let a = Arc::new(String::from("receiver"));
        let key = ReceiverKey::of(&a);
        let weak = Arc::downgrade(&a);
        drop(a);

        assert_eq!(ReceiverKey(weak.as_ptr() as *const () as usize), key);
    }
}
