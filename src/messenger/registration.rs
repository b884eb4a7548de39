// src/messenger/registration.rs

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

#[allow(unused_imports)]
use crate::{
    // ---
    log_debug,
    log_error,
    KeepAliveMode,
    MessengerRegistration,
    ReceiverKey,
    RegistrationId,
};

use super::Messenger;

/// Subscriber callback: receives the resolved receiver and the message.
type Callback<R, M> = Box<dyn Fn(&R, &M) + Send + Sync>;

/// How the registration currently holds its receiver.
enum Target<R> {
    Strong(Arc<R>),
    Weak(Weak<R>),
    Released,
}

impl<R> Target<R> {
    fn resolve(&self) -> Option<Arc<R>> {
        match self {
            Target::Strong(receiver) => Some(Arc::clone(receiver)),
            Target::Weak(receiver) => receiver.upgrade(),
            Target::Released => None,
        }
    }

    fn is_alive(&self) -> bool {
        match self {
            Target::Strong(_) => true,
            Target::Weak(receiver) => receiver.strong_count() > 0,
            Target::Released => false,
        }
    }
}

/// One receiver's subscription to message type `M`.
///
/// Created by [`Messenger::register`] and stored type-erased as a
/// [`MessengerRegistration`]. The callback gets the receiver passed in, so it
/// never has to capture it; capturing a clone of the receiver's `Arc` in the
/// callback would silently turn a weak registration into a strong one.
///
/// Only the messenger constructs registrations, so every one of them is in
/// its owner's registry until removed:
///
/// ```compile_fail
/// use std::sync::Arc;
/// use mom_messenger::{KeepAliveMode, Messenger, Registration};
///
/// let messenger = Messenger::new();
/// let receiver = Arc::new(());
/// let _detached = Registration::new(&messenger, &receiver, |_: &(), _: &u8| {}, KeepAliveMode::KeepAlive);
/// ```
pub struct Registration<R, M> {
    // ---
    id: RegistrationId,
    owner: Weak<Messenger>,
    receiver: ReceiverKey,
    keep_alive: KeepAliveMode,
    target: Mutex<Target<R>>,
    callback: Callback<R, M>,
    removed: AtomicBool,
}

impl<R, M> Registration<R, M>
where
    R: Send + Sync + 'static,
    M: 'static,
{
    /// Bind `receiver` and `callback` for messages of type `M`.
    ///
    /// [`KeepAliveMode::NotKeepAlive`] keeps only a `Weak` to the receiver;
    /// [`KeepAliveMode::KeepAlive`] keeps an `Arc`, which the registration
    /// holds until it is removed from `owner`. The caller inserts the result
    /// into `owner`'s registry.
    pub(crate) fn new<F>(
        owner: &Arc<Messenger>,
        receiver: &Arc<R>,
        callback: F,
        keep_alive: KeepAliveMode,
    ) -> Self
    where
        F: Fn(&R, &M) + Send + Sync + 'static,
    {
        let target = match keep_alive {
            KeepAliveMode::KeepAlive => Target::Strong(Arc::clone(receiver)),
            KeepAliveMode::NotKeepAlive => Target::Weak(Arc::downgrade(receiver)),
        };

        Self {
            id: RegistrationId::generate(),
            owner: Arc::downgrade(owner),
            receiver: ReceiverKey::of(receiver),
            keep_alive,
            target: Mutex::new(target),
            callback: Box::new(callback),
            removed: AtomicBool::new(false),
        }
    }

    /// Invoke the callback with `message`.
    ///
    /// Does nothing once removed or when the weakly held receiver is gone.
    /// The receiver is held strongly for the duration of the call.
    pub fn execute(&self, message: &M) {
        // ---
        if self.removed.load(Ordering::Acquire) {
            return;
        }

        let receiver = self.target.lock().resolve();
        if let Some(receiver) = receiver {
            (self.callback)(&receiver, message);
        }
    }
}

impl<R, M> MessengerRegistration for Registration<R, M>
where
    R: Send + Sync + 'static,
    M: 'static,
{
    fn id(&self) -> RegistrationId {
        self.id
    }

    fn message_type(&self) -> TypeId {
        TypeId::of::<M>()
    }

    fn message_type_name(&self) -> &'static str {
        type_name::<M>()
    }

    fn keep_alive(&self) -> KeepAliveMode {
        self.keep_alive
    }

    fn is_alive(&self) -> bool {
        !self.removed.load(Ordering::Acquire) && self.target.lock().is_alive()
    }

    fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    fn targets(&self, receiver: ReceiverKey) -> bool {
        self.receiver == receiver
    }

    fn dispatch(&self, message: &dyn Any) {
        // ---
        match message.downcast_ref::<M>() {
            Some(message) => self.execute(message),
            None => {
                log_error!(
                    "registration {} for {} was handed a message of another type",
                    self.id,
                    type_name::<M>()
                );
            }
        }
    }

    fn removed_from_messenger(&self) {
        // ---
        if self.removed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Take the target out first so the receiver (and anything its Drop
        // does) is released without the target lock held.
        let released = std::mem::replace(&mut *self.target.lock(), Target::Released);
        drop(released);

        log_debug!("registration {} for {} removed", self.id, type_name::<M>());
    }

    fn dispose(&self) {
        // ---
        if let Some(owner) = self.owner.upgrade() {
            owner.remove_registration(self.id);
        }
        self.removed_from_messenger();
    }
}

impl<R, M> fmt::Debug for Registration<R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("message_type", &type_name::<M>())
            .field("receiver_type", &type_name::<R>())
            .field("keep_alive", &self.keep_alive)
            .field("removed", &self.removed.load(Ordering::Acquire))
            .finish()
    }
}
