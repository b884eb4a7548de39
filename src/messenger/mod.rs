// src/messenger/mod.rs

//! Typed in-process messenger.
//!
//! Subscribers register a receiver and a callback for one exact message type;
//! senders broadcast a message to every live registration for that type.
//!
//! ## Delivery Semantics
//!
//! - Delivery is synchronous on the sending thread, in registration order.
//! - Matching is by exact `TypeId`; there is no subtype or trait matching.
//! - A subscriber that panics aborts the rest of that `send`. No registry
//!   lock is held while callbacks run, so the messenger stays usable and
//!   callbacks may themselves register, unregister or send.
//! - A registration racing with a `send` for the same type may or may not
//!   receive that message.
//!
//! ## Cleanup
//!
//! Weakly held receivers that have been dropped leave dead registrations
//! behind. These are purged lazily at the start of `register`, `unregister`
//! and `send`; there is no background thread.

mod registration;

pub use registration::Registration;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::RwLock;

#[allow(unused_imports)]
use crate::{
    // ---
    log_debug,
    log_info,
    log_trace,
    CleanupScope,
    Error,
    KeepAliveMode,
    MessengerConfig,
    MessengerRegistration,
    ReceiverKey,
    RegistrationId,
    RegistrationPtr,
    Result,
    SubscriptionHandle,
};

/// Registrations for one message type, in delivery order.
type RegistrationList = RwLock<Vec<RegistrationPtr>>;

/// Registry of typed subscriptions.
///
/// Each message type has its own internally locked collection, so traffic on
/// unrelated types never contends on a shared lock.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use mom_messenger::Messenger;
///
/// struct Ping;
///
/// struct Listener {
///     pings: AtomicUsize,
/// }
///
/// let messenger = Messenger::new();
/// let listener = Arc::new(Listener { pings: AtomicUsize::new(0) });
///
/// let handle = messenger.register(&listener, |l: &Listener, _: &Ping| {
///     l.pings.fetch_add(1, Ordering::SeqCst);
/// });
///
/// messenger.send(&Ping);
/// assert_eq!(listener.pings.load(Ordering::SeqCst), 1);
///
/// handle.dispose();
/// messenger.send(&Ping);
/// assert_eq!(listener.pings.load(Ordering::SeqCst), 1);
/// ```
pub struct Messenger {
    // ---
    config: MessengerConfig,
    registrations: DashMap<TypeId, Arc<RegistrationList>>,
}

/// Process-wide messenger returned by [`Messenger::global`].
static GLOBAL_MESSENGER: OnceLock<Arc<Messenger>> = OnceLock::new();

impl Messenger {
    /// Create an isolated messenger with the default configuration.
    pub fn new() -> Arc<Self> {
        Self::with_config(MessengerConfig::default())
    }

    /// Create an isolated messenger.
    pub fn with_config(config: MessengerConfig) -> Arc<Self> {
        // ---
        log_debug!("{}: create messenger", config.name);

        Arc::new(Self {
            config,
            registrations: DashMap::new(),
        })
    }

    /// Shared process-wide messenger, created on first use.
    ///
    /// Prefer [`Messenger::new`] wherever the messenger can be passed
    /// around explicitly; tests in particular should not share this one.
    pub fn global() -> Arc<Self> {
        GLOBAL_MESSENGER
            .get_or_init(|| Self::with_config(MessengerConfig::named("global")))
            .clone()
    }

    /// Configuration this messenger was built with.
    pub fn config(&self) -> &MessengerConfig {
        &self.config
    }

    /// Register `callback` for messages of type `M` on behalf of `receiver`,
    /// using the configured default [`KeepAliveMode`].
    pub fn register<M, R, F>(self: &Arc<Self>, receiver: &Arc<R>, callback: F) -> SubscriptionHandle
    where
        M: 'static,
        R: Send + Sync + 'static,
        F: Fn(&R, &M) + Send + Sync + 'static,
    {
        self.register_with(receiver, callback, self.config.default_keep_alive)
    }

    /// Register `callback` for messages of type `M` on behalf of `receiver`.
    ///
    /// The registration is appended to the end of `M`'s collection, so it is
    /// delivered to after every earlier registration for `M`.
    pub fn register_with<M, R, F>(
        self: &Arc<Self>,
        receiver: &Arc<R>,
        callback: F,
        keep_alive: KeepAliveMode,
    ) -> SubscriptionHandle
    where
        M: 'static,
        R: Send + Sync + 'static,
        F: Fn(&R, &M) + Send + Sync + 'static,
    {
        // ---
        let list = self.registrations_for::<M>();
        let registration: RegistrationPtr =
            Arc::new(Registration::<R, M>::new(self, receiver, callback, keep_alive));

        log_debug!(
            "{}: register {} for {} ({:?})",
            self.config.name,
            registration.id(),
            registration.message_type_name(),
            keep_alive
        );

        list.write().push(Arc::clone(&registration));
        SubscriptionHandle::new(registration)
    }

    /// Remove every registration made for `receiver`, across all message types.
    pub fn unregister<R>(&self, receiver: &Arc<R>)
    where
        R: ?Sized,
    {
        // ---
        self.sweep(None);

        let key = ReceiverKey::of(receiver);
        let removed = Self::remove_where(self.all_lists(), |r| r.targets(key));

        log_debug!(
            "{}: unregister receiver removed {} registration(s)",
            self.config.name,
            removed.len()
        );
        Self::detach(removed);
    }

    /// Remove the registrations made for `receiver` on message type `M` only.
    pub fn unregister_for<M, R>(&self, receiver: &Arc<R>)
    where
        M: 'static,
        R: ?Sized,
    {
        // ---
        let list = self.registrations_for::<M>();

        let key = ReceiverKey::of(receiver);
        let removed = Self::remove_where(vec![list], |r| r.targets(key));

        log_debug!(
            "{}: unregister receiver from {} removed {} registration(s)",
            self.config.name,
            std::any::type_name::<M>(),
            removed.len()
        );
        Self::detach(removed);
    }

    /// Deliver `message` to every live registration for type `M`.
    ///
    /// Dead registrations are purged first. Callbacks run on the calling
    /// thread in registration order; a panicking callback propagates out of
    /// `send` and the remaining registrations are skipped.
    pub fn send<M>(&self, message: &M)
    where
        M: 'static,
    {
        // ---
        let list = self.registrations_for::<M>();
        let snapshot: Vec<RegistrationPtr> = list.read().clone();

        log_trace!(
            "{}: send {} to {} registration(s)",
            self.config.name,
            std::any::type_name::<M>(),
            snapshot.len()
        );

        let message: &dyn Any = message;
        for registration in &snapshot {
            registration.dispatch(message);
        }
    }

    /// Like [`send`](Self::send), but rejects an absent message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArgumentNull`] for `None`; nothing is dispatched and
    /// no cleanup runs.
    pub fn send_checked<M>(&self, message: Option<&M>) -> Result<()>
    where
        M: 'static,
    {
        let message = message.ok_or_else(|| Error::argument_null("message"))?;
        self.send(message);
        Ok(())
    }

    /// Number of registrations currently stored for message type `M`.
    ///
    /// Dead registrations that have not been purged yet are counted.
    pub fn registration_count<M>(&self) -> usize
    where
        M: 'static,
    {
        let list = self
            .registrations
            .get(&TypeId::of::<M>())
            .map(|entry| Arc::clone(entry.value()));

        list.map_or(0, |list| list.read().len())
    }

    /// Number of registrations stored across all message types.
    pub fn total_registrations(&self) -> usize {
        self.all_lists().iter().map(|list| list.read().len()).sum()
    }

    /// Number of message types that have a collection, including empty ones.
    pub fn message_type_count(&self) -> usize {
        self.registrations.len()
    }

    /// Purge dead registrations across all message types now.
    ///
    /// Returns the number of registrations removed.
    pub fn cleanup(&self) -> usize {
        // ---
        let removed = Self::remove_where(self.all_lists(), |r| !r.is_alive());
        let count = removed.len();

        if count > 0 {
            log_debug!("{}: cleanup removed {count} dead registration(s)", self.config.name);
        }
        Self::detach(removed);
        count
    }

    /// Remove every registration, alive or not.
    pub fn clear(&self) {
        // ---
        let removed = Self::remove_where(self.all_lists(), |_| true);

        log_info!("{}: cleared {} registration(s)", self.config.name, removed.len());
        Self::detach(removed);
    }

    /// Drop one registration by id. Called by [`Registration`] on dispose.
    pub(crate) fn remove_registration(&self, id: RegistrationId) {
        // ---
        let removed = Self::remove_where(self.all_lists(), |r| r.id() == id);
        Self::detach(removed);
    }

    /// Run the opportunistic cleanup pass, then get or create `M`'s collection.
    fn registrations_for<M: 'static>(&self) -> Arc<RegistrationList> {
        // ---
        let message_type = TypeId::of::<M>();
        self.sweep(Some(message_type));

        Arc::clone(self.registrations.entry(message_type).or_default().value())
    }

    /// Opportunistic cleanup, scoped by configuration.
    ///
    /// `message_type` is the type being operated on, if any; it only matters
    /// under [`CleanupScope::SentMessageType`].
    fn sweep(&self, message_type: Option<TypeId>) {
        // ---
        match (self.config.cleanup_scope, message_type) {
            (CleanupScope::SentMessageType, Some(message_type)) => {
                let list = self
                    .registrations
                    .get(&message_type)
                    .map(|entry| Arc::clone(entry.value()));

                if let Some(list) = list {
                    let removed = Self::remove_where(vec![list], |r| !r.is_alive());
                    Self::detach(removed);
                }
            }
            _ => {
                self.cleanup();
            }
        }
    }

    /// Handles to every per-type collection, taken without holding any map
    /// guard afterwards.
    fn all_lists(&self) -> Vec<Arc<RegistrationList>> {
        self.registrations
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Remove matching registrations from each list, locking one list at a time.
    ///
    /// A list is only write-locked when a shared scan finds a match, so a
    /// sweep with nothing to purge never blocks senders of other types.
    fn remove_where<P>(lists: Vec<Arc<RegistrationList>>, predicate: P) -> Vec<RegistrationPtr>
    where
        P: Fn(&dyn MessengerRegistration) -> bool,
    {
        // ---
        let mut removed = Vec::new();

        for list in lists {
            if !list.read().iter().any(|registration| predicate(registration.as_ref())) {
                continue;
            }

            list.write().retain(|registration| {
                if predicate(registration.as_ref()) {
                    removed.push(Arc::clone(registration));
                    false
                } else {
                    true
                }
            });
        }

        removed
    }

    /// Fire the removal hook. Must be called with no list lock held, since
    /// releasing a receiver may run arbitrary `Drop` code.
    fn detach(removed: Vec<RegistrationPtr>) {
        for registration in removed {
            registration.removed_from_messenger();
        }
    }
}

impl fmt::Debug for Messenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("name", &self.config.name)
            .field("message_types", &self.message_type_count())
            .field("registrations", &self.total_registrations())
            .finish()
    }
}
