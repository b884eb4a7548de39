//! Domain layer public interface.
//!
//! This module defines the registration abstractions shared by the messenger
//! registry and its subscribers, independent of any concrete receiver or
//! message type.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod registration;

// --- Registration domain re-exports ---

pub use registration::{
    //
    MessengerRegistration,
    ReceiverKey,
    RegistrationPtr,
    SubscriptionHandle,
};
