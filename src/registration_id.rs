use std::fmt;
use uuid::Uuid;

/// Unique identifier of a single messenger registration.
///
/// Handles compare registrations by id rather than by pointer, and the id is
/// what shows up in logs when a registration is added, swept or disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Generate a new unique registration ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for RegistrationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_generate_unique() {
        // ---
        let id1 = RegistrationId::generate();
        let id2 = RegistrationId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_format() {
        // ---
        let id = RegistrationId::generate();
        let s = id.to_string();
        assert_eq!(s.len(), 36); // hyphenated UUID
        assert_eq!(s, id.as_uuid().to_string());
    }
}
