//! Display name generation and persistence.
//!
//! Peers identify each other by a display name rather than the transport's
//! opaque identifier. When no name has been chosen yet, one is generated
//! from an adjective + noun + number template (`SwiftOtter42`).
//!
//! Generation is not auto-persisted: until `set` is called, repeated
//! `get_or_create` calls may return different names. This matches the
//! browser-local-storage heritage of the feature (one generated name per
//! page load) and is expected, not a bug.

use rand::Rng;

use crate::storage::KeyValueStore;

/// Storage key for the persisted display name.
const IDENTITY_KEY: &str = "username";

/// Fallback when a user submits an empty name.
pub const FALLBACK_NAME: &str = "Anonymous";

/// Adjectives for generated display names.
pub const ADJECTIVES: [&str; 24] = [
    "Happy", "Clever", "Quick", "Bright", "Snappy", "Swift", "Keen", "Smart", "Bold", "Mighty",
    "Epic", "Brave", "Cool", "Calm", "Witty", "Sleek", "Wild", "Free", "Strong", "Jolly",
    "Spirited", "Curious", "Agile", "Vivid",
];

/// Nouns for generated display names.
pub const NOUNS: [&str; 24] = [
    "Phoenix", "Dragon", "Eagle", "Tiger", "Panda", "Shark", "Falcon", "Lynx", "Otter", "Raven",
    "Owl", "Fox", "Wolf", "Bear", "Lion", "Cheetah", "Penguin", "Whale", "Dolphin", "Angel",
    "Comet", "Storm", "Wave", "Flame",
];

/// Generate a display name: one adjective, one noun, and a number in
/// `[0, 999)`.
pub fn generate_display_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    let number = rng.gen_range(0..999);
    format!("{adjective}{noun}{number}")
}

/// Manages the user's persisted display name.
#[derive(Debug)]
pub struct IdentityManager<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> IdentityManager<S> {
    /// Create an identity manager over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The persisted display name, if one has been set.
    pub fn stored(&self) -> Option<String> {
        self.store.get(IDENTITY_KEY)
    }

    /// Return the persisted display name, generating a fresh one if absent.
    ///
    /// The generated name is not persisted; call [`set`](Self::set) to keep
    /// it. Two calls without an intervening `set` may return different
    /// names.
    pub fn get_or_create(&self) -> String {
        self.stored()
            .unwrap_or_else(|| generate_display_name(&mut rand::thread_rng()))
    }

    /// Persist a display name, falling back to [`FALLBACK_NAME`] when the
    /// trimmed input is empty. Returns the effective name.
    ///
    /// Persistence failures are logged and swallowed; the returned name is
    /// still effective for the current session.
    pub fn set(&mut self, name: &str) -> String {
        let trimmed = name.trim();
        let effective = if trimmed.is_empty() {
            FALLBACK_NAME.to_string()
        } else {
            trimmed.to_string()
        };
        if let Err(e) = self.store.set(IDENTITY_KEY, &effective) {
            tracing::warn!("failed to persist display name: {e}");
        }
        effective
    }
}
