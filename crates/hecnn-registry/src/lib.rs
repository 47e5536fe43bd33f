// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Key Registry: thread-safe `key-id -> KeyBundle` mapping, per spec.md
//! §4.6, grounded in
//! `examples/original_source/ppcnn/ppcnn_server/ppcnn_server_keycontainer.cpp`'s
//! `unordered_map<int32_t, EncryptionKeys>`. Registration is idempotent;
//! the registry never deletes entries for the server's lifetime, per
//! spec.md §4.6 and §5's "immutable once registered; safely shared across
//! workers by reference" policy.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use hecnn_model::{CoreError, CoreResult, KeyBundle};
use tracing::info;

#[derive(Clone, Default)]
pub struct KeyRegistry {
    inner: Arc<RwLock<HashMap<i64, Arc<KeyBundle>>>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bundle` under its own `key_id`, replacing any prior entry
    /// under that id. Matches the original's `emplace` (a no-op on an
    /// existing key) except that re-registration with fresh keys is allowed
    /// — clients are expected to pick a stable key-id per key-gen, but
    /// nothing on the wire forbids re-registering under the same id.
    pub fn register(&self, bundle: KeyBundle) {
        let key_id = bundle.key_id;
        self.inner.write().expect("key registry lock poisoned").insert(key_id, Arc::new(bundle));
        info!(key_id, "registered key bundle");
    }

    /// Returns a cheap, shared read-only handle to the bundle registered
    /// under `key_id`, or `UnknownKey` otherwise — spec.md §4.6.
    pub fn get(&self, key_id: i64) -> CoreResult<Arc<KeyBundle>> {
        self.inner
            .read()
            .expect("key registry lock poisoned")
            .get(&key_id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownKey(key_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("key registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecnn_model::EncryptionParameters;

    fn bundle(key_id: i64) -> KeyBundle {
        KeyBundle::new(key_id, EncryptionParameters::standard_profile(8192, 2), vec![1, 2, 3], vec![4, 5, 6])
    }

    #[test]
    fn register_then_get_round_trips() {
        let registry = KeyRegistry::new();
        registry.register(bundle(7));
        let fetched = registry.get(7).unwrap();
        assert_eq!(fetched.key_id, 7);
    }

    #[test]
    fn get_on_unknown_key_id_errors() {
        let registry = KeyRegistry::new();
        assert!(matches!(registry.get(99), Err(CoreError::UnknownKey(_))));
    }

    #[test]
    fn registration_is_idempotent_on_key_id() {
        let registry = KeyRegistry::new();
        registry.register(bundle(1));
        registry.register(bundle(1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_is_cheaply_cloneable_and_shares_state() {
        let registry = KeyRegistry::new();
        let clone = registry.clone();
        registry.register(bundle(3));
        assert!(clone.get(3).is_ok());
    }
}
