// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! FHE Capability Interface: the abstract ciphertext-arithmetic contract
//! the rest of the core depends on, concretely backed by Microsoft SEAL's
//! CKKS scheme via `sealy`.

mod capability;
pub mod codec;
mod context;
mod error;
mod keygen;
mod seal_ckks;
mod types;

pub use capability::FheCapability;
pub use context::SchemeContext;
pub use error::{FheError, FheResult};
pub use keygen::{generate_keys, GeneratedKeys};
pub use seal_ckks::SealCkksEngine;
pub use types::{Ciphertext, Plaintext, PublicKey, RelinKey, SecretKey, SecretKeyBytes};
