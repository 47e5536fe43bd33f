// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use hecnn_fhe::Ciphertext;
use ndarray::Array3;

/// Rank-3 ciphertext tensor in `H x W x C` order, the executor's `T3` slot
/// per spec.md §4.5.
pub type Tensor3 = Array3<Ciphertext>;

/// Rank-1 ciphertext vector, the executor's `T1` slot.
pub type Vector1 = Vec<Ciphertext>;
