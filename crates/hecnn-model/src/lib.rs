// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Wire-level data model and error taxonomy shared by every crate in the
//! privacy-preserving CNN inference service.

mod computation;
mod error;
mod ids;
mod key_bundle;
mod params;
mod query;
mod result;

pub use computation::{ActivationFamily, ComputationParams, OptLevel};
pub use error::{CoreError, CoreResult};
pub use ids::QueryId;
pub use key_bundle::KeyBundle;
pub use params::{EncryptionParameters, HEAD_TAIL_PRIME_BITS, INTERIOR_PRIME_BITS, WEIGHT_ROUND_EPSILON};
pub use query::{Query, QueuedQuery};
pub use result::{QueryResult, ResultStatus};
