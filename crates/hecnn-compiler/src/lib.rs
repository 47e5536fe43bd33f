// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Network Compiler: parses a topology descriptor, reads trained weights,
//! applies the optimization plan (fusion, coefficient/pooling folding,
//! weight rounding), and emits an ordered operator list, per spec.md §4.4.

pub mod builders;
pub mod plan;
pub mod state;
pub mod topology;
pub mod weights;

pub use plan::{compile, NetworkPlan};
pub use state::{CompileOptions, CompileState};
pub use topology::{LayerConfig, LayerEntry, TopologyDescriptor};
pub use weights::{WeightsIndex, WeightsStore};
