// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! CLI argument parsing and the client-side config file, per spec.md §6.
//!
//! Split into three small modules rather than one flat file, matching how
//! the teacher keeps its `e3-config` surface separated by concern: server
//! flags, client flags, and (here, since there is no server-side file) the
//! client's `key = value` config file.

mod client;
mod config_file;
mod server;

pub use client::ClientArgs;
pub use config_file::{ClientConfig, ConfigFileError};
pub use server::{ServerArgs, DEFAULT_RESULT_LIFETIME_SEC};
