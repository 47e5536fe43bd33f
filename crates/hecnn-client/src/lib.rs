// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Client library: connection handling (register/submit/poll), key
//! generation, and the Client Result Subscriber, per spec.md §4.11.

mod connection;
mod keys;
mod subscriber;

pub use connection::{ClientConnection, ClientError};
pub use keys::ClientKeys;
pub use subscriber::{spawn_result_subscriber, ResultCallback, SubscriberHandle};
