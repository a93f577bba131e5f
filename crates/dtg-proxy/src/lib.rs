// SPDX-License-Identifier: MIT OR Apache-2.0
//! Relay of device tool calls from a detached tool server to the gateway.
//!
//! A process without live device connections restores a saved profile with
//! [`restore_device_tools`]. The resulting [`ProxyExecutor`] answers listing
//! queries from the restored catalog and forwards every invocation to the
//! gateway's tool-call route.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod executor;
pub mod restore;
pub mod target;

pub use executor::{DEFAULT_PROXY_TIMEOUT, ProxyExecutor, map_response, stringify_result};
pub use restore::{RestoreReport, restore_device_tools};
pub use target::{BearerToken, ProxyCredential, RelayTarget, TOOL_CALL_PATH};
