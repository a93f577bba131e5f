// SPDX-License-Identifier: MIT OR Apache-2.0
//! Executor registration and tool routing for a tool-serving process.
//!
//! Each process owns its own [`ToolManager`]. The detached tool server and
//! the gateway never share one; they are connected only by the network
//! relay.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod manager;
pub mod placeholder;
pub mod registry;

pub use manager::ToolManager;
pub use placeholder::CatalogToolClient;
pub use registry::{DEVICE_TOOLS, ExecutorRegistry};
