// SPDX-License-Identifier: MIT OR Apache-2.0
//! Library half of the `dtg` CLI.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
pub mod format;
pub mod serve;
