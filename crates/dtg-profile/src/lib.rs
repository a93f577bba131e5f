// SPDX-License-Identifier: MIT OR Apache-2.0
//! Content-fingerprinted persistence of device tool catalogs.
//!
//! A device does not carry a durable identifier the gateway can key on, so
//! a catalog is identified by what it contains: two devices that report the
//! same tool names with the same input schemas share one profile.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fingerprint;
pub mod store;

pub use fingerprint::{
    FINGERPRINT_LEN, canonicalize_schema, compute_fingerprint, generate_profile_name,
};
pub use store::{
    LoadedProfile, PROFILE_EXTENSION, ProfileError, ProfileStore, ProfileSummary, SaveMode,
    SavedProfile, save_reported_catalog,
};
