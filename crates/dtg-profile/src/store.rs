// SPDX-License-Identifier: MIT OR Apache-2.0
//! One JSON file per profile in a flat directory.
//!
//! Reads are best-effort: a missing, unreadable, or undecodable profile is
//! reported as an empty catalog, never as an error. A restored catalog is a
//! cache, and a corrupt cache must not keep the tool server from starting.

use crate::fingerprint::{compute_fingerprint, generate_profile_name};
use dtg_core::{ToolCatalog, ToolDescriptor};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of profile files.
pub const PROFILE_EXTENSION: &str = "json";

/// Errors raised while writing a profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The explicit profile name cannot be used as a file stem.
    #[error("invalid profile name '{0}'")]
    InvalidName(String),
    /// The catalog could not be serialized.
    #[error("failed to encode profile: {0}")]
    Encode(#[from] serde_json::Error),
    /// The directory or file could not be written.
    #[error("failed to write profile {path}: {source}")]
    Io {
        /// Target path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// How [`ProfileStore::save`] picks the profile name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode<'a> {
    /// Reuse the name of a profile with the same fingerprint, else generate one.
    Auto,
    /// Write to this name unconditionally.
    Named(&'a str),
}

/// Outcome of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedProfile {
    /// Profile name written.
    pub name: String,
    /// Whether no profile of that name existed before.
    pub created: bool,
}

/// Outcome of a best-effort load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedProfile {
    /// Restored tools; empty when nothing usable was found.
    pub catalog: ToolCatalog,
    /// Profile the catalog came from. `None` when no profile resolved.
    pub name: Option<String>,
}

/// Listing entry with identity details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    /// Profile name.
    pub name: String,
    /// Fingerprint recomputed from the stored catalog.
    pub fingerprint: String,
    /// Number of tools stored.
    pub tool_count: usize,
}

/// Directory of fingerprint-addressed tool profiles.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    /// A store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the profile `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{PROFILE_EXTENSION}"))
    }

    /// Persist `catalog`.
    ///
    /// Empty catalogs are never written and yield `Ok(None)`. With
    /// [`SaveMode::Auto`], repeated saves of the same content land on the
    /// same name and report `created == false` after the first.
    pub fn save(
        &self,
        catalog: &ToolCatalog,
        mode: SaveMode<'_>,
    ) -> Result<Option<SavedProfile>, ProfileError> {
        if catalog.is_empty() {
            return Ok(None);
        }

        let (name, created) = match mode {
            SaveMode::Auto => match self.find_by_fingerprint(&compute_fingerprint(catalog)) {
                Some(existing) => (existing, false),
                None => (generate_profile_name(catalog), true),
            },
            SaveMode::Named(name) => {
                validate_name(name)?;
                (name.to_string(), !self.path_for(name).exists())
            }
        };

        let tools: Vec<&ToolDescriptor> = catalog.iter().collect();
        let bytes = serde_json::to_vec_pretty(&tools)?;
        fs::create_dir_all(&self.dir).map_err(|source| ProfileError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(&name);
        fs::write(&path, bytes).map_err(|source| ProfileError::Io { path, source })?;

        Ok(Some(SavedProfile { name, created }))
    }

    /// Load `name`, or the lexicographically first profile when `None`.
    ///
    /// Non-object entries and objects that are not tool descriptors are
    /// skipped.
    pub fn load(&self, name: Option<&str>) -> LoadedProfile {
        let resolved = match name {
            Some(n) => n.to_string(),
            None => match self.list_profiles().into_iter().next() {
                Some(first) => first,
                None => return LoadedProfile::default(),
            },
        };

        let path = self.path_for(&resolved);
        if !path.is_file() {
            return LoadedProfile::default();
        }

        LoadedProfile {
            catalog: read_catalog(&path).unwrap_or_default(),
            name: Some(resolved),
        }
    }

    /// Every profile name in the directory, sorted.
    pub fn list_profiles(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some(PROFILE_EXTENSION))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// First profile, in name order, whose stored catalog has `fingerprint`.
    pub fn find_by_fingerprint(&self, fingerprint: &str) -> Option<String> {
        self.list_profiles().into_iter().find(|name| {
            read_catalog(&self.path_for(name))
                .is_some_and(|c| !c.is_empty() && compute_fingerprint(&c) == fingerprint)
        })
    }

    /// Name, fingerprint, and size of every profile.
    pub fn summaries(&self) -> Vec<ProfileSummary> {
        self.list_profiles()
            .into_iter()
            .map(|name| {
                let catalog = read_catalog(&self.path_for(&name)).unwrap_or_default();
                ProfileSummary {
                    fingerprint: compute_fingerprint(&catalog),
                    tool_count: catalog.len(),
                    name,
                }
            })
            .collect()
    }
}

/// Auto-save a catalog a device just reported, logging the outcome.
///
/// Failures are logged and swallowed; the live session keeps working
/// whether or not its catalog could be cached.
pub fn save_reported_catalog(store: &ProfileStore, catalog: &ToolCatalog) -> Option<SavedProfile> {
    match store.save(catalog, SaveMode::Auto) {
        Ok(Some(saved)) => {
            if saved.created {
                tracing::info!(target: "dtg.profile", profile = %saved.name, tools = catalog.len(), "saved new tool profile");
            } else {
                tracing::debug!(target: "dtg.profile", profile = %saved.name, tools = catalog.len(), "refreshed existing tool profile");
            }
            Some(saved)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(target: "dtg.profile", error = %e, "failed to save tool profile");
            None
        }
    }
}

fn read_catalog(path: &Path) -> Option<ToolCatalog> {
    let bytes = fs::read(path).ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;
    let Value::Array(items) = value else {
        return Some(ToolCatalog::new());
    };
    Some(
        items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value::<ToolDescriptor>(item).ok())
            .collect(),
    )
}

fn validate_name(name: &str) -> Result<(), ProfileError> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        Err(ProfileError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}
