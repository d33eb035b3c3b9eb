// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Filesystem store for policy artifacts.
//!
//! Layout: `<root>/site_<site>/battery_<battery>/<tier>_<season>_<day_type>.policy`.
//! A file at that path is always complete: payloads are written to a hidden
//! temporary file in the same directory, synced, and then linked into place
//! without overwriting. Presence of the file is the only "already computed"
//! marker.

use quartz_types::{Namespace, PolicyKey, QuartzError, QuartzResult, validate_id};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ARTIFACT_EXTENSION: &str = "policy";

/// Outcome of a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// This payload is now the stored artifact.
    Published,
    /// Another writer published first; this payload was discarded.
    AlreadyPresent,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) a store rooted at `root`, failing if it is not writable.
    pub fn open(root: impl Into<PathBuf>) -> QuartzResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        // Probe writability up front rather than at the first publish
        tempfile::Builder::new()
            .prefix(".probe-")
            .tempfile_in(&root)?;
        info!("Policy store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn site_dir(&self, site_id: &str) -> PathBuf {
        self.root.join(format!("site_{site_id}"))
    }

    pub fn namespace_dir(&self, namespace: &Namespace) -> PathBuf {
        self.site_dir(namespace.site_id())
            .join(format!("battery_{}", namespace.battery_id()))
    }

    pub fn ensure_site(&self, site_id: &str) -> QuartzResult<PathBuf> {
        validate_id("site id", site_id)?;
        let dir = self.site_dir(site_id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn ensure_namespace(&self, namespace: &Namespace) -> QuartzResult<PathBuf> {
        let dir = self.namespace_dir(namespace);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn artifact_path(&self, namespace: &Namespace, key: &PolicyKey) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}.{ARTIFACT_EXTENSION}", key.encode()))
    }

    pub fn exists(&self, namespace: &Namespace, key: &PolicyKey) -> bool {
        self.artifact_path(namespace, key).is_file()
    }

    /// Atomically publish `payload` as the artifact for `key`.
    ///
    /// Never replaces an existing artifact: if another writer got there
    /// first, the payload is dropped and `AlreadyPresent` is returned.
    pub fn publish(
        &self,
        namespace: &Namespace,
        key: &PolicyKey,
        payload: &[u8],
    ) -> QuartzResult<PublishOutcome> {
        let dir = self.ensure_namespace(namespace)?;
        let target = self.artifact_path(namespace, key);

        let mut pending = tempfile::Builder::new()
            .prefix(".pending-")
            .suffix(".tmp")
            .tempfile_in(&dir)?;
        pending.write_all(payload)?;
        pending.as_file().sync_all()?;

        match pending.persist_noclobber(&target) {
            Ok(_) => {
                debug!("Published {} ({} bytes)", target.display(), payload.len());
                Ok(PublishOutcome::Published)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Ok(PublishOutcome::AlreadyPresent)
            }
            Err(e) => Err(QuartzError::Io(e.error)),
        }
    }

    /// Remove a published artifact so the next lookup rebuilds it.
    pub fn discard(&self, namespace: &Namespace, key: &PolicyKey) -> QuartzResult<()> {
        match fs::remove_file(self.artifact_path(namespace, key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
