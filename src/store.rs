//! Holder for the most recently computed ranking.
//!
//! The store is an owned value handed to whoever needs the "current result"
//! (export, re-filtering). Publishing replaces the previous result; there is no
//! history. For the command-line host the slot is also persisted as a JSON
//! snapshot so a later `export` invocation can pick it up.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
    sync::{Arc, RwLock},
};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    filter::{RegionFilter, filter},
    ranking::RankedResult,
};

#[derive(Debug, Default)]
pub struct ResultStore {
    slot: RwLock<Option<Arc<RankedResult>>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    computed_at: DateTime<Utc>,
    result: RankedResult,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current result; last writer wins.
    pub fn publish(&self, result: RankedResult) -> Arc<RankedResult> {
        let shared = Arc::new(result);
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(Arc::clone(&shared));
        debug!("Published ranking with {} row(s)", shared.len());
        shared
    }

    pub fn current(&self) -> Option<Arc<RankedResult>> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Filters the current result, or `None` when nothing has been ranked yet.
    pub fn filtered(&self, constraints: &RegionFilter) -> Option<RankedResult> {
        self.current().map(|result| filter(&result, constraints))
    }

    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// Writes the current result to `path` as JSON. Fails when the store is empty.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let current = self
            .current()
            .ok_or_else(|| anyhow!("No ranking has been computed yet"))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating snapshot directory {parent:?}"))?;
        }
        let snapshot = Snapshot {
            computed_at: Utc::now(),
            result: current.as_ref().clone(),
        };
        let file = File::create(path).with_context(|| format!("Creating snapshot {path:?}"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &snapshot)
            .with_context(|| format!("Writing snapshot {path:?}"))?;
        debug!("Saved ranking snapshot to {path:?}");
        Ok(())
    }

    /// Loads a snapshot written by [`ResultStore::save_snapshot`]. A missing file yields an empty store.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let store = Self::new();
        if !path.exists() {
            return Ok(store);
        }
        let file = File::open(path).with_context(|| format!("Opening snapshot {path:?}"))?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing snapshot {path:?}"))?;
        debug!(
            "Loaded ranking computed at {} from {path:?}",
            snapshot.computed_at.to_rfc3339()
        );
        store.publish(snapshot.result);
        Ok(store)
    }
}
