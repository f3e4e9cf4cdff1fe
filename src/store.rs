//! Design Persistence Store
//!
//! The whole collection lives as one JSON array under one key of a
//! key-value blob store. Every mutation rewrites the full array in a single
//! `set`; the last writer wins.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::catalog::{BodyPart, TattooStyle};
use crate::compositor::ImageRef;
use crate::config::{EngineConfig, DEFAULT_STORAGE_KEY};
use crate::transform::TransformModel;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Invalid storage key {0:?}: only ASCII letters, digits, '-' and '_' are allowed")]
    InvalidKey(String),
}

/// Durable key-value medium holding whole serialized values.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`. Must be all-or-nothing.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process blob store with failure injection.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("read failure".into()));
        }
        let blobs = self.blobs.lock().map_err(|_| StoreError::Backend("lock poisoned".into()))?;
        Ok(blobs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write failure".into()));
        }
        let mut blobs = self.blobs.lock().map_err(|_| StoreError::Backend("lock poisoned".into()))?;
        blobs.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Open (and create if needed) the storage directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Keys map one-to-one onto file names, so anything outside
    /// `[A-Za-z0-9_-]` is rejected rather than rewritten.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read blob");
                Err(StoreError::Io(e))
            }
        }
    }

    /// Written to a temp file first, then renamed over the target.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, value.as_bytes()).map_err(|e| {
            error!(path = %temp_path.display(), error = %e, "Failed to write temp file");
            StoreError::Io(e)
        })?;

        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            error!(
                from = %temp_path.display(),
                to = %path.display(),
                error = %e,
                "Failed to rename temp file to target"
            );
            StoreError::Io(e)
        })?;

        Ok(())
    }
}

/// Source of `createdAt` timestamps.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A design before the store assigns its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDraft {
    pub user_image: ImageRef,
    pub overlay_image: ImageRef,
    pub description: String,
    pub style: TattooStyle,
    pub body_part: BodyPart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<TransformModel>,
    /// `createdAt` is assigned strictly after this instant (epoch millis).
    #[serde(skip)]
    pub not_before: Option<i64>,
}

/// A persisted design. Immutable: only the store constructs one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    id: String,
    user_image: ImageRef,
    #[serde(alias = "tattooImage")]
    overlay_image: ImageRef,
    #[serde(default)]
    description: String,
    #[serde(default)]
    style: TattooStyle,
    #[serde(default)]
    body_part: BodyPart,
    created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    placement: Option<TransformModel>,
}

impl Design {
    fn from_draft(draft: DesignDraft, id: String, created_at: i64) -> Self {
        Self {
            id,
            user_image: draft.user_image,
            overlay_image: draft.overlay_image,
            description: draft.description,
            style: draft.style,
            body_part: draft.body_part,
            created_at,
            placement: draft.placement,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn user_image(&self) -> &ImageRef { &self.user_image }
    pub fn overlay_image(&self) -> &ImageRef { &self.overlay_image }
    pub fn description(&self) -> &str { &self.description }
    pub fn style(&self) -> TattooStyle { self.style }
    pub fn body_part(&self) -> BodyPart { self.body_part }
    pub fn created_at(&self) -> i64 { self.created_at }
    pub fn placement(&self) -> Option<&TransformModel> { self.placement.as_ref() }

    /// Content without the store-assigned identity.
    pub fn draft(&self) -> DesignDraft {
        DesignDraft {
            user_image: self.user_image.clone(),
            overlay_image: self.overlay_image.clone(),
            description: self.description.clone(),
            style: self.style,
            body_part: self.body_part,
            placement: self.placement,
            not_before: None,
        }
    }
}

/// Clock time, bumped past the newest stored design and the draft's floor so
/// `createdAt` is strictly increasing even within one millisecond.
fn next_created_at(now: i64, designs: &[Design], not_before: Option<i64>) -> i64 {
    let floor = designs.iter().map(|d| d.created_at).chain(not_before).max();
    match floor {
        Some(floor) => now.max(floor.saturating_add(1)),
        None => now,
    }
}

/// `design_<millis>_<8 hex>`
fn generate_id(created_at: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("design_{}_{}", created_at, &suffix[..8])
}

pub struct DesignStore<B: BlobStore> {
    blob: B,
    key: String,
    clock: Box<dyn Clock>,
}

impl<B: BlobStore> DesignStore<B> {
    pub fn new(blob: B) -> Self {
        Self::with_key(blob, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(blob: B, key: impl Into<String>) -> Self {
        Self {
            blob,
            key: key.into(),
            clock: Box::new(SystemClock),
        }
    }

    pub fn from_config(blob: B, config: &EngineConfig) -> Self {
        Self::with_key(blob, config.storage_key.clone())
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn blob(&self) -> &B {
        &self.blob
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All designs, most recent first. An absent blob, or one that is not a
    /// JSON array, reads as empty; an unreadable record is skipped without
    /// affecting its siblings. Only a failing read of the backing store is
    /// an error.
    pub fn list(&self) -> Result<Vec<Design>, StoreError> {
        let Some(json) = self.blob.get(&self.key)? else {
            return Ok(Vec::new());
        };

        let records: Vec<serde_json::Value> = match serde_json::from_str(&json) {
            Ok(records) => records,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored designs unreadable, treating as empty");
                return Ok(Vec::new());
            }
        };

        let mut designs: Vec<Design> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(design) => Some(design),
                Err(e) => {
                    warn!(key = %self.key, index, error = %e, "Skipping unreadable design record");
                    None
                }
            })
            .collect();

        let mut seen = HashSet::new();
        let before = designs.len();
        designs.retain(|d| seen.insert(d.id.clone()));
        if designs.len() != before {
            warn!(key = %self.key, dropped = before - designs.len(), "Dropped duplicate design ids");
        }

        Ok(designs)
    }

    pub fn get(&self, id: &str) -> Result<Option<Design>, StoreError> {
        Ok(self.list()?.into_iter().find(|d| d.id == id))
    }

    /// Persist a new design at the front of the collection. The design is
    /// returned only once the write has succeeded.
    pub fn create(&self, draft: DesignDraft) -> Result<Design, StoreError> {
        let mut designs = self.list()?;

        let created_at = next_created_at(self.clock.now_millis(), &designs, draft.not_before);
        let mut id = generate_id(created_at);
        while designs.iter().any(|d| d.id == id) {
            id = generate_id(created_at);
        }

        let design = Design::from_draft(draft, id, created_at);
        designs.insert(0, design.clone());
        self.write(&designs)?;

        info!(
            id = %design.id,
            style = %design.style,
            body_part = %design.body_part,
            total = designs.len(),
            "Design created"
        );
        Ok(design)
    }

    /// Remove a design. Unknown ids are a successful no-op.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut designs = self.list()?;

        let Some(index) = designs.iter().position(|d| d.id == id) else {
            debug!(id, "Delete of unknown design ignored");
            return Ok(());
        };

        designs.remove(index);
        self.write(&designs)?;

        info!(id, remaining = designs.len(), "Design deleted");
        Ok(())
    }

    fn write(&self, designs: &[Design]) -> Result<(), StoreError> {
        let json = serde_json::to_string(designs)?;
        self.blob.set(&self.key, &json).map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to write designs");
            e
        })
    }
}
