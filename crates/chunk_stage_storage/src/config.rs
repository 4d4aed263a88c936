//! Tunables for caches, stashes and stores.

use crate::{StageError, StageResult};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sizing of a `ResourceStash`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct StashConfig {
    /// The nominal number of resources in circulation.
    pub capacity: usize,
    /// Idle resources are retained up to `ceil(capacity * capacity_multiplier)`.
    pub capacity_multiplier: f32,
    /// Create `capacity` resources up front.
    pub prefill: bool,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            capacity_multiplier: 1.0,
            prefill: false,
        }
    }
}

impl StashConfig {
    pub fn validate(&self) -> StageResult<()> {
        if self.capacity == 0 {
            return Err(StageError::invalid_argument("stash capacity must be positive"));
        }
        if !(self.capacity_multiplier >= 1.0) || !self.capacity_multiplier.is_finite() {
            return Err(StageError::invalid_argument(format!(
                "capacity multiplier must be a finite number >= 1, got {}",
                self.capacity_multiplier
            )));
        }

        Ok(())
    }

    /// The most idle resources the stash will hold.
    #[inline]
    pub fn retained_limit(&self) -> usize {
        (self.capacity as f64 * self.capacity_multiplier as f64).ceil() as usize
    }
}

/// Sizing and locking of a `ChunkCache`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// The number of live chunks above which unshared chunks are evicted.
    pub capacity: usize,
    pub capacity_multiplier: f32,
    pub prefill: bool,
    /// Number of key-striped locks serializing per-key loads.
    pub lock_stripes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            capacity_multiplier: 1.25,
            prefill: false,
            lock_stripes: 64,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> StageResult<()> {
        if self.lock_stripes == 0 {
            return Err(StageError::invalid_argument("lock stripe count must be positive"));
        }

        self.stash_config().validate()
    }

    #[inline]
    pub fn stash_config(&self) -> StashConfig {
        StashConfig {
            capacity: self.capacity,
            capacity_multiplier: self.capacity_multiplier,
            prefill: self.prefill,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_lock_stripes(mut self, lock_stripes: usize) -> Self {
        self.lock_stripes = lock_stripes;
        self
    }
}

/// Where partitioned stores live on disk. Each entity type gets `directory / (prefix + type_id + suffix)`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub directory: PathBuf,
    pub prefix: String,
    pub suffix: String,
    /// Delete the partitions when the backing database is dropped.
    pub temporary: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("stage"),
            prefix: String::new(),
            suffix: ".db".into(),
            temporary: false,
        }
    }
}

impl StoreConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    /// The partition name for an entity type.
    #[inline]
    pub fn partition_name(&self, type_id: &str) -> String {
        format!("{}{}{}", self.prefix, type_id, self.suffix)
    }

    #[inline]
    pub fn partition_path(&self, type_id: &str) -> PathBuf {
        self.directory.join(self.partition_name(type_id))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
