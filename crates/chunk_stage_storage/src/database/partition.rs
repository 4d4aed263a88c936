use super::{SledBackend, StoreKey, TransactionalStore};
use crate::{StageError, StageResult, StoreConfig};

use ahash::AHashMap;
use std::any::{Any, TypeId};
use std::sync::{Arc, Mutex, PoisonError};

/// A kind of record that gets its own store partition, e.g. chunks or overhead metadata.
pub trait EntityType: 'static {
    /// Names the partition. Must be unique among the entity types opened by one factory.
    const TYPE_ID: &'static str;

    type Key: StoreKey;
}

/// The store an entity type is persisted in.
pub type PartitionStore<E> = TransactionalStore<<E as EntityType>::Key, SledBackend>;

struct Partition {
    type_id: TypeId,
    store: Arc<dyn Any + Send + Sync>,
}

/// Opens one independent store (and `sled` database) per entity type, at
/// `directory / (prefix + TYPE_ID + suffix)`, so that different kinds of records never contend for the same lock.
pub struct PartitionedStoreFactory {
    config: StoreConfig,
    partitions: Mutex<AHashMap<&'static str, Partition>>,
}

impl PartitionedStoreFactory {
    /// Creates the configured directory if it doesn't exist.
    pub fn new(config: StoreConfig) -> StageResult<Self> {
        std::fs::create_dir_all(&config.directory)?;

        Ok(Self {
            config,
            partitions: Mutex::new(AHashMap::new()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get the store for `E`, opening its partition on first use. Every call for the same entity type returns the same
    /// store.
    pub fn open<E: EntityType>(&self) -> StageResult<Arc<PartitionStore<E>>> {
        let mut partitions = self
            .partitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(partition) = partitions.get(E::TYPE_ID) {
            if partition.type_id != TypeId::of::<E>() {
                return Err(StageError::invalid_argument(format!(
                    "two entity types share the partition name {:?}",
                    E::TYPE_ID
                )));
            }
            return partition
                .store
                .clone()
                .downcast::<PartitionStore<E>>()
                .map_err(|_| StageError::invalid_argument("partition holds a store of another type"));
        }

        let path = self.config.partition_path(E::TYPE_ID);
        let backend = SledBackend::open(&path, self.config.temporary)?;
        let store = Arc::new(PartitionStore::<E>::new(
            self.config.partition_name(E::TYPE_ID),
            backend,
        ));
        partitions.insert(
            E::TYPE_ID,
            Partition {
                type_id: TypeId::of::<E>(),
                store: store.clone(),
            },
        );
        tracing::info!(partition = %path.display(), "opened store partition");

        Ok(store)
    }

    /// Names of the partitions opened so far.
    pub fn open_partitions(&self) -> Vec<&'static str> {
        let partitions = self
            .partitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = partitions.keys().copied().collect();
        names.sort_unstable();

        names
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
