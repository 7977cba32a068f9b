//! In-memory cache store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use airq_types::CacheEntry;

use crate::error::Result;
use crate::slots::{CacheStore, CachedSlots, Slot, decode_slots, encode_entry};

/// Process-local [`CacheStore`] backed by a `HashMap`.
///
/// `replace_entry` holds the write lock for the whole clear-and-write
/// sequence and `read_slots` reads all three slots under one read lock, so
/// readers see either the old entry or the new one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<Slot, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots currently holding a value.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Whether no slot holds a value.
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, slot: Slot) -> Result<Option<Value>> {
        Ok(self.slots.read().await.get(&slot).cloned())
    }

    async fn set(&self, slot: Slot, value: Value) -> Result<()> {
        self.slots.write().await.insert(slot, value);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.slots.write().await.clear();
        Ok(())
    }

    async fn read_slots(&self) -> Result<CachedSlots> {
        let slots = self.slots.read().await;
        Ok(decode_slots(
            slots.get(&Slot::Installations).cloned(),
            slots.get(&Slot::Data).cloned(),
            slots.get(&Slot::Timestamp).cloned(),
        ))
    }

    async fn replace_entry(&self, entry: &CacheEntry) -> Result<()> {
        let values = encode_entry(entry)?;

        let mut slots = self.slots.write().await;
        slots.clear();
        for (slot, value) in Slot::ALL.into_iter().zip(values) {
            slots.insert(slot, value);
        }
        Ok(())
    }
}
