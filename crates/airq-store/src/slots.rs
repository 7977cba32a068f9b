//! The cache store abstraction and its three slots.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use airq_types::{CacheEntry, Installation, MeasurementPayload};

use crate::error::Result;

/// One of the three logical slots of the cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Nearest installations, a JSON array.
    Installations,
    /// Measurement payload of the first installation.
    Data,
    /// Fetch time in unix seconds.
    Timestamp,
}

impl Slot {
    /// All slots in write order.
    pub const ALL: [Slot; 3] = [Slot::Installations, Slot::Data, Slot::Timestamp];

    /// Storage key for this slot.
    pub fn key(&self) -> &'static str {
        match self {
            Slot::Installations => "qa-installations",
            Slot::Data => "qa-data",
            Slot::Timestamp => "qa-timestamp",
        }
    }

    /// Look up a slot by storage key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

/// Decoded contents of the three slots. Any slot may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedSlots {
    pub installations: Option<Vec<Installation>>,
    pub data: Option<MeasurementPayload>,
    pub timestamp: Option<i64>,
}

impl CachedSlots {
    /// Whether the installations and data slots are both present.
    pub fn entry_present(&self) -> bool {
        self.installations.is_some() && self.data.is_some()
    }

    /// Assemble a [`CacheEntry`] if all three slots are present.
    pub fn into_entry(self) -> Option<CacheEntry> {
        match (self.installations, self.data, self.timestamp) {
            (Some(installations), Some(data), Some(timestamp)) => Some(CacheEntry {
                installations,
                data,
                timestamp,
            }),
            _ => None,
        }
    }
}

/// Attempts the provided `read_slots` makes before giving up on a snapshot.
const SNAPSHOT_ATTEMPTS: usize = 3;

/// Asynchronous key-value store holding the cached entry.
///
/// Backends implement `get`, `set` and `clear`. The provided
/// `read_slots` and `replace_entry` encode the ordering contract; backends
/// that can make the replacement atomic should override `replace_entry`.
///
/// `read_slots` must return a consistent snapshot: never installations or
/// data from one generation alongside the timestamp of another. Backends
/// that can read all three slots at once should override it.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the raw JSON stored in a slot.
    async fn get(&self, slot: Slot) -> Result<Option<Value>>;

    /// Overwrite a slot.
    async fn set(&self, slot: Slot, value: Value) -> Result<()>;

    /// Remove every slot.
    async fn clear(&self) -> Result<()>;

    /// Read a snapshot of installations, data and timestamp.
    ///
    /// The timestamp is read before and after the other two slots and the
    /// read is retried when it changed, since a replacement landed in
    /// between. If the entry keeps changing, nothing is reported, which
    /// makes the entry stale. Generations are told apart by their timestamp.
    ///
    /// A slot that cannot be decoded is reported as absent, which makes the
    /// entry stale and forces a refresh.
    async fn read_slots(&self) -> Result<CachedSlots> {
        for _ in 0..SNAPSHOT_ATTEMPTS {
            let before = self.get(Slot::Timestamp).await?;
            let installations = self.get(Slot::Installations).await?;
            let data = self.get(Slot::Data).await?;
            let after = self.get(Slot::Timestamp).await?;

            if before == after {
                return Ok(decode_slots(installations, data, after));
            }
            debug!("Cache entry replaced during read, retrying");
        }

        warn!(
            "Cache entry kept changing over {} reads, treating it as absent",
            SNAPSHOT_ATTEMPTS
        );
        Ok(CachedSlots::default())
    }

    /// Clear the store, then write installations, data and timestamp.
    ///
    /// Values are encoded before the clear, so an encoding failure leaves the
    /// previous entry in place.
    async fn replace_entry(&self, entry: &CacheEntry) -> Result<()> {
        let [installations, data, timestamp] = encode_entry(entry)?;

        self.clear().await?;
        self.set(Slot::Installations, installations).await?;
        self.set(Slot::Data, data).await?;
        self.set(Slot::Timestamp, timestamp).await?;
        Ok(())
    }
}

#[async_trait]
impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    async fn get(&self, slot: Slot) -> Result<Option<Value>> {
        (**self).get(slot).await
    }

    async fn set(&self, slot: Slot, value: Value) -> Result<()> {
        (**self).set(slot, value).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }

    async fn read_slots(&self) -> Result<CachedSlots> {
        (**self).read_slots().await
    }

    async fn replace_entry(&self, entry: &CacheEntry) -> Result<()> {
        (**self).replace_entry(entry).await
    }
}

/// Encode an entry into slot values, in [`Slot::ALL`] order.
pub(crate) fn encode_entry(entry: &CacheEntry) -> Result<[Value; 3]> {
    Ok([
        serde_json::to_value(&entry.installations)?,
        serde_json::to_value(&entry.data)?,
        Value::from(entry.timestamp),
    ])
}

/// Decode raw slot values, reporting undecodable slots as absent.
pub(crate) fn decode_slots(
    installations: Option<Value>,
    data: Option<Value>,
    timestamp: Option<Value>,
) -> CachedSlots {
    CachedSlots {
        installations: decode_slot(Slot::Installations, installations),
        data: decode_slot(Slot::Data, data),
        timestamp: decode_slot(Slot::Timestamp, timestamp),
    }
}

fn decode_slot<T: DeserializeOwned>(slot: Slot, value: Option<Value>) -> Option<T> {
    let value = value?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!("Ignoring undecodable cache slot {}: {}", slot.key(), e);
            None
        }
    }
}
