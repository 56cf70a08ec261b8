//! Persistence Gateway
//!
//! Load-or-default / save of the characteristic registry against the named
//! blob storage boundary. The record is a postcard-encoded sequence of
//! `{id, value, readable, writable}` descriptors followed by a two-byte
//! CRC-16/IBM-3740 trailer. Handlers are never persisted; they are rebuilt
//! from the static dispatch table at boot.
//!
//! Every load failure mode (absent record, short record, CRC mismatch,
//! undecodable body, unknown id) maps to "absent": the caller falls back to
//! defaults and nothing is fatal.

use crc::{Crc, CRC_16_IBM_3740};
use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::hal::BlobStore;
use crate::registry::{Characteristic, CharacteristicId, CharacteristicRegistry, Value, MAX_CHARACTERISTICS};

/// Name of the persisted registry record.
pub const IOCS_RECORD_NAME: &str = "iocs.bin";

/// Serialized record buffer size: sixteen descriptors of at most ~40 bytes
/// each, plus the CRC trailer.
const RECORD_BUF_LEN: usize = 768;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// One persisted characteristic descriptor, id as a raw 16-bit key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PersistedCharacteristic {
    id: u16,
    value: Value,
    readable: bool,
    writable: bool,
}

/// Registry persistence against the storage boundary.
pub struct PersistenceGateway<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the previously persisted registry, or `None` if no valid
    /// record exists.
    pub fn load(&mut self) -> Option<CharacteristicRegistry> {
        let mut buf = [0u8; RECORD_BUF_LEN];
        let len = self.store.read_blob(IOCS_RECORD_NAME, &mut buf)?;
        if len < 2 || len > RECORD_BUF_LEN {
            warn!("Persisted record has invalid length {}", len);
            return None;
        }

        let (body, trailer) = buf[..len].split_at(len - 2);
        let stored_crc = u16::from_le_bytes([trailer[0], trailer[1]]);
        if CRC16.checksum(body) != stored_crc {
            warn!("Persisted record failed CRC validation, using defaults");
            return None;
        }

        let persisted: Vec<PersistedCharacteristic, MAX_CHARACTERISTICS> =
            match postcard::from_bytes(body) {
                Ok(persisted) => persisted,
                Err(_) => {
                    warn!("Persisted record body undecodable, using defaults");
                    return None;
                }
            };

        let mut entries: Vec<Characteristic, MAX_CHARACTERISTICS> = Vec::new();
        for p in persisted {
            let id = CharacteristicId::from_u16(p.id)?;
            entries
                .push(Characteristic {
                    id,
                    value: p.value,
                    readable: p.readable,
                    writable: p.writable,
                })
                .ok()?;
        }

        let registry = CharacteristicRegistry::from_entries(entries).ok()?;
        info!("Loaded persisted registry with {} characteristics", registry.entries().len());
        Some(registry)
    }

    /// Best-effort serialize-and-write of the registry.
    ///
    /// Returns `false` on any failure; retry policy belongs to the write
    /// coordinator.
    pub fn save(&mut self, registry: &CharacteristicRegistry) -> bool {
        let mut persisted: Vec<PersistedCharacteristic, MAX_CHARACTERISTICS> = Vec::new();
        for entry in registry.entries() {
            let record = PersistedCharacteristic {
                id: entry.id.to_u16(),
                value: entry.value.clone(),
                readable: entry.readable,
                writable: entry.writable,
            };
            if persisted.push(record).is_err() {
                return false;
            }
        }

        let mut buf = [0u8; RECORD_BUF_LEN];
        let body_len = match postcard::to_slice(&persisted, &mut buf[..RECORD_BUF_LEN - 2]) {
            Ok(body) => body.len(),
            Err(_) => {
                error!("Registry serialization failed");
                return false;
            }
        };

        let crc = CRC16.checksum(&buf[..body_len]);
        buf[body_len..body_len + 2].copy_from_slice(&crc.to_le_bytes());

        self.store.write_blob(IOCS_RECORD_NAME, &buf[..body_len + 2])
    }
}
