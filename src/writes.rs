//! GATT Write Coordination
//!
//! Dispatches delivered characteristic writes to their handlers and tracks
//! the two pending flags that defer persistence and advertising refresh to
//! the disconnect that ends a configuration session. A burst of writes thus
//! costs one flash write and one advertising restart, and only the last
//! value written per characteristic survives. The coalescing is deliberate.

use crate::advertising::AdvertisingScheduler;
use crate::codec;
use crate::hal::{BlobStore, Indicator, IndicatorChannel};
use crate::registry::{CharacteristicId, CharacteristicRegistry, Value};
use crate::storage::PersistenceGateway;

/// Deferred-action markers set by write handlers and flushed at disconnect.
///
/// Booleans, not counters: any number of triggering writes collapses into
/// one eventual action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingFlags {
    pub persistence_due: bool,
    pub advertising_refresh_due: bool,
}

impl PendingFlags {
    pub const fn none() -> Self {
        Self {
            persistence_due: false,
            advertising_refresh_due: false,
        }
    }

    pub fn merge(&mut self, other: PendingFlags) {
        self.persistence_due |= other.persistence_due;
        self.advertising_refresh_due |= other.advertising_refresh_due;
    }
}

/// Wire representation expected by a writable characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum WriteKind {
    /// Byte-mapped text (device name).
    Text,
    /// Exactly four bytes, little-endian u32.
    Uint32,
    /// Single byte.
    Byte,
}

/// Static id-to-handler table.
///
/// Read-only characteristics have no entry here; the composer exposes a
/// write route only for ids this table covers.
fn handler_for(id: CharacteristicId) -> Option<WriteKind> {
    match id {
        CharacteristicId::DeviceName => Some(WriteKind::Text),
        CharacteristicId::Adv1Interval
        | CharacteristicId::Adv1BurstDuration
        | CharacteristicId::Adv1BurstInterval
        | CharacteristicId::Adv1Parameter0
        | CharacteristicId::Adv1Parameter1
        | CharacteristicId::Adv1Parameter2 => Some(WriteKind::Uint32),
        CharacteristicId::Adv1Type | CharacteristicId::Adv1Flags => Some(WriteKind::Byte),
        _ => None,
    }
}

/// Whether a write handler is registered for the id.
pub fn handles_writes(id: CharacteristicId) -> bool {
    handler_for(id).is_some()
}

/// Ids whose value shapes the advertising broadcast; writing one schedules
/// an advertising refresh on top of the persistence flush.
fn shapes_advertising(id: CharacteristicId) -> bool {
    matches!(
        id,
        CharacteristicId::DeviceName
            | CharacteristicId::Adv1Interval
            | CharacteristicId::Adv1BurstDuration
            | CharacteristicId::Adv1BurstInterval
            | CharacteristicId::Adv1Type
            | CharacteristicId::Adv1Flags
            | CharacteristicId::Adv1Parameter0
            | CharacteristicId::Adv1Parameter1
            | CharacteristicId::Adv1Parameter2
    )
}

/// Tracks pending flags across a connection and flushes them at disconnect.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WriteCoordinator {
    pending: PendingFlags,
}

impl WriteCoordinator {
    pub const fn new() -> Self {
        Self {
            pending: PendingFlags::none(),
        }
    }

    /// Current pending flags.
    pub fn pending(&self) -> PendingFlags {
        self.pending
    }

    /// Handle a delivered characteristic write.
    ///
    /// Unmapped ids and undecodable payloads are ignored without fault; the
    /// stored value stays unchanged and no flags are raised.
    pub fn handle_write(&mut self, registry: &mut CharacteristicRegistry, raw_id: u16, data: &[u8]) {
        let Some(id) = CharacteristicId::from_u16(raw_id) else {
            trace!("Write to unmapped characteristic {}, ignored", raw_id);
            return;
        };
        let Some(kind) = handler_for(id) else {
            trace!("Write to read-only characteristic {}, ignored", raw_id);
            return;
        };

        let value = match kind {
            WriteKind::Text => codec::decode_text(data).map(Value::Text),
            WriteKind::Uint32 => codec::decode_u32_le(data).map(Value::u32_le),
            WriteKind::Byte => data.first().map(|&b| Value::byte(b)),
        };
        let Some(value) = value else {
            warn!("Undecodable {}-byte payload for characteristic {}, value unchanged", data.len(), raw_id);
            return;
        };

        if registry.set(id, value).is_err() {
            // Handler table and registry disagree; leave state untouched.
            warn!("Characteristic {} has a handler but no registry entry", raw_id);
            return;
        }

        self.pending.merge(PendingFlags {
            persistence_due: true,
            advertising_refresh_due: shapes_advertising(id),
        });
        debug!("Characteristic {} written, pending flags updated", raw_id);
    }

    /// Flush pending flags at disconnect.
    ///
    /// Persistence and advertising proceed independently: a failed save
    /// keeps `persistence_due` set so the next disconnect retries, while the
    /// advertising flag clears unconditionally before the refresh. Neither
    /// outcome disturbs the in-memory registry or the link.
    pub fn flush_at_disconnect<S: BlobStore, I: Indicator>(
        &mut self,
        registry: &CharacteristicRegistry,
        gateway: &mut PersistenceGateway<S>,
        indicator: &mut I,
        scheduler: &AdvertisingScheduler,
    ) {
        if self.pending.persistence_due {
            if gateway.save(registry) {
                self.pending.persistence_due = false;
                indicator.set_indicator(IndicatorChannel::StoreFailure, false);
                indicator.set_indicator(IndicatorChannel::StoreSuccess, true);
                info!("Registry persisted at disconnect");
            } else {
                indicator.set_indicator(IndicatorChannel::StoreSuccess, false);
                indicator.set_indicator(IndicatorChannel::StoreFailure, true);
                warn!("Registry persistence failed, will retry at next disconnect");
            }
        }

        if self.pending.advertising_refresh_due {
            self.pending.advertising_refresh_due = false;
            scheduler.refresh(registry);
            info!("Advertising refresh scheduled at disconnect");
        }
    }
}

impl Default for WriteCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
