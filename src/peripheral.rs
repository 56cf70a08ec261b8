//! IoCS Peripheral Controller
//!
//! Ties the registry, write coordinator, persistence gateway and indicator
//! together behind the event surface the BLE stack calls into: boot,
//! connect, characteristic write, disconnect. One explicit instance owns
//! all mutable state, so multiple independent peripherals (and
//! deterministic tests) need no ambient globals.

use crate::advertising::AdvertisingScheduler;
use crate::hal::{BlobStore, DeviceIdentity, Indicator, IndicatorChannel};
use crate::registry::CharacteristicRegistry;
use crate::services::{self, ServiceTable};
use crate::storage::PersistenceGateway;
use crate::writes::{PendingFlags, WriteCoordinator};

/// The IoCS Common peripheral core.
///
/// Boot order mirrors the device: load-or-default the registry, compose the
/// service table once, hand it to the radio, start advertising, then feed
/// connection and write events in.
pub struct IocsPeripheral<S: BlobStore, I: Indicator> {
    registry: CharacteristicRegistry,
    coordinator: WriteCoordinator,
    gateway: PersistenceGateway<S>,
    indicator: I,
}

impl<S: BlobStore, I: Indicator> IocsPeripheral<S, I> {
    /// Boot the peripheral: load the persisted registry (falling back to
    /// the identity-derived defaults) and compose the service table.
    ///
    /// The table is composed exactly once, here. The integrating firmware
    /// registers it with the radio and then starts the advertising
    /// scheduler via [`Self::refresh_advertising`].
    pub fn boot(identity: &DeviceIdentity, store: S, indicator: I) -> (Self, ServiceTable) {
        let mut gateway = PersistenceGateway::new(store);
        let registry = match gateway.load() {
            Some(registry) => registry,
            None => {
                info!("No valid persisted registry, building defaults");
                CharacteristicRegistry::defaults(identity)
            }
        };

        if !services::validate(&registry) {
            // A characteristic outside both service families is a wiring
            // bug in this crate, not a runtime condition.
            error!("Registry contains ids outside the known service families");
        }
        let table = services::compose(&registry);

        let peripheral = Self {
            registry,
            coordinator: WriteCoordinator::new(),
            gateway,
            indicator,
        };
        (peripheral, table)
    }

    /// The live registry.
    pub fn registry(&self) -> &CharacteristicRegistry {
        &self.registry
    }

    /// Pending deferred-action flags (exposed for supervision).
    pub fn pending(&self) -> PendingFlags {
        self.coordinator.pending()
    }

    /// Push the registry's current advertising fields to the scheduler.
    /// Called once after boot and again by the disconnect flush.
    pub fn refresh_advertising(&self, scheduler: &AdvertisingScheduler) {
        scheduler.refresh(&self.registry);
    }

    /// A central connected.
    pub fn on_connect(&mut self, peer: &str) {
        self.indicator.set_indicator(IndicatorChannel::Link, true);
        info!("Central {} connected", peer);
    }

    /// A characteristic write was delivered by the stack.
    pub fn on_characteristic_write(&mut self, id: u16, data: &[u8]) {
        self.coordinator.handle_write(&mut self.registry, id, data);
    }

    /// The central disconnected: flush the deferred persistence and
    /// advertising-refresh actions accumulated over the session.
    pub fn on_disconnect(&mut self, scheduler: &AdvertisingScheduler) {
        self.indicator.set_indicator(IndicatorChannel::Link, false);
        info!("Central disconnected, flushing pending flags");
        self.coordinator.flush_at_disconnect(
            &self.registry,
            &mut self.gateway,
            &mut self.indicator,
            scheduler,
        );
    }
}
