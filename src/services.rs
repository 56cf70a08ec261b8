//! GATT Service Composition
//!
//! Maps the flat id-keyed registry into the nested service/characteristic
//! table the BLE stack registers at boot. Two fixed 128-bit vendor service
//! UUIDs exist, distinguished by one discriminating byte; each registry
//! entry lands under the service whose discriminator matches its id's high
//! byte, keyed by substituting the 16-bit id into the vendor UUID template.
//!
//! The table is composed exactly once at boot. Adding a characteristic
//! later means one new registry entry plus its id/family mapping here.

use heapless::Vec;

use crate::registry::{CharacteristicId, CharacteristicRegistry, MAX_CHARACTERISTICS, MAX_VALUE_LEN};
use crate::writes;

/// Maximum number of services in the composed table.
pub const MAX_SERVICES: usize = 4;

/// Vendor UUID template, big-endian byte order of
/// `4944xxxx-496f-4353-b73e-436f6d6d6f6e` ("ID..IoCS.>Common"). The 16-bit
/// id is spliced into bytes 2..4.
const VENDOR_UUID_TEMPLATE: [u8; 16] = [
    0x49, 0x44, 0x00, 0x00, 0x49, 0x6f, 0x43, 0x53, 0xb7, 0x3e, 0x43, 0x6f, 0x6d, 0x6d, 0x6f, 0x6e,
];

/// A 128-bit UUID in big-endian byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Uuid128(pub [u8; 16]);

impl Uuid128 {
    /// Substitute a 16-bit id into the vendor UUID template.
    pub fn vendor(id: u16) -> Self {
        let mut uuid = VENDOR_UUID_TEMPLATE;
        let id_bytes = id.to_be_bytes();
        uuid[2] = id_bytes[0];
        uuid[3] = id_bytes[1];
        Uuid128(uuid)
    }
}

/// The two fixed IoCS service families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceFamily {
    CommonIdentification,
    Advertisement1,
}

impl ServiceFamily {
    pub const ALL: [ServiceFamily; 2] = [ServiceFamily::CommonIdentification, ServiceFamily::Advertisement1];

    /// The discriminating byte matched against a characteristic id's high
    /// byte.
    pub fn discriminator(self) -> u8 {
        match self {
            ServiceFamily::CommonIdentification => 0x1d,
            ServiceFamily::Advertisement1 => 0xa1,
        }
    }

    /// Service UUID: the discriminator substituted into the template with a
    /// zero low byte.
    pub fn uuid(self) -> Uuid128 {
        Uuid128::vendor((self.discriminator() as u16) << 8)
    }

    /// The family owning a characteristic id, if any.
    ///
    /// Total over [`CharacteristicId`] today; `Option` keeps the relation
    /// explicit for ids added under a new discriminator.
    pub fn of(id: CharacteristicId) -> Option<ServiceFamily> {
        Self::ALL.iter().copied().find(|f| f.discriminator() == id.discriminator())
    }
}

/// One characteristic as exposed to the BLE stack.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GattCharacteristic {
    pub uuid: Uuid128,
    pub id: CharacteristicId,
    /// Wire-form value at composition time. The stack keeps it consistent
    /// with the registry afterwards: written bytes land in both.
    pub value: Vec<u8, MAX_VALUE_LEN>,
    pub readable: bool,
    pub writable: bool,
    /// Route write events for this characteristic to the coordinator.
    /// Set only when the entry is writable and a handler is registered.
    pub has_write_handler: bool,
}

/// One service with its characteristics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GattService {
    pub uuid: Uuid128,
    pub family: ServiceFamily,
    pub characteristics: Vec<GattCharacteristic, MAX_CHARACTERISTICS>,
}

/// The composed service table handed to [`crate::hal::Radio::register_services`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceTable {
    pub services: Vec<GattService, MAX_SERVICES>,
}

impl ServiceTable {
    /// Total characteristic count across all services.
    pub fn characteristic_count(&self) -> usize {
        self.services.iter().map(|s| s.characteristics.len()).sum()
    }
}

/// Compose the service table from the registry.
pub fn compose(registry: &CharacteristicRegistry) -> ServiceTable {
    let mut table = ServiceTable { services: Vec::new() };

    for family in ServiceFamily::ALL {
        let mut service = GattService {
            uuid: family.uuid(),
            family,
            characteristics: Vec::new(),
        };

        for entry in registry.entries() {
            if ServiceFamily::of(entry.id) != Some(family) {
                continue;
            }
            let characteristic = GattCharacteristic {
                uuid: Uuid128::vendor(entry.id.to_u16()),
                id: entry.id,
                value: entry.value.wire_bytes(),
                readable: entry.readable,
                writable: entry.writable,
                has_write_handler: entry.writable && writes::handles_writes(entry.id),
            };
            // Capacity bounds match the registry, push cannot fail
            let _ = service.characteristics.push(characteristic);
        }

        let _ = table.services.push(service);
    }

    info!(
        "Composed service table: {} services, {} characteristics",
        table.services.len(),
        table.characteristic_count()
    );
    table
}

/// Check that every registry entry maps to exactly one service family.
///
/// Run once at boot; a `false` here means an id was added without its
/// discriminator rule.
pub fn validate(registry: &CharacteristicRegistry) -> bool {
    registry.entries().iter().all(|entry| {
        let owners = ServiceFamily::ALL
            .iter()
            .filter(|f| f.discriminator() == entry.id.discriminator())
            .count();
        if owners != 1 {
            warn!("Characteristic {} maps to {} services", entry.id.to_u16(), owners);
        }
        owners == 1
    })
}
