//! IoCS Characteristic Registry
//!
//! In-memory table of the sixteen IoCS characteristics, keyed by their
//! vendor 16-bit ids. The registry is built once at boot (from the persisted
//! record or from build-time defaults) and mutated in place by the write
//! coordinator for the rest of the process lifetime. It is the durable
//! source of truth, mirrored to storage at disconnect.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::hal::DeviceIdentity;

/// Maximum number of characteristics the registry can hold.
pub const MAX_CHARACTERISTICS: usize = 16;

/// Maximum encoded length of a single characteristic value.
pub const MAX_VALUE_LEN: usize = 32;

/// Storage capacity backing a text value. Byte-mapped decode yields chars
/// up to U+00FF, which store as two bytes, so text storage is twice the
/// wire length.
pub const MAX_TEXT_LEN: usize = MAX_VALUE_LEN * 2;

/// Default device name advertised and exposed on `0x1d03`.
pub const DEFAULT_DEVICE_NAME: &str = "IoCS Common";

/// Advertising defaults applied when no record is persisted.
pub const DEFAULT_ADV_INTERVAL_MS: u32 = 1000;
pub const DEFAULT_BURST_DURATION_MS: u32 = 0;
pub const DEFAULT_BURST_INTERVAL_MS: u32 = 0;
pub const DEFAULT_ADV_TYPE: u8 = 1;
pub const DEFAULT_ADV_FLAGS: u8 = 0x55;
pub const DEFAULT_ADV_PARAMETER: u32 = 0;

/// IoCS characteristic ids.
///
/// The high byte is the discriminating byte that assigns the characteristic
/// to its owning service family (`0x1d` Common Identification, `0xa1`
/// Advertisement 1).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharacteristicId {
    // Common Identification
    UsePublicAddress = 0x1d01,
    AdvertiserAddress = 0x1d02,
    DeviceName = 0x1d03,
    ModelNumber = 0x1d06,
    SerialNumber = 0x1d07,
    FirmwareRevision = 0x1d08,
    HardwareRevision = 0x1d09,
    SoftwareRevision = 0x1d0a,

    // Advertisement 1
    Adv1Interval = 0xa101,
    Adv1BurstDuration = 0xa102,
    Adv1BurstInterval = 0xa103,
    Adv1Type = 0xa104,
    Adv1Flags = 0xa105,
    Adv1Parameter0 = 0xa106,
    Adv1Parameter1 = 0xa107,
    Adv1Parameter2 = 0xa108,
}

impl CharacteristicId {
    /// Convert from a raw 16-bit id.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x1d01 => Some(Self::UsePublicAddress),
            0x1d02 => Some(Self::AdvertiserAddress),
            0x1d03 => Some(Self::DeviceName),
            0x1d06 => Some(Self::ModelNumber),
            0x1d07 => Some(Self::SerialNumber),
            0x1d08 => Some(Self::FirmwareRevision),
            0x1d09 => Some(Self::HardwareRevision),
            0x1d0a => Some(Self::SoftwareRevision),
            0xa101 => Some(Self::Adv1Interval),
            0xa102 => Some(Self::Adv1BurstDuration),
            0xa103 => Some(Self::Adv1BurstInterval),
            0xa104 => Some(Self::Adv1Type),
            0xa105 => Some(Self::Adv1Flags),
            0xa106 => Some(Self::Adv1Parameter0),
            0xa107 => Some(Self::Adv1Parameter1),
            0xa108 => Some(Self::Adv1Parameter2),
            _ => None,
        }
    }

    /// Raw 16-bit id.
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Discriminating byte selecting the owning service family.
    pub fn discriminator(self) -> u8 {
        (self as u16 >> 8) as u8
    }
}

/// A characteristic value in its in-memory representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    Bool(bool),
    Text(String<MAX_TEXT_LEN>),
    Bytes(Vec<u8, MAX_VALUE_LEN>),
}

impl Value {
    /// Build a text value, truncating at the wire-length boundary.
    pub fn text(s: &str) -> Self {
        let mut out = String::new();
        for c in s.chars().take(MAX_VALUE_LEN) {
            if out.push(c).is_err() {
                break;
            }
        }
        Value::Text(out)
    }

    /// Build a byte value from a 32-bit number, little-endian.
    pub fn u32_le(value: u32) -> Self {
        let mut bytes = Vec::new();
        // 4 bytes always fit in MAX_VALUE_LEN
        let _ = bytes.extend_from_slice(&codec::encode_u32_le(value));
        Value::Bytes(bytes)
    }

    /// Build a single-byte value.
    pub fn byte(value: u8) -> Self {
        let mut bytes = Vec::new();
        let _ = bytes.push(value);
        Value::Bytes(bytes)
    }

    /// Encode the value to its wire byte form. Text goes back through the
    /// byte-per-character mapping, so a decoded write re-encodes verbatim.
    pub fn wire_bytes(&self) -> Vec<u8, MAX_VALUE_LEN> {
        match self {
            Value::Bool(b) => {
                let mut out = Vec::new();
                let _ = out.push(*b as u8);
                out
            }
            Value::Text(s) => codec::encode_text(s),
            Value::Bytes(b) => b.clone(),
        }
    }
}

/// One characteristic descriptor: value plus access flags.
///
/// Write handlers are not part of the descriptor; they are rebuilt from the
/// static dispatch table at boot and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Characteristic {
    pub id: CharacteristicId,
    pub value: Value,
    pub readable: bool,
    pub writable: bool,
}

/// Registry errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    UnknownCharacteristic,
    DuplicateCharacteristic,
    TableFull,
}

/// Fixed-capacity characteristic table with linear id lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicRegistry {
    entries: Vec<Characteristic, MAX_CHARACTERISTICS>,
}

impl CharacteristicRegistry {
    /// Build the default registry from build-time identity fields plus the
    /// advertising defaults.
    pub fn defaults(identity: &DeviceIdentity) -> Self {
        let mut registry = Self { entries: Vec::new() };

        let read_only = [
            (CharacteristicId::UsePublicAddress, Value::Bool(false)),
            (CharacteristicId::AdvertiserAddress, Value::text(identity.address)),
        ];
        for (id, value) in read_only {
            let _ = registry.insert(Characteristic {
                id,
                value,
                readable: true,
                writable: false,
            });
        }

        let _ = registry.insert(Characteristic {
            id: CharacteristicId::DeviceName,
            value: Value::text(DEFAULT_DEVICE_NAME),
            readable: true,
            writable: true,
        });

        let identity_fields = [
            (CharacteristicId::ModelNumber, identity.board),
            (CharacteristicId::SerialNumber, identity.serial),
            (CharacteristicId::FirmwareRevision, identity.firmware_revision),
            (CharacteristicId::HardwareRevision, identity.hardware_revision),
            (CharacteristicId::SoftwareRevision, identity.software_revision),
        ];
        for (id, text) in identity_fields {
            let _ = registry.insert(Characteristic {
                id,
                value: Value::text(text),
                readable: true,
                writable: false,
            });
        }

        let advertising = [
            (CharacteristicId::Adv1Interval, Value::u32_le(DEFAULT_ADV_INTERVAL_MS)),
            (CharacteristicId::Adv1BurstDuration, Value::u32_le(DEFAULT_BURST_DURATION_MS)),
            (CharacteristicId::Adv1BurstInterval, Value::u32_le(DEFAULT_BURST_INTERVAL_MS)),
            (CharacteristicId::Adv1Type, Value::byte(DEFAULT_ADV_TYPE)),
            (CharacteristicId::Adv1Flags, Value::byte(DEFAULT_ADV_FLAGS)),
            (CharacteristicId::Adv1Parameter0, Value::u32_le(DEFAULT_ADV_PARAMETER)),
            (CharacteristicId::Adv1Parameter1, Value::u32_le(DEFAULT_ADV_PARAMETER)),
            (CharacteristicId::Adv1Parameter2, Value::u32_le(DEFAULT_ADV_PARAMETER)),
        ];
        for (id, value) in advertising {
            let _ = registry.insert(Characteristic {
                id,
                value,
                readable: true,
                writable: true,
            });
        }

        registry
    }

    /// Rebuild a registry from previously persisted descriptors.
    pub fn from_entries(
        entries: impl IntoIterator<Item = Characteristic>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self { entries: Vec::new() };
        for entry in entries {
            registry.insert(entry)?;
        }
        Ok(registry)
    }

    fn insert(&mut self, entry: Characteristic) -> Result<(), RegistryError> {
        if self.get(entry.id).is_some() {
            return Err(RegistryError::DuplicateCharacteristic);
        }
        self.entries.push(entry).map_err(|_| RegistryError::TableFull)
    }

    /// Look up a characteristic by id.
    pub fn get(&self, id: CharacteristicId) -> Option<&Characteristic> {
        self.entries.iter().find(|c| c.id == id)
    }

    /// Replace a characteristic's value in place.
    ///
    /// Neither persists nor refreshes advertising; those are the write
    /// coordinator's deferred actions.
    pub fn set(&mut self, id: CharacteristicId, value: Value) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RegistryError::UnknownCharacteristic)?;
        entry.value = value;
        Ok(())
    }

    /// All descriptors, in table order.
    pub fn entries(&self) -> &[Characteristic] {
        &self.entries
    }

    /// Text view of a characteristic value.
    pub fn text(&self, id: CharacteristicId) -> Option<&str> {
        match self.get(id)? {
            Characteristic { value: Value::Text(s), .. } => Some(s.as_str()),
            _ => None,
        }
    }

    /// Little-endian u32 view of a 4-byte characteristic value.
    pub fn u32_le(&self, id: CharacteristicId) -> Option<u32> {
        match self.get(id)? {
            Characteristic { value: Value::Bytes(b), .. } => codec::decode_u32_le(b),
            _ => None,
        }
    }

    /// First-byte view of a byte characteristic value.
    pub fn byte(&self, id: CharacteristicId) -> Option<u8> {
        match self.get(id)? {
            Characteristic { value: Value::Bytes(b), .. } => b.first().copied(),
            _ => None,
        }
    }
}
