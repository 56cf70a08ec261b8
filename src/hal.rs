//! Boundary Traits
//!
//! The radio/BLE stack, non-volatile storage and indicator LEDs are external
//! collaborators. The core only talks to them through these traits, so the
//! whole coordination logic runs on the host for testing and the integrating
//! firmware supplies the real drivers.

use crate::services::ServiceTable;

/// Build-time device identity, supplied by the integrating firmware.
///
/// Everything here is read-only over the link except the device name, which
/// lives in the registry.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceIdentity {
    /// Advertiser (MAC) address, textual form.
    pub address: &'static str,
    pub board: &'static str,
    pub serial: &'static str,
    pub firmware_revision: &'static str,
    pub hardware_revision: &'static str,
    pub software_revision: &'static str,
}

/// Parameters programmed into the radio on every advertising refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingParams<'a> {
    pub local_name: &'a str,
    pub interval_ms: u32,
    pub manufacturer_id: u16,
    pub manufacturer_data: &'a [u8],
}

/// Radio/BLE stack boundary.
///
/// Connect/disconnect and characteristic-write events flow the other way:
/// the stack calls into [`crate::peripheral::IocsPeripheral`].
pub trait Radio {
    /// Register the composed GATT table. Called once at boot.
    fn register_services(&mut self, table: &ServiceTable);

    /// (Re)program the advertising payload and interval.
    fn set_advertising(&mut self, params: AdvertisingParams<'_>);

    /// Stop radio activity for the quiet window of a burst cycle.
    fn sleep(&mut self);

    /// Resume radio activity.
    fn wake(&mut self);
}

/// Non-volatile named-blob storage boundary.
pub trait BlobStore {
    /// Read a named blob into `buf`, returning the stored length.
    ///
    /// `None` means the record is absent or unreadable. A record longer
    /// than `buf` must also report `None` rather than truncate.
    fn read_blob(&mut self, name: &str, buf: &mut [u8]) -> Option<usize>;

    /// Write a named blob, reporting success. Failure is an expected
    /// outcome (flash full, wear), never a panic.
    fn write_blob(&mut self, name: &str, data: &[u8]) -> bool;
}

/// Indicator channels surfaced by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorChannel {
    /// A central is connected.
    Link,
    /// Last persistence flush succeeded.
    StoreSuccess,
    /// Last persistence flush failed.
    StoreFailure,
}

/// Indicator (LED) boundary. Level writes only; blink timing is the
/// driver's business.
pub trait Indicator {
    fn set_indicator(&mut self, channel: IndicatorChannel, on: bool);
}
