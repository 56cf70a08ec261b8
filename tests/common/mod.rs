//! Shared mocks for the host test suite: in-memory blob store, recording
//! radio and indicator, and a fixed device identity.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use embassy_time::Instant;
use iocs_common_firmware::hal::{
    AdvertisingParams, BlobStore, DeviceIdentity, Indicator, IndicatorChannel, Radio,
};
use iocs_common_firmware::services::ServiceTable;

/// Build-time identity used across the tests.
pub fn identity() -> DeviceIdentity {
    DeviceIdentity {
        address: "e5:79:f3:06:9b:ac",
        board: "JOLTJS",
        serial: "5c1f3a02",
        firmware_revision: "2v21",
        hardware_revision: "1v0",
        software_revision: "1.0.0",
    }
}

#[derive(Default)]
struct StoreInner {
    blobs: HashMap<String, Vec<u8>>,
    fail_writes: bool,
    writes: usize,
}

/// In-memory named-blob store. Cloning yields a handle onto the same
/// storage, so tests keep a view after the gateway takes ownership.
#[derive(Clone, Default)]
pub struct MockStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes report failure.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Number of write attempts, successful or not.
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.borrow().blobs.contains_key(name)
    }

    pub fn put(&self, name: &str, data: &[u8]) {
        self.inner.borrow_mut().blobs.insert(name.into(), data.to_vec());
    }

    /// Flip one byte of a stored blob.
    pub fn tamper(&self, name: &str, index: usize) {
        let mut inner = self.inner.borrow_mut();
        let blob = inner.blobs.get_mut(name).expect("no such blob");
        blob[index] ^= 0xff;
    }
}

impl BlobStore for MockStore {
    fn read_blob(&mut self, name: &str, buf: &mut [u8]) -> Option<usize> {
        let inner = self.inner.borrow();
        let data = inner.blobs.get(name)?;
        if data.len() > buf.len() {
            return None;
        }
        buf[..data.len()].copy_from_slice(data);
        Some(data.len())
    }

    fn write_blob(&mut self, name: &str, data: &[u8]) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.writes += 1;
        if inner.fail_writes {
            return false;
        }
        inner.blobs.insert(name.into(), data.to_vec());
        true
    }
}

/// Indicator recording every level write; cloning yields a shared handle.
#[derive(Clone, Default)]
pub struct MockIndicator {
    log: Rc<RefCell<Vec<(IndicatorChannel, bool)>>>,
}

impl MockIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level written to a channel, if any.
    pub fn state(&self, channel: IndicatorChannel) -> Option<bool> {
        self.log
            .borrow()
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, on)| *on)
    }
}

impl Indicator for MockIndicator {
    fn set_indicator(&mut self, channel: IndicatorChannel, on: bool) {
        self.log.borrow_mut().push((channel, on));
    }
}

/// Radio boundary calls, timestamped with the (mock) clock.
#[derive(Debug, Clone, PartialEq)]
pub enum RadioEvent {
    Advertise {
        name: String,
        interval_ms: u32,
        manufacturer_id: u16,
    },
    Sleep,
    Wake,
    Register {
        services: usize,
        characteristics: usize,
    },
}

/// Recording radio.
#[derive(Default)]
pub struct MockRadio {
    pub events: Vec<(Instant, RadioEvent)>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event kinds in order, without timestamps.
    pub fn kinds(&self) -> Vec<&RadioEvent> {
        self.events.iter().map(|(_, e)| e).collect()
    }

    /// Milliseconds between the first recorded event and event `index`.
    pub fn delta_ms(&self, index: usize) -> u64 {
        let t0 = self.events[0].0;
        (self.events[index].0 - t0).as_millis()
    }

    pub fn count_sleeps(&self) -> usize {
        self.events.iter().filter(|(_, e)| matches!(e, RadioEvent::Sleep)).count()
    }

    pub fn count_advertises(&self) -> usize {
        self.events
            .iter()
            .filter(|(_, e)| matches!(e, RadioEvent::Advertise { .. }))
            .count()
    }
}

impl Radio for MockRadio {
    fn register_services(&mut self, table: &ServiceTable) {
        self.events.push((
            Instant::now(),
            RadioEvent::Register {
                services: table.services.len(),
                characteristics: table.characteristic_count(),
            },
        ));
    }

    fn set_advertising(&mut self, params: AdvertisingParams<'_>) {
        self.events.push((
            Instant::now(),
            RadioEvent::Advertise {
                name: params.local_name.to_string(),
                interval_ms: params.interval_ms,
                manufacturer_id: params.manufacturer_id,
            },
        ));
    }

    fn sleep(&mut self) {
        self.events.push((Instant::now(), RadioEvent::Sleep));
    }

    fn wake(&mut self) {
        self.events.push((Instant::now(), RadioEvent::Wake));
    }
}
