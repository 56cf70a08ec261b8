//! Persistence gateway: load-or-default, record validation, reported
//! failure.

mod common;

use common::MockStore;
use iocs_common_firmware::registry::{CharacteristicId, CharacteristicRegistry, Value};
use iocs_common_firmware::storage::{PersistenceGateway, IOCS_RECORD_NAME};

#[test]
fn load_without_record_yields_none() {
    let mut gateway = PersistenceGateway::new(MockStore::new());
    assert!(gateway.load().is_none());
}

#[test]
fn save_then_load_roundtrips_verbatim() {
    let store = MockStore::new();
    let mut gateway = PersistenceGateway::new(store.clone());

    let mut registry = CharacteristicRegistry::defaults(&common::identity());
    registry.set(CharacteristicId::DeviceName, Value::text("Beacon-7")).unwrap();
    registry.set(CharacteristicId::Adv1Interval, Value::u32_le(250)).unwrap();
    registry.set(CharacteristicId::Adv1BurstDuration, Value::u32_le(2000)).unwrap();
    registry.set(CharacteristicId::Adv1BurstInterval, Value::u32_le(5000)).unwrap();

    assert!(gateway.save(&registry));
    assert!(store.contains(IOCS_RECORD_NAME));

    let loaded = gateway.load().expect("record must load back");
    assert_eq!(loaded, registry);
}

#[test]
fn tampered_record_fails_crc_and_yields_none() {
    let store = MockStore::new();
    let mut gateway = PersistenceGateway::new(store.clone());
    let registry = CharacteristicRegistry::defaults(&common::identity());

    assert!(gateway.save(&registry));
    store.tamper(IOCS_RECORD_NAME, 4);
    assert!(gateway.load().is_none());
}

#[test]
fn truncated_record_yields_none() {
    let store = MockStore::new();
    store.put(IOCS_RECORD_NAME, &[0x01]);
    let mut gateway = PersistenceGateway::new(store);
    assert!(gateway.load().is_none());
}

#[test]
fn garbage_record_with_valid_length_yields_none() {
    let store = MockStore::new();
    // Long enough to carry a trailer, but the CRC will not match.
    store.put(IOCS_RECORD_NAME, &[0xde, 0xad, 0xbe, 0xef, 0x00, 0x00]);
    let mut gateway = PersistenceGateway::new(store);
    assert!(gateway.load().is_none());
}

#[test]
fn save_reports_storage_failure() {
    let store = MockStore::new();
    store.fail_writes(true);
    let mut gateway = PersistenceGateway::new(store.clone());
    let registry = CharacteristicRegistry::defaults(&common::identity());

    assert!(!gateway.save(&registry));
    assert!(!store.contains(IOCS_RECORD_NAME));

    // Storage recovers, the same save succeeds.
    store.fail_writes(false);
    assert!(gateway.save(&registry));
    assert!(gateway.load().is_some());
}
