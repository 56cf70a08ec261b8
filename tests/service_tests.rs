//! Service composition: UUID templating, discriminator placement, handler
//! exposure.

mod common;

use std::collections::HashSet;

use iocs_common_firmware::registry::{CharacteristicId, CharacteristicRegistry};
use iocs_common_firmware::services::{self, ServiceFamily, Uuid128};

fn composed() -> iocs_common_firmware::services::ServiceTable {
    services::compose(&CharacteristicRegistry::defaults(&common::identity()))
}

#[test]
fn vendor_uuid_template_substitution() {
    // 49441d03-496f-4353-b73e-436f6d6d6f6e
    let uuid = Uuid128::vendor(0x1d03);
    assert_eq!(
        uuid.0,
        [0x49, 0x44, 0x1d, 0x03, 0x49, 0x6f, 0x43, 0x53, 0xb7, 0x3e, 0x43, 0x6f, 0x6d, 0x6d, 0x6f, 0x6e]
    );
}

#[test]
fn service_uuids_use_zero_low_byte() {
    assert_eq!(ServiceFamily::CommonIdentification.uuid(), Uuid128::vendor(0x1d00));
    assert_eq!(ServiceFamily::Advertisement1.uuid(), Uuid128::vendor(0xa100));
}

#[test]
fn every_id_lands_in_exactly_one_service() {
    let table = composed();
    assert_eq!(table.services.len(), 2);

    let mut seen = HashSet::new();
    for service in &table.services {
        for characteristic in &service.characteristics {
            assert!(
                seen.insert(characteristic.id.to_u16()),
                "id {:#06x} appears twice",
                characteristic.id.to_u16()
            );
            assert_eq!(
                characteristic.id.discriminator(),
                service.family.discriminator(),
                "id {:#06x} placed under the wrong service",
                characteristic.id.to_u16()
            );
        }
    }
    assert_eq!(seen.len(), 16);
}

#[test]
fn services_split_eight_and_eight() {
    let table = composed();
    let ident = &table.services[0];
    let adv = &table.services[1];
    assert_eq!(ident.family, ServiceFamily::CommonIdentification);
    assert_eq!(ident.characteristics.len(), 8);
    assert_eq!(adv.family, ServiceFamily::Advertisement1);
    assert_eq!(adv.characteristics.len(), 8);
}

#[test]
fn handlers_exposed_only_for_writable_handled_ids() {
    let table = composed();
    let find = |id: CharacteristicId| {
        table
            .services
            .iter()
            .flat_map(|s| s.characteristics.iter())
            .find(|c| c.id == id)
            .unwrap()
            .clone()
    };

    let name = find(CharacteristicId::DeviceName);
    assert!(name.writable && name.has_write_handler);

    let interval = find(CharacteristicId::Adv1Interval);
    assert!(interval.writable && interval.has_write_handler);

    // Read-only identity: no write route
    let model = find(CharacteristicId::ModelNumber);
    assert!(!model.writable && !model.has_write_handler);
    let address = find(CharacteristicId::AdvertiserAddress);
    assert!(!address.writable && !address.has_write_handler);
}

#[test]
fn composed_values_are_wire_form() {
    let table = composed();
    let interval = table
        .services
        .iter()
        .flat_map(|s| s.characteristics.iter())
        .find(|c| c.id == CharacteristicId::Adv1Interval)
        .unwrap();
    assert_eq!(interval.value.as_slice(), &[0xe8, 0x03, 0x00, 0x00]);

    let name = table
        .services
        .iter()
        .flat_map(|s| s.characteristics.iter())
        .find(|c| c.id == CharacteristicId::DeviceName)
        .unwrap();
    assert_eq!(name.value.as_slice(), b"IoCS Common");
}

#[test]
fn default_registry_validates() {
    let registry = CharacteristicRegistry::defaults(&common::identity());
    assert!(services::validate(&registry));
}

#[test]
fn family_relation_follows_discriminator() {
    assert_eq!(
        ServiceFamily::of(CharacteristicId::DeviceName),
        Some(ServiceFamily::CommonIdentification)
    );
    assert_eq!(
        ServiceFamily::of(CharacteristicId::Adv1Flags),
        Some(ServiceFamily::Advertisement1)
    );
}
