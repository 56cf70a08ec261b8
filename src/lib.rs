#![no_std]

//! IoCS Common Peripheral Firmware Core
//!
//! Core logic for a battery-powered BLE peripheral exposing the vendor
//! "Interoperable Characteristics & Services" profile: device identity and
//! advertising behavior readable and reconfigurable over a connection, with
//! changes persisted across power cycles and applied without needless flash
//! writes or radio churn.
//!
//! The crate is organized into clear layers:
//!
//! - `codec` / `registry`: characteristic values and the id-keyed table
//! - `services`: one-shot composition of the GATT service table
//! - `writes`: write dispatch and deferred-flush coordination
//! - `advertising`: burst-mode advertising scheduler
//! - `storage`: load-or-default / save persistence gateway
//! - `hal`: radio, storage and indicator boundaries
//! - `peripheral`: the controller tying it all together

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod advertising;
pub mod codec;
pub mod hal;
pub mod peripheral;
pub mod registry;
pub mod services;
pub mod storage;
pub mod writes;
