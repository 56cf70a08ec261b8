//! Burst-Mode Advertising Scheduler
//!
//! Owns the current advertising parameters and the optional sleep/wake
//! deadline pair implementing burst-mode advertising. Split into a control
//! side (`refresh`, callable from the write coordinator at disconnect) and
//! an async `run` loop that drives the radio boundary.
//!
//! Refreshes are delivered through a coalescing signal: however many arrive
//! while a cycle is in flight, the loop sees one, drops the outstanding
//! deadline pair and re-programs with the latest configuration. A stale
//! timer can therefore never sleep or wake the radio for a superseded
//! configuration.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use heapless::String;

use crate::hal::{AdvertisingParams, Radio};
use crate::registry::{
    CharacteristicId, CharacteristicRegistry, DEFAULT_ADV_FLAGS, DEFAULT_ADV_INTERVAL_MS,
    DEFAULT_ADV_PARAMETER, DEFAULT_ADV_TYPE, DEFAULT_BURST_DURATION_MS, DEFAULT_BURST_INTERVAL_MS,
    DEFAULT_DEVICE_NAME, MAX_TEXT_LEN,
};

/// Manufacturer id carried in the advertising payload (vendor marker).
pub const VENDOR_COMPANY_ID: u16 = 0x0590;

/// Snapshot of the advertising-shape registry fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingConfig {
    pub device_name: String<MAX_TEXT_LEN>,
    pub interval_ms: u32,
    pub burst_duration_ms: u32,
    pub burst_interval_ms: u32,
    pub adv_type: u8,
    pub flags: u8,
    pub parameters: [u32; 3],
}

impl AdvertisingConfig {
    /// Extract the advertising configuration from the registry, falling
    /// back to the defaults for any absent or mistyped field.
    pub fn from_registry(registry: &CharacteristicRegistry) -> Self {
        let mut device_name = String::new();
        let name = registry
            .text(CharacteristicId::DeviceName)
            .unwrap_or(DEFAULT_DEVICE_NAME);
        for c in name.chars() {
            if device_name.push(c).is_err() {
                break;
            }
        }

        Self {
            device_name,
            interval_ms: registry
                .u32_le(CharacteristicId::Adv1Interval)
                .unwrap_or(DEFAULT_ADV_INTERVAL_MS),
            burst_duration_ms: registry
                .u32_le(CharacteristicId::Adv1BurstDuration)
                .unwrap_or(DEFAULT_BURST_DURATION_MS),
            burst_interval_ms: registry
                .u32_le(CharacteristicId::Adv1BurstInterval)
                .unwrap_or(DEFAULT_BURST_INTERVAL_MS),
            adv_type: registry
                .byte(CharacteristicId::Adv1Type)
                .unwrap_or(DEFAULT_ADV_TYPE),
            flags: registry
                .byte(CharacteristicId::Adv1Flags)
                .unwrap_or(DEFAULT_ADV_FLAGS),
            parameters: [
                registry
                    .u32_le(CharacteristicId::Adv1Parameter0)
                    .unwrap_or(DEFAULT_ADV_PARAMETER),
                registry
                    .u32_le(CharacteristicId::Adv1Parameter1)
                    .unwrap_or(DEFAULT_ADV_PARAMETER),
                registry
                    .u32_le(CharacteristicId::Adv1Parameter2)
                    .unwrap_or(DEFAULT_ADV_PARAMETER),
            ],
        }
    }

    /// Burst mode is active iff the duration is non-zero and the burst
    /// interval exceeds it. Anything else advertises steadily.
    pub fn is_burst_mode(&self) -> bool {
        self.burst_duration_ms > 0 && self.burst_interval_ms > self.burst_duration_ms
    }

    fn radio_params(&self) -> AdvertisingParams<'_> {
        AdvertisingParams {
            local_name: &self.device_name,
            interval_ms: self.interval_ms,
            manufacturer_id: VENDOR_COMPANY_ID,
            manufacturer_data: &[],
        }
    }
}

/// The paired deadlines of one burst cycle, armed together when the radio
/// is programmed. Dropping the cycle (by leaving the `select` that awaits
/// it) cancels both deadlines atomically.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct BurstCycle {
    /// Radio goes quiet here, `burst_duration_ms` after programming.
    sleep_at: Instant,
    /// Radio wakes and re-broadcasts here, `burst_interval_ms` after
    /// programming.
    wake_at: Instant,
}

impl BurstCycle {
    fn arm(config: &AdvertisingConfig) -> Option<Self> {
        if !config.is_burst_mode() {
            return None;
        }
        let now = Instant::now();
        Some(Self {
            sleep_at: now + Duration::from_millis(config.burst_duration_ms as u64),
            wake_at: now + Duration::from_millis(config.burst_interval_ms as u64),
        })
    }
}

/// Coordinates advertising reconfiguration with the burst cycle.
pub struct AdvertisingScheduler {
    updates: Signal<CriticalSectionRawMutex, AdvertisingConfig>,
}

impl AdvertisingScheduler {
    pub const fn new() -> Self {
        Self {
            updates: Signal::new(),
        }
    }

    /// Schedule a re-program of the radio from the registry's current
    /// advertising fields. Re-entrant: a refresh landing mid-cycle cancels
    /// the outstanding sleep/wake pair before anything new is armed, and
    /// consecutive refreshes coalesce to the latest configuration.
    pub fn refresh(&self, registry: &CharacteristicRegistry) {
        self.updates.signal(AdvertisingConfig::from_registry(registry));
    }

    /// Drive the radio with the current configuration forever.
    ///
    /// Spawned (or selected into the main loop) by the integrating
    /// firmware. Each pass programs the radio; in burst mode the radio then
    /// sleeps at the duration deadline and wakes at the interval deadline,
    /// re-broadcasting with the configuration current at wake time.
    pub async fn run<R: Radio>(&self, radio: &mut R, initial: AdvertisingConfig) -> ! {
        let mut config = initial;
        loop {
            debug!(
                "Programming advertising: interval {} ms, burst {}/{} ms",
                config.interval_ms, config.burst_duration_ms, config.burst_interval_ms
            );
            radio.set_advertising(config.radio_params());

            let Some(cycle) = BurstCycle::arm(&config) else {
                // Steady advertising; nothing to do until reconfigured.
                config = self.updates.wait().await;
                continue;
            };

            match select(Timer::at(cycle.sleep_at), self.updates.wait()).await {
                Either::First(()) => {
                    radio.sleep();
                    match select(Timer::at(cycle.wake_at), self.updates.wait()).await {
                        Either::First(()) => {
                            // Wake and fall through to re-program with the
                            // then-current configuration. A refresh racing
                            // the wake deadline must win, not wait a cycle.
                            radio.wake();
                            if let Some(next) = self.updates.try_take() {
                                config = next;
                            }
                        }
                        Either::Second(next) => {
                            // Reconfigured mid-sleep: the superseded wake
                            // deadline is gone, resume immediately.
                            radio.wake();
                            config = next;
                        }
                    }
                }
                Either::Second(next) => {
                    // Reconfigured mid-burst: both deadlines dropped.
                    config = next;
                }
            }
        }
    }
}

impl Default for AdvertisingScheduler {
    fn default() -> Self {
        Self::new()
    }
}
