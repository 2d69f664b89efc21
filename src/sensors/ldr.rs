//! LDR ambient light sensor driver.
//!
//! Reads the light-dependent resistor divider through an ADC1 channel.
//! Higher readings mean more light.  Classification is done by the
//! ambient monitor; this driver only returns raw counts.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH6 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicI32` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
static SIM_LIGHT_RAW: AtomicI32 = AtomicI32::new(2048);
#[cfg(not(target_os = "espidf"))]
static SIM_LIGHT_FAIL: AtomicBool = AtomicBool::new(false);

/// Inject the raw value returned by the next host reads.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_light_raw(raw: i32) {
    SIM_LIGHT_RAW.store(raw, Ordering::Relaxed);
}

/// Make host reads fail until cleared.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_read_failure(fail: bool) {
    SIM_LIGHT_FAIL.store(fail, Ordering::Relaxed);
}

pub struct LdrSensor {
    total_reads: u32,
    last_raw: Option<i32>,
    _adc_gpio: i32,
}

impl LdrSensor {
    pub fn new(adc_gpio: i32) -> Self {
        Self {
            total_reads: 0,
            last_raw: None,
            _adc_gpio: adc_gpio,
        }
    }

    /// One raw ADC sample.
    pub fn read(&mut self) -> Result<i32, SensorError> {
        self.total_reads = self.total_reads.saturating_add(1);
        let raw = self.read_adc()?;
        self.last_raw = Some(raw);
        Ok(raw)
    }

    /// Last successful raw reading.
    pub fn last_raw(&self) -> Option<i32> {
        self.last_raw
    }

    pub fn total_reads(&self) -> u32 {
        self.total_reads
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<i32, SensorError> {
        use crate::drivers::hw_init;
        hw_init::adc1_read(hw_init::ADC1_CH_LDR).map_err(|rc| {
            log::debug!("LDR ADC read rc={rc}");
            SensorError::AdcReadFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<i32, SensorError> {
        if SIM_LIGHT_FAIL.load(Ordering::Relaxed) {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(SIM_LIGHT_RAW.load(Ordering::Relaxed))
    }
}
