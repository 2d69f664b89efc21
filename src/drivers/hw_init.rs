//! Boot-time setup of the lamp lines and the LDR channel.
//!
//! Raw ESP-IDF sys calls, run once from `main()` before the first tick.
//! All six lamp lines come out of configuration LOW (dark), and the
//! first tick decides what they show.  Host builds keep the line levels
//! in a bitmap so tests can read them back.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "LDR channel setup rc={rc}"),
            Self::GpioConfigFailed(rc) => write!(f, "lamp line setup rc={rc}"),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Self::Init("ADC1"),
            HwInitError::GpioConfigFailed(_) => Self::Init("GPIO"),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

/// ADC1 channel wired to the LDR divider (GPIO 34).
pub const ADC1_CH_LDR: u32 = 6;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: runs once from main() before any other task touches the pins.
    unsafe {
        init_lamp_lines()?;
        init_ldr_channel()?;
    }
    info!("hw_init: {} lamp lines, LDR on ADC1 CH{ADC1_CH_LDR}", pins::HEAD_GPIOS.len() * 3);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): lamp lines held in memory");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: written once by `init_ldr_channel()` before the loop, read-only after.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
fn esp_ok(rc: esp_err_t, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if rc == ESP_OK as esp_err_t {
        Ok(())
    } else {
        Err(err(rc))
    }
}

#[cfg(target_os = "espidf")]
unsafe fn init_ldr_channel() -> Result<(), HwInitError> {
    let unit = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    esp_ok(
        unsafe { adc_oneshot_new_unit(&unit, &raw mut ADC1_HANDLE) },
        HwInitError::AdcInitFailed,
    )?;

    // 12 dB so the whole 0..3.3 V divider swing maps onto 0..4095.
    let channel = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    esp_ok(
        unsafe { adc_oneshot_config_channel(adc1_handle(), ADC1_CH_LDR, &channel) },
        HwInitError::AdcInitFailed,
    )
}

/// Read one raw ADC1 sample.  Returns the IDF error code on failure.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<i32, i32> {
    let mut raw: i32 = 0;
    // SAFETY: only the tick loop samples, after init_ldr_channel().
    match unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) } {
        rc if rc == ESP_OK as esp_err_t => Ok(raw),
        rc => Err(rc),
    }
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_lamp_lines() -> Result<(), HwInitError> {
    let lines = pins::HEAD_GPIOS.iter().flatten();
    let cfg = gpio_config_t {
        pin_bit_mask: lines.clone().fold(0u64, |mask, &pin| mask | (1u64 << pin)),
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    esp_ok(unsafe { gpio_config(&cfg) }, HwInitError::GpioConfigFailed)?;
    for &pin in lines {
        unsafe { gpio_set_level(pin, 0) };
    }
    Ok(())
}

/// Drive one output line.  Returns the IDF error code on failure.
#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    // SAFETY: only lamp lines configured by init_lamp_lines() reach here.
    match unsafe { gpio_set_level(pin, u32::from(high)) } {
        rc if rc == ESP_OK as esp_err_t => Ok(()),
        rc => Err(rc),
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    sim::set_level(pin, high);
    Ok(())
}

/// Drive every head to RED straight through the GPIO layer.
///
/// Used by the panic hook, where the controller state can no longer be
/// trusted.  Non-red lines go LOW before any RED line goes HIGH.  Write
/// errors are ignored; there is nothing left to report them to.
pub fn force_all_red() {
    for [_, yellow, green] in crate::pins::HEAD_GPIOS {
        let _ = gpio_write(green, false);
        let _ = gpio_write(yellow, false);
    }
    for red in crate::pins::RED_GPIOS {
        let _ = gpio_write(red, true);
    }
}

/// Read back the level last written to an output line (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_gpio_level(pin: i32) -> bool {
    sim::level(pin)
}

/// Host-side output levels, one bit per GPIO number.
#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU64, Ordering};

    static LEVELS: AtomicU64 = AtomicU64::new(0);

    pub fn set_level(pin: i32, high: bool) {
        let Some(bit) = u32::try_from(pin).ok().and_then(|p| 1u64.checked_shl(p)) else {
            return;
        };
        if high {
            LEVELS.fetch_or(bit, Ordering::Relaxed);
        } else {
            LEVELS.fetch_and(!bit, Ordering::Relaxed);
        }
    }

    pub fn level(pin: i32) -> bool {
        u32::try_from(pin)
            .ok()
            .and_then(|p| 1u64.checked_shl(p))
            .is_some_and(|bit| LEVELS.load(Ordering::Relaxed) & bit != 0)
    }
}
