//! Task watchdog over the lamp loop.
//!
//! If the main loop stops feeding for longer than the timeout the TWDT
//! panics, the panic hook drives every head RED, and the chip reboots
//! into a fresh cycle.  Host builds only count feeds.

use log::{info, warn};

pub struct Watchdog {
    timeout_ms: u32,
    armed: bool,
    feeds: u32,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        let armed = subscribe_current_task(timeout_ms);
        if armed {
            info!("Watchdog: armed, {timeout_ms} ms");
        }
        Self {
            timeout_ms,
            armed,
            feeds: 0,
        }
    }

    /// Must run at least once per `timeout_ms`.
    pub fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
        if self.armed {
            reset_current_task();
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}

#[cfg(target_os = "espidf")]
fn subscribe_current_task(timeout_ms: u32) -> bool {
    use esp_idf_svc::sys::{
        ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure,
    };

    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: called once from the main task before the loop starts.
    let rc = unsafe { esp_task_wdt_reconfigure(&cfg) };
    if rc != ESP_OK {
        warn!("Watchdog: reconfigure rc={rc}, keeping sdkconfig timeout");
    }
    // SAFETY: a null handle subscribes the calling task.
    let rc = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
    if rc != ESP_OK {
        warn!("Watchdog: subscribe rc={rc}, loop runs unguarded");
    }
    rc == ESP_OK
}

#[cfg(target_os = "espidf")]
fn reset_current_task() {
    // SAFETY: only reached after the calling task was subscribed.
    unsafe {
        esp_idf_svc::sys::esp_task_wdt_reset();
    }
}

#[cfg(not(target_os = "espidf"))]
fn subscribe_current_task(timeout_ms: u32) -> bool {
    warn!("Watchdog(sim): {timeout_ms} ms timeout not enforced");
    false
}

#[cfg(not(target_os = "espidf"))]
fn reset_current_task() {}
