//! Monotonic millisecond clock for the loop.
//!
//! The tick scheduler and both reconnect backoffs compare against
//! [`MonotonicClock::now_ms`].  On the device it is the ESP-IDF
//! high-resolution timer; on the host it is `std::time::Instant` taken
//! when the clock is built.

pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    origin: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            origin: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn now_ms(&self) -> u64 {
        // SAFETY: reads the free-running esp_timer counter.
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        u64::try_from(us).unwrap_or(0) / 1_000
    }

    /// Milliseconds since the clock was built.
    #[cfg(not(target_os = "espidf"))]
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
