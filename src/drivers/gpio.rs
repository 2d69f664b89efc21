//! Push-pull GPIO output pin.
//!
//! Implements `embedded_hal::digital::OutputPin` over the raw ESP-IDF
//! level call in [`hw_init`], so the lamp-head driver stays generic over
//! any HAL pin.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `gpio_set_level` on a line configured by hw_init.
//! On host/test: writes into the simulated level bank in hw_init.

use embedded_hal::digital::{Error, ErrorKind, ErrorType, OutputPin};

use crate::drivers::hw_init;

/// A failed level write, carrying the IDF error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub i32);

impl Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One configured output line.
#[derive(Debug)]
pub struct GpioOutput {
    gpio: i32,
    high: bool,
}

impl GpioOutput {
    /// Wrap a line already configured as output by `hw_init`.
    pub fn new(gpio: i32) -> Self {
        Self { gpio, high: false }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Level last written successfully.
    pub fn is_set_high(&self) -> bool {
        self.high
    }

    fn write(&mut self, high: bool) -> Result<(), GpioError> {
        hw_init::gpio_write(self.gpio, high).map_err(GpioError)?;
        self.high = high;
        Ok(())
    }
}

impl ErrorType for GpioOutput {
    type Error = GpioError;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}
