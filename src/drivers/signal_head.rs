//! Three-lamp signal head driver.
//!
//! Maps a [`SignalColor`] to the red/yellow/green output lines of one
//! intersection.  Generic over any `embedded_hal` output pin.
//!
//! Lines that must go dark are switched first and the lit line last, so
//! two lamps of one head are never on together.  The head owns its three
//! pins and nothing else; the colour on show lives in the cycle engine.

use embedded_hal::digital::OutputPin;
use log::trace;

use crate::signal::SignalColor;

pub struct SignalHead<P: OutputPin> {
    red: P,
    yellow: P,
    green: P,
}

impl<P: OutputPin> SignalHead<P> {
    pub fn new(red: P, yellow: P, green: P) -> Self {
        Self {
            red,
            yellow,
            green,
        }
    }

    /// Drive the lamp lines for `colour`: one line HIGH, or all LOW for `Off`.
    pub fn show(&mut self, colour: SignalColor) -> Result<(), P::Error> {
        let (r, y, g) = colour.lamps();
        trace!("head -> {colour:?}");

        // Dark lines first.
        if !r {
            self.red.set_low()?;
        }
        if !y {
            self.yellow.set_low()?;
        }
        if !g {
            self.green.set_low()?;
        }

        if r {
            self.red.set_high()?;
        } else if y {
            self.yellow.set_high()?;
        } else if g {
            self.green.set_high()?;
        }

        Ok(())
    }
}
