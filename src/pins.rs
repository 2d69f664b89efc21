//! GPIO / peripheral pin assignments for the controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Intersection 1 lamp head (digital outputs, active HIGH)
// ---------------------------------------------------------------------------

pub const HEAD1_RED_GPIO: i32 = 32;
pub const HEAD1_YELLOW_GPIO: i32 = 33;
pub const HEAD1_GREEN_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Intersection 2 lamp head (digital outputs, active HIGH)
// ---------------------------------------------------------------------------

pub const HEAD2_RED_GPIO: i32 = 18;
pub const HEAD2_YELLOW_GPIO: i32 = 16;
pub const HEAD2_GREEN_GPIO: i32 = 4;

/// Lamp lines per head, in `(red, yellow, green)` order.
pub const HEAD_GPIOS: [[i32; 3]; 2] = [
    [HEAD1_RED_GPIO, HEAD1_YELLOW_GPIO, HEAD1_GREEN_GPIO],
    [HEAD2_RED_GPIO, HEAD2_YELLOW_GPIO, HEAD2_GREEN_GPIO],
];

/// Every RED line, driven directly by the panic path.
pub const RED_GPIOS: [i32; 2] = [HEAD1_RED_GPIO, HEAD2_RED_GPIO];

// ---------------------------------------------------------------------------
// Ambient light sensor (ADC1)
// ---------------------------------------------------------------------------

/// LDR voltage divider.  ADC1 channel 6 (GPIO 34, input-only on ESP32).
pub const LDR_ADC_GPIO: i32 = 34;
