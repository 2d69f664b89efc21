//! Signal colours and intersection identity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of intersections a controller can drive (one coupled pair).
pub const MAX_INTERSECTIONS: usize = 2;

/// The logical state of one three-lamp signal head.
///
/// Exactly one colour holds per intersection at any instant.  `Off` is
/// only shown by the night-blink routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SignalColor {
    #[default]
    Red = b'r',
    Yellow = b'y',
    Green = b'g',
    Off = b'o',
}

impl SignalColor {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            b'r' => Some(Self::Red),
            b'y' => Some(Self::Yellow),
            b'g' => Some(Self::Green),
            b'o' => Some(Self::Off),
            _ => None,
        }
    }

    /// Lamp levels `(red, yellow, green)` for this colour.
    pub const fn lamps(self) -> (bool, bool, bool) {
        match self {
            Self::Red => (true, false, false),
            Self::Yellow => (false, true, false),
            Self::Green => (false, false, true),
            Self::Off => (false, false, false),
        }
    }
}

/// Identity of one intersection in the (at most) coupled pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum IntersectionId {
    One = 1,
    Two = 2,
}

impl IntersectionId {
    pub const ALL: [Self; MAX_INTERSECTIONS] = [Self::One, Self::Two];

    pub fn from_u8(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    /// Zero-based slot index into per-intersection arrays.
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// The other member of the coupled pair.
    pub const fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", *self as u8)
    }
}

/// Live state of one intersection, owned by the cycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intersection {
    pub id: IntersectionId,
    /// Colour currently on the lamps.
    pub colour: SignalColor,
    /// Controller uptime (ms) at which `colour` was last changed.
    pub since_ms: u64,
}

impl Intersection {
    pub fn new(id: IntersectionId) -> Self {
        Self {
            id,
            colour: SignalColor::Red,
            since_ms: 0,
        }
    }
}
