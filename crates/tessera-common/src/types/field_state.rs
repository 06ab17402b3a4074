//! Per-field load state.

use std::fmt;

/// The (`Available`, `Null`) pair describing a field.
///
/// `Null` is only meaningful when `Available` is set. The two bits map
/// directly onto the packed state words kept by owning containers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct FieldState(u8);

impl FieldState {
    /// Not loaded yet.
    pub const UNAVAILABLE: Self = Self(0);
    /// Loaded with a non-null value.
    pub const AVAILABLE: Self = Self(Self::AVAILABLE_BIT);
    /// Loaded with the null value.
    pub const AVAILABLE_NULL: Self = Self(Self::AVAILABLE_BIT | Self::NULL_BIT);

    const AVAILABLE_BIT: u8 = 0b01;
    const NULL_BIT: u8 = 0b10;

    /// Creates a state from its two packed bits. Extra bits are ignored, and a
    /// null bit without the available bit is dropped.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        if bits & Self::AVAILABLE_BIT == 0 {
            Self::UNAVAILABLE
        } else {
            Self(bits & (Self::AVAILABLE_BIT | Self::NULL_BIT))
        }
    }

    /// Returns the packed bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if a value has been supplied.
    #[inline]
    #[must_use]
    pub const fn is_available(self) -> bool {
        self.0 & Self::AVAILABLE_BIT != 0
    }

    /// Returns true if the supplied value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == Self::AVAILABLE_NULL.0
    }

    /// Returns true if a non-null value is present.
    #[inline]
    #[must_use]
    pub const fn has_value(self) -> bool {
        self.0 == Self::AVAILABLE.0
    }
}

impl fmt::Debug for FieldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UNAVAILABLE => write!(f, "Unavailable"),
            Self::AVAILABLE_NULL => write!(f, "Null"),
            _ => write!(f, "Available"),
        }
    }
}
