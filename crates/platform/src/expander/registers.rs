//! MCP23016 register map.
//!
//! Reference: Microchip MCP23016 datasheet (DS20090), table 1-3.

/// Default 7-bit address with A2..A0 strapped low.
pub const DEFAULT_ADDRESS: u8 = 0x20;

/// R/W bit value for a write phase.
pub const WRITE: u8 = 0;
/// R/W bit value for a read phase.
pub const READ: u8 = 1;

/// Build the first byte on the wire: `address << 1 | R/W`.
#[inline]
#[must_use]
pub const fn address_byte(address: u8, read: bool) -> u8 {
    address.wrapping_shl(1) | if read { READ } else { WRITE }
}

/// Device register. Fixed by silicon, never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Data port 0.
    Gp0 = 0x00,
    /// Data port 1.
    Gp1 = 0x01,
    /// Output latch 0.
    Olat0 = 0x02,
    /// Output latch 1.
    Olat1 = 0x03,
    /// Input polarity port 0.
    Ipol0 = 0x04,
    /// Input polarity port 1.
    Ipol1 = 0x05,
    /// I/O direction port 0 (1 = input).
    Iodir0 = 0x06,
    /// I/O direction port 1 (1 = input).
    Iodir1 = 0x07,
    /// Interrupt capture port 0.
    Intcap0 = 0x08,
    /// Interrupt capture port 1.
    Intcap1 = 0x09,
    /// I/O expander control 0.
    Iocon0 = 0x0A,
    /// I/O expander control 1.
    Iocon1 = 0x0B,
}

impl Register {
    /// Every register in address order.
    pub const ALL: [Self; 12] = [
        Self::Gp0,
        Self::Gp1,
        Self::Olat0,
        Self::Olat1,
        Self::Ipol0,
        Self::Ipol1,
        Self::Iodir0,
        Self::Iodir1,
        Self::Intcap0,
        Self::Intcap1,
        Self::Iocon0,
        Self::Iocon1,
    ];

    /// Register address byte.
    #[inline]
    #[must_use]
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Look up a register by address.
    #[must_use]
    pub fn from_addr(addr: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.addr() == addr)
    }
}

/// One of the two 8-bit ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    /// GP0 and its companion registers.
    P0,
    /// GP1 and its companion registers.
    P1,
}

impl Port {
    /// Data register.
    #[must_use]
    pub const fn data(self) -> Register {
        match self {
            Self::P0 => Register::Gp0,
            Self::P1 => Register::Gp1,
        }
    }

    /// Output latch register.
    #[must_use]
    pub const fn latch(self) -> Register {
        match self {
            Self::P0 => Register::Olat0,
            Self::P1 => Register::Olat1,
        }
    }

    /// Polarity register.
    #[must_use]
    pub const fn polarity(self) -> Register {
        match self {
            Self::P0 => Register::Ipol0,
            Self::P1 => Register::Ipol1,
        }
    }

    /// Direction register.
    #[must_use]
    pub const fn direction(self) -> Register {
        match self {
            Self::P0 => Register::Iodir0,
            Self::P1 => Register::Iodir1,
        }
    }

    /// Interrupt capture register.
    #[must_use]
    pub const fn capture(self) -> Register {
        match self {
            Self::P0 => Register::Intcap0,
            Self::P1 => Register::Intcap1,
        }
    }
}
