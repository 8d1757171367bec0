//! Error types for the expander bus stack.

/// Classified cause of a failed bus transaction.
///
/// Derived from [`embedded_hal::i2c::ErrorKind`] so that every HAL's error
/// type collapses onto the same small set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionFault {
    /// Target did not acknowledge its address or a data byte.
    NoAcknowledge,
    /// Misplaced START/STOP or other bus-level error.
    Bus,
    /// Another controller won arbitration.
    ArbitrationLoss,
    /// Controller FIFO overran.
    Overrun,
    /// Anything the HAL could not classify.
    Other,
}

impl TransactionFault {
    /// Collapse a HAL error kind onto a fault.
    #[must_use]
    pub fn from_kind(kind: embedded_hal::i2c::ErrorKind) -> Self {
        use embedded_hal::i2c::ErrorKind;
        match kind {
            ErrorKind::NoAcknowledge(_) => Self::NoAcknowledge,
            ErrorKind::Bus => Self::Bus,
            ErrorKind::ArbitrationLoss => Self::ArbitrationLoss,
            ErrorKind::Overrun => Self::Overrun,
            _ => Self::Other,
        }
    }
}

impl core::fmt::Display for TransactionFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoAcknowledge => write!(f, "no acknowledge"),
            Self::Bus => write!(f, "bus error"),
            Self::ArbitrationLoss => write!(f, "arbitration lost"),
            Self::Overrun => write!(f, "fifo overrun"),
            Self::Other => write!(f, "unclassified fault"),
        }
    }
}

/// Errors returned by the shared bus and the GPIO expander driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExpanderError {
    /// The bus lock could not be acquired within the configured timeout.
    Busy,
    /// The controller reported a failed transaction.
    TransactionFailed(TransactionFault),
    /// A register operation was attempted before a successful bring-up.
    NotInitialized,
    /// Every attempt of a retried read failed.
    ReadExhausted {
        /// Number of attempts made.
        attempts: u8,
    },
}

impl ExpanderError {
    /// Whether this error is a bus fault (as opposed to lock or lifecycle errors).
    #[must_use]
    pub fn is_transaction_fault(&self) -> bool {
        matches!(self, Self::TransactionFailed(_))
    }
}

impl From<TransactionFault> for ExpanderError {
    fn from(fault: TransactionFault) -> Self {
        Self::TransactionFailed(fault)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ExpanderError {}

impl core::fmt::Display for ExpanderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Busy => write!(f, "Bus lock not acquired in time"),
            Self::TransactionFailed(fault) => write!(f, "Bus transaction failed: {fault}"),
            Self::NotInitialized => write!(f, "Expander not initialized"),
            Self::ReadExhausted { attempts } => {
                write!(f, "Register read failed after {attempts} attempts")
            }
        }
    }
}
