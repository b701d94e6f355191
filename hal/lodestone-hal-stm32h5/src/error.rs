//! Error types

use core::fmt;

use crate::clock::Step;

/// Hardware flag a bounded wait gave up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flag {
    /// USART ISR.TXE: transmit data register never emptied
    UsartTxEmpty,
    /// USART ISR.TC: the last byte never left the shift register
    UsartTxComplete,
    /// USART ISR.RXNE: no byte arrived
    UsartRxNotEmpty,
    /// RNG SR.DRDY: no random word became available
    RngDataReady,
}

/// Errors reported by the STM32H5 drivers
///
/// With the default unbounded spin budget only the first three variants can
/// occur; the others need a [`SpinBudget::Iterations`](crate::SpinBudget)
/// budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The USART base address is not one this HAL has a pin route for
    UnsupportedInstance,
    /// A baud rate of zero, or one whose divisor does not fit `USART_BRR`
    InvalidBaudRate,
    /// A clock plan outside the PLL1 ranges or above the bus ceilings
    InvalidClockConfig,
    /// A clock bring-up step never reached its ready state
    ClockStalled(Step),
    /// A peripheral flag never rose
    Timeout(Flag),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedInstance => f.write_str("unsupported USART instance"),
            Error::InvalidBaudRate => f.write_str("baud rate out of range for the bus clock"),
            Error::InvalidClockConfig => f.write_str("clock configuration out of range"),
            Error::ClockStalled(step) => write!(f, "clock bring-up stalled at {:?}", step),
            Error::Timeout(flag) => write!(f, "timed out waiting for {:?}", flag),
        }
    }
}
