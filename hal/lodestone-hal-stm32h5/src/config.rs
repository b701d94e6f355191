//! Build-time configuration
//!
//! Everything here is fixed by Cargo features and checked at compile time:
//! an out-of-range clock configuration fails the build instead of the boot.

use crate::clock::{ClockConfig, Clocks};
use crate::uart::Instance;

/// Clock tree used by [`ClockTree::new`](crate::ClockTree::new)
#[cfg(not(feature = "smps"))]
pub const CLOCK: ClockConfig = ClockConfig::LDO;

/// Clock tree used by [`ClockTree::new`](crate::ClockTree::new)
#[cfg(feature = "smps")]
pub const CLOCK: ClockConfig = ClockConfig::SMPS;

/// Frequencies after [`CLOCK`] is applied, as returned by
/// [`ClockTree::init`](crate::ClockTree::init) on a default tree
pub const CLOCKS: Clocks = CLOCK.clocks();

/// Console USART for [`Usart::debug`](crate::uart::Usart::debug)
#[cfg(feature = "debug-usart1")]
pub const DEBUG_UART: Instance = Instance::USART1;

/// Console USART for [`Usart::debug`](crate::uart::Usart::debug)
#[cfg(all(feature = "debug-usart2", not(feature = "debug-usart1")))]
pub const DEBUG_UART: Instance = Instance::USART2;

/// Console USART for [`Usart::debug`](crate::uart::Usart::debug)
#[cfg(not(any(feature = "debug-usart1", feature = "debug-usart2")))]
pub const DEBUG_UART: Instance = Instance::USART3;

const _: () = {
    assert!(
        matches!(CLOCK.validate(), Ok(())),
        "clock plan outside the PLL1 ranges or above 250 MHz"
    );
    assert!(CLOCK.flash_timing().latency <= 5, "no flash timing for HCLK");
};
