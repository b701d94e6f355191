//! STM32H563 HAL for the Lodestone bring-up firmware
//!
//! Register-level drivers for the pieces a NUCLEO-H563ZI needs before an
//! application can run: the clock tree, GPIO, the USART console, the RNG,
//! the Ethernet pin and clock wiring, the unique ID (and the MAC address
//! derived from it), the FPU and heap bookkeeping. Chip-agnostic traits
//! come from `lodestone-hal`.
//!
//! # Features
//!
//! - `defmt` - Enable defmt logging and `defmt::Format` on public types
//! - `smps` - 200 MHz clock plan for SMPS-supplied packages
//! - `debug-usart1` / `debug-usart2` - Console on USART1 / USART2 instead
//!   of USART3
//! - `critical-section-single-core` - Use cortex-m's single-core
//!   critical-section implementation
//!
//! # Usage
//!
//! ```ignore
//! let mut p = lodestone_hal_stm32h5::Peripherals::take().unwrap();
//! p.fpu.enable();
//! let clocks = p.clock.init()?;
//! let mut console = p.usart3.init(&clocks, 115_200)?;
//! writeln!(console, "mac {:02x?}", p.uid.mac_address())?;
//! ```
//!
//! Bring the clock tree up before initialising anything clocked from it;
//! the USARTs take the [`Clocks`] it returns to size their dividers.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

pub mod bus;
pub mod clock;
pub mod config;
pub mod error;
pub mod eth;
pub mod fpu;
pub mod gpio;
pub mod heap;
pub mod map;
pub mod pin;
pub mod power;
pub mod rcc;
pub mod rng;
pub mod uart;
pub mod uid;
pub mod wait;

#[cfg(test)]
mod sim;

use core::sync::atomic::{AtomicBool, Ordering};

pub use bus::{Mmio, RegisterBus};
pub use clock::{ClockConfig, ClockTree, Clocks, Step};
pub use error::{Error, Flag};
pub use eth::Ethernet;
pub use fpu::Fpu;
pub use gpio::{Flex, Gpio, PinConfig};
pub use heap::HeapTracker;
pub use pin::Pin;
pub use power::Power;
pub use rng::Rng;
pub use uart::{Instance, Usart, UsartError, UsartPort};
pub use uid::{locally_administered_mac, UniqueId};
pub use wait::SpinBudget;

// Re-export the trait crate
pub use lodestone_hal;

/// Every peripheral handle this crate drives
pub struct Peripherals<B> {
    pub clock: ClockTree<B>,
    pub power: Power<B>,
    pub gpio: Gpio<B>,
    pub usart1: UsartPort<B>,
    pub usart2: UsartPort<B>,
    pub usart3: UsartPort<B>,
    pub rng: Rng<B>,
    pub ethernet: Ethernet<B>,
    pub uid: UniqueId<B>,
    pub fpu: Fpu<B>,
}

impl<B: RegisterBus> Peripherals<B> {
    /// Handles for an arbitrary register bus
    pub fn new(bus: B) -> Self {
        Self {
            clock: ClockTree::new(bus),
            power: Power::new(bus),
            gpio: Gpio::new(bus),
            usart1: UsartPort::new(bus, Instance::USART1),
            usart2: UsartPort::new(bus, Instance::USART2),
            usart3: UsartPort::new(bus, Instance::USART3),
            rng: Rng::new(bus),
            ethernet: Ethernet::new(bus),
            uid: UniqueId::new(bus),
            fpu: Fpu::new(bus),
        }
    }
}

static TAKEN: AtomicBool = AtomicBool::new(false);

impl Peripherals<Mmio> {
    /// Claim the hardware handles; `None` after the first call
    pub fn take() -> Option<Self> {
        critical_section::with(|_| {
            if TAKEN.load(Ordering::Relaxed) {
                return None;
            }
            TAKEN.store(true, Ordering::Relaxed);
            // SAFETY: the flag above guarantees this is the only bundle
            // handed out through `take`.
            Some(unsafe { Self::steal() })
        })
    }

    /// Hardware handles without the singleton check
    ///
    /// # Safety
    ///
    /// See [`Mmio::steal`]. Two bundles programming the same block race.
    pub unsafe fn steal() -> Self {
        Self::new(Mmio::steal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBus;
    use core::fmt::Write as _;

    #[test]
    fn test_take_is_a_singleton() {
        assert!(Peripherals::<Mmio>::take().is_some());
        assert!(Peripherals::<Mmio>::take().is_none());
    }

    #[test]
    fn test_boot_sequence_on_simulated_bus() {
        let sim = SimBus::new();
        sim.poke(map::uid::BASE, 0x0000_0401);
        let mut p = Peripherals::new(&sim);

        p.fpu.enable();
        let clocks = p.clock.init().unwrap();
        assert_eq!(clocks, config::CLOCKS);

        p.rng.init();
        assert_ne!(p.rng.read().unwrap(), 0);

        p.ethernet.init();

        let mut console = p.usart3.init(&clocks, 115_200).unwrap();
        write!(console, "up").unwrap();
        console.flush().unwrap();
        assert_eq!(p.uid.mac_address()[..3], [0x02, 0x01, 0x01]);

        let led = Pin::new('B', 0);
        let mut led = p.gpio.output(led);
        lodestone_hal::gpio::OutputPin::set_high(&mut led);
        assert!(p.gpio.read(led.pin()));
    }
}
