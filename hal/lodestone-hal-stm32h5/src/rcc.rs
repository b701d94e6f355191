//! Peripheral clock gates
//!
//! The `RCC_*ENR` registers are shared by every driver: the GPIO banks, the
//! USARTs, the RNG and the Ethernet wiring all set their own bit in one of
//! them. Those read-modify-writes go through [`enable`], which runs inside a
//! critical section so two drivers cannot lose each other's bit.

use crate::bus::{bit, RegisterBus};
use crate::map::rcc;

/// A peripheral clock-enable bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gate {
    /// GPIO bank by index (A = 0)
    GpioBank(u8),
    Rng,
    Usart1,
    Usart2,
    Usart3,
    /// System configuration block (SBS)
    Sbs,
    /// Ethernet MAC plus its TX and RX clocks
    Ethernet,
}

impl Gate {
    /// Enable register offset and bit mask
    const fn location(self) -> (usize, u32) {
        match self {
            Gate::GpioBank(bank) => (rcc::AHB2ENR, bit(bank as u32)),
            Gate::Rng => (rcc::AHB2ENR, rcc::AHB2ENR_RNGEN),
            Gate::Usart1 => (rcc::APB2ENR, rcc::APB2ENR_USART1EN),
            Gate::Usart2 => (rcc::APB1LENR, rcc::APB1LENR_USART2EN),
            Gate::Usart3 => (rcc::APB1LENR, rcc::APB1LENR_USART3EN),
            Gate::Sbs => (rcc::APB3ENR, rcc::APB3ENR_SBSEN),
            Gate::Ethernet => (
                rcc::AHB1ENR,
                rcc::AHB1ENR_ETHEN | rcc::AHB1ENR_ETHTXEN | rcc::AHB1ENR_ETHRXEN,
            ),
        }
    }
}

/// Turn on a peripheral clock; a no-op if it is already running
pub fn enable<B: RegisterBus>(bus: B, gate: Gate) {
    let (offset, mask) = gate.location();
    critical_section::with(|_| bus.set_bits(rcc::BASE + offset, mask));
}

/// Check whether a peripheral clock is running
pub fn is_enabled<B: RegisterBus>(bus: B, gate: Gate) -> bool {
    let (offset, mask) = gate.location();
    bus.bits_set(rcc::BASE + offset, mask)
}

/// Select pll1_q_ck as the RNG kernel clock
pub(crate) fn select_rng_clock<B: RegisterBus>(bus: B) {
    critical_section::with(|_| {
        bus.modify(
            rcc::BASE + rcc::CCIPR5,
            rcc::CCIPR5_RNGSEL_MASK,
            rcc::CCIPR5_RNGSEL_PLL1Q,
        )
    });
}
