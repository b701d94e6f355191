//! Simulated register bus for host tests
//!
//! A sparse map of register values plus the handful of hardware reactions
//! the drivers wait on: oscillator and PLL ready bits follow their enable
//! bits, SWS follows SW, the voltage regulator reports ready as soon as a
//! scale is selected, BSRR updates ODR (and IDR, as if every pin were looped
//! back), an enabled USART has always finished transmitting, and an enabled
//! RNG always has a word. Any flag can be held low with [`SimBus::stall`] to
//! drive the bounded-wait failure paths.

use core::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::vec::Vec;

use crate::bus::RegisterBus;
use crate::map::{gpio, pwr, rcc, rng, usart};

pub struct SimBus {
    regs: RefCell<BTreeMap<usize, u32>>,
    writes: RefCell<Vec<(usize, u32)>>,
    stalls: RefCell<BTreeMap<usize, u32>>,
    entropy: Cell<u32>,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            regs: RefCell::new(BTreeMap::new()),
            writes: RefCell::new(Vec::new()),
            stalls: RefCell::new(BTreeMap::new()),
            entropy: Cell::new(0x1234_5678),
        }
    }

    /// Raw stored value, ignoring stalls
    pub fn peek(&self, addr: usize) -> u32 {
        self.regs.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Preload a register without logging or triggering reactions
    pub fn poke(&self, addr: usize, value: u32) {
        self.regs.borrow_mut().insert(addr, value);
    }

    /// Hold the bits of `mask` at `addr` low on every read
    pub fn stall(&self, addr: usize, mask: u32) {
        *self.stalls.borrow_mut().entry(addr).or_insert(0) |= mask;
    }

    /// Every write issued through the bus, in order
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.writes.borrow().clone()
    }

    /// Writes that landed inside `[base, base + len)`
    pub fn writes_in(&self, base: usize, len: usize) -> Vec<(usize, u32)> {
        self.writes
            .borrow()
            .iter()
            .copied()
            .filter(|&(addr, _)| addr >= base && addr < base + len)
            .collect()
    }

    pub fn clear_writes(&self) {
        self.writes.borrow_mut().clear();
    }

    fn next_entropy(&self) -> u32 {
        // xorshift32
        let mut x = self.entropy.get();
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.entropy.set(x);
        x
    }

    fn react(&self, addr: usize, value: u32) {
        match addr {
            a if a == rcc::BASE + rcc::CR => {
                let mut cr = value & !(rcc::CR_HSIRDY | rcc::CR_PLL1RDY);
                if value & rcc::CR_HSION != 0 {
                    cr |= rcc::CR_HSIRDY;
                }
                if value & rcc::CR_PLL1ON != 0 {
                    cr |= rcc::CR_PLL1RDY;
                }
                self.poke(a, cr);
            }
            a if a == rcc::BASE + rcc::CFGR1 => {
                let sw = value & rcc::CFGR1_SW_MASK;
                self.poke(a, (value & !rcc::CFGR1_SWS_MASK) | (sw << 3));
            }
            a if a == pwr::BASE + pwr::VOSCR => {
                let vossr = pwr::BASE + pwr::VOSSR;
                self.poke(vossr, self.peek(vossr) | pwr::VOSSR_ACTVOSRDY);
            }
            a if a == rng::BASE + rng::CR => {
                let sr = rng::BASE + rng::SR;
                if value & rng::CR_RNGEN != 0 {
                    self.poke(sr, self.peek(sr) | rng::SR_DRDY);
                }
            }
            a if Self::is_usart(a, usart::CR1) => {
                let isr = a - usart::CR1 + usart::ISR;
                if value & usart::CR1_UE != 0 {
                    self.poke(isr, self.peek(isr) | usart::ISR_TXE | usart::ISR_TC);
                }
            }
            a if Self::is_gpio(a, gpio::BSRR) => {
                let odr = a - gpio::BSRR + gpio::ODR;
                let idr = a - gpio::BSRR + gpio::IDR;
                let level = (self.peek(odr) | (value & 0xFFFF)) & !(value >> 16);
                self.poke(odr, level);
                self.poke(idr, level);
                // BSRR is write-only and reads as zero
                self.poke(a, 0);
            }
            _ => {}
        }
    }

    fn is_usart(addr: usize, offset: usize) -> bool {
        [usart::USART1, usart::USART2, usart::USART3]
            .iter()
            .any(|&base| addr == base + offset)
    }

    fn is_gpio(addr: usize, offset: usize) -> bool {
        let end = gpio::BASE + gpio::BANK_STRIDE * gpio::BANK_COUNT as usize;
        addr >= gpio::BASE && addr < end && (addr - gpio::BASE) % gpio::BANK_STRIDE == offset
    }
}

impl RegisterBus for &SimBus {
    fn read(&self, addr: usize) -> u32 {
        if addr == rng::BASE + rng::DR {
            return self.next_entropy();
        }
        let stalled = self.stalls.borrow().get(&addr).copied().unwrap_or(0);
        self.peek(addr) & !stalled
    }

    fn write(&self, addr: usize, value: u32) {
        self.writes.borrow_mut().push((addr, value));
        self.poke(addr, value);
        self.react(addr, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_bits_follow_enables() {
        let sim = SimBus::new();
        let bus = &sim;
        bus.write(rcc::BASE + rcc::CR, rcc::CR_HSION);
        assert!(bus.bits_set(rcc::BASE + rcc::CR, rcc::CR_HSIRDY));
        assert!(!bus.bits_set(rcc::BASE + rcc::CR, rcc::CR_PLL1RDY));

        bus.set_bits(rcc::BASE + rcc::CR, rcc::CR_PLL1ON);
        assert!(bus.bits_set(rcc::BASE + rcc::CR, rcc::CR_PLL1RDY));
    }

    #[test]
    fn test_stall_masks_reads() {
        let sim = SimBus::new();
        let bus = &sim;
        sim.stall(rcc::BASE + rcc::CR, rcc::CR_HSIRDY);
        bus.write(rcc::BASE + rcc::CR, rcc::CR_HSION);
        assert_eq!(bus.read(rcc::BASE + rcc::CR), rcc::CR_HSION);
    }

    #[test]
    fn test_bsrr_drives_odr_and_idr() {
        let sim = SimBus::new();
        let bus = &sim;
        let bank_c = gpio::BASE + 2 * gpio::BANK_STRIDE;
        bus.write(bank_c + gpio::BSRR, 1 << 4);
        assert_eq!(sim.peek(bank_c + gpio::ODR), 1 << 4);
        assert_eq!(sim.peek(bank_c + gpio::IDR), 1 << 4);
        assert_eq!(sim.peek(bank_c + gpio::BSRR), 0);

        bus.write(bank_c + gpio::BSRR, 1 << (4 + 16));
        assert_eq!(sim.peek(bank_c + gpio::ODR), 0);
    }

    #[test]
    fn test_enabled_usart_reports_tx_ready() {
        let sim = SimBus::new();
        let bus = &sim;
        let isr = usart::USART2 + usart::ISR;
        bus.write(usart::USART2 + usart::CR1, usart::CR1_TE);
        assert_eq!(bus.read(isr), 0);
        bus.set_bits(usart::USART2 + usart::CR1, usart::CR1_UE);
        assert!(bus.bits_set(isr, usart::ISR_TXE | usart::ISR_TC));
    }

    #[test]
    fn test_write_log() {
        let sim = SimBus::new();
        let bus = &sim;
        bus.write(0x10, 1);
        bus.write(0x20, 2);
        assert_eq!(sim.writes(), [(0x10, 1), (0x20, 2)]);
        assert_eq!(sim.writes_in(0x20, 4), [(0x20, 2)]);
        sim.clear_writes();
        assert!(sim.writes().is_empty());
    }
}
