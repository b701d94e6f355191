//! USART driver for STM32H5
//!
//! Blocking, polled, 8N1 serial on USART1-3 with the NUCLEO-H563ZI pin
//! routing. The baud divisor is the plain integer quotient of the bus clock
//! and the baud rate (16x oversampling, no fractional part), so rates that
//! do not divide the bus clock evenly come out slightly fast.
//!
//! The bus clock comes from the [`Clocks`] that
//! [`ClockTree::init`](crate::ClockTree::init) returned, so the divisor
//! always matches the plan that is actually running.

use core::fmt;

use crate::bus::RegisterBus;
use crate::clock::Clocks;
use crate::config;
use crate::error::{Error, Flag};
use crate::gpio::{self, PinConfig};
use crate::map::usart;
use crate::pin::Pin;
use crate::rcc::{self, Gate};
use crate::wait::{await_ready, SpinBudget};

/// Alternate function that routes USART1-3 to their pins
pub const AF_USART: u8 = 7;

/// A USART peripheral, identified by its register block address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instance {
    base: usize,
}

impl Instance {
    /// PA9 / PA10 on APB2
    pub const USART1: Self = Self::from_base(usart::USART1);
    /// PA2 / PA3 on APB1
    pub const USART2: Self = Self::from_base(usart::USART2);
    /// PD8 / PD9 on APB1, wired to the ST-LINK virtual COM port
    pub const USART3: Self = Self::from_base(usart::USART3);

    /// Any USART-compatible block; only the three above can be initialised
    pub const fn from_base(base: usize) -> Self {
        Self { base }
    }

    pub const fn base(self) -> usize {
        self.base
    }

    fn route(self, clocks: &Clocks) -> Option<Route> {
        let route = match self.base {
            usart::USART1 => Route {
                tx: Pin::new('A', 9),
                rx: Pin::new('A', 10),
                gate: Gate::Usart1,
                bus_hz: clocks.pclk2_hz,
            },
            usart::USART2 => Route {
                tx: Pin::new('A', 2),
                rx: Pin::new('A', 3),
                gate: Gate::Usart2,
                bus_hz: clocks.pclk1_hz,
            },
            usart::USART3 => Route {
                tx: Pin::new('D', 8),
                rx: Pin::new('D', 9),
                gate: Gate::Usart3,
                bus_hz: clocks.pclk1_hz,
            },
            _ => return None,
        };
        Some(route)
    }
}

/// Pins, clock gate and kernel clock of one instance
struct Route {
    tx: Pin,
    rx: Pin,
    gate: Gate,
    bus_hz: u32,
}

/// Smallest `BRR` value valid with 16x oversampling
pub const MIN_DIVISOR: u32 = 16;
/// `BRR` is a 16-bit field
pub const MAX_DIVISOR: u32 = 0xFFFF;

/// `BRR` value for `baud` on a `bus_hz` kernel clock, truncated
pub const fn baud_divisor(bus_hz: u32, baud: u32) -> u32 {
    bus_hz / baud
}

/// Uninitialised USART, as handed out by [`Peripherals`](crate::Peripherals)
pub struct UsartPort<B> {
    bus: B,
    instance: Instance,
}

impl<B: RegisterBus> UsartPort<B> {
    pub fn new(bus: B, instance: Instance) -> Self {
        Self { bus, instance }
    }

    pub fn instance(&self) -> Instance {
        self.instance
    }

    /// See [`Usart::init`]
    pub fn init(self, clocks: &Clocks, baud: u32) -> Result<Usart<B>, Error> {
        Usart::init(self.bus, self.instance, clocks, baud)
    }
}

/// Initialised USART
pub struct Usart<B> {
    bus: B,
    instance: Instance,
    budget: SpinBudget,
}

impl<B: RegisterBus> Usart<B> {
    /// Route, clock and enable `instance` at `baud`
    ///
    /// `clocks` are the running bus frequencies. The divisor
    /// `bus_hz / baud` must land in
    /// [`MIN_DIVISOR`]..=[`MAX_DIVISOR`]; at 125 MHz that allows roughly
    /// 1908 baud to 7.8 Mbaud.
    ///
    /// Fails without touching any register if the instance has no known
    /// pin route or the baud rate is out of range. Otherwise the clock and
    /// both pins are set up before the peripheral is enabled, so the lines
    /// never see a half-configured transmitter.
    pub fn init(bus: B, instance: Instance, clocks: &Clocks, baud: u32) -> Result<Self, Error> {
        let Some(route) = instance.route(clocks) else {
            debug!("usart: no route for base {:x}", instance.base());
            return Err(Error::UnsupportedInstance);
        };
        if baud == 0 {
            return Err(Error::InvalidBaudRate);
        }
        let divisor = baud_divisor(route.bus_hz, baud);
        if !(MIN_DIVISOR..=MAX_DIVISOR).contains(&divisor) {
            debug!("usart: {} baud out of range on {} Hz", baud, route.bus_hz);
            return Err(Error::InvalidBaudRate);
        }

        rcc::enable(bus, route.gate);
        gpio::configure(bus, route.tx, PinConfig::alternate(AF_USART));
        gpio::configure(bus, route.rx, PinConfig::alternate(AF_USART));

        let base = instance.base();
        bus.write(base + usart::CR1, 0);
        bus.write(base + usart::BRR, divisor);
        bus.write(base + usart::CR1, usart::CR1_RE | usart::CR1_TE);
        bus.set_bits(base + usart::CR1, usart::CR1_UE);

        debug!("usart: {:x} up at {} baud", base, baud);
        Ok(Self {
            bus,
            instance,
            budget: SpinBudget::Unbounded,
        })
    }

    /// Initialise the build-time debug console ([`config::DEBUG_UART`])
    pub fn debug(bus: B, clocks: &Clocks, baud: u32) -> Result<Self, Error> {
        Self::init(bus, config::DEBUG_UART, clocks, baud)
    }

    /// Bound the per-byte transmit and receive waits
    pub fn with_spin_budget(mut self, budget: SpinBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn instance(&self) -> Instance {
        self.instance
    }

    fn reg(&self, offset: usize) -> usize {
        self.instance.base() + offset
    }

    /// Send one byte, then wait until the data register can take the next
    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        let bus = self.bus;
        bus.write(self.reg(usart::TDR), byte as u32);
        let isr = self.reg(usart::ISR);
        await_ready(self.budget, || bus.bits_set(isr, usart::ISR_TXE))
            .map_err(|_| Error::Timeout(Flag::UsartTxEmpty))
    }

    /// Send every byte of `bytes` in order
    pub fn write_buffer(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Wait until the last byte has left the shift register (ISR.TC)
    ///
    /// Call before disabling the USART or entering a low-power mode;
    /// [`write_byte`](Self::write_byte) only waits for the data register.
    pub fn flush(&mut self) -> Result<(), Error> {
        let bus = self.bus;
        let isr = self.reg(usart::ISR);
        await_ready(self.budget, || bus.bits_set(isr, usart::ISR_TC))
            .map_err(|_| Error::Timeout(Flag::UsartTxComplete))
    }

    /// `true` when a received byte is waiting (ISR.RXNE)
    pub fn read_ready(&self) -> bool {
        self.bus.bits_set(self.reg(usart::ISR), usart::ISR_RXNE)
    }

    /// Low byte of the receive data register
    ///
    /// Does not check [`read_ready`](Self::read_ready); on an empty receiver
    /// this returns whatever RDR last held.
    pub fn read_byte(&mut self) -> u8 {
        (self.bus.read(self.reg(usart::RDR)) & 0xFF) as u8
    }

    fn await_byte(&mut self) -> Result<u8, Error> {
        let bus = self.bus;
        let isr = self.reg(usart::ISR);
        await_ready(self.budget, || bus.bits_set(isr, usart::ISR_RXNE))
            .map_err(|_| Error::Timeout(Flag::UsartRxNotEmpty))?;
        Ok(self.read_byte())
    }
}

/// [`Error`] as an `embedded-io` error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsartError(pub Error);

impl embedded_io::Error for UsartError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0 {
            Error::Timeout(_) => embedded_io::ErrorKind::TimedOut,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl From<Error> for UsartError {
    fn from(e: Error) -> Self {
        UsartError(e)
    }
}

impl<B: RegisterBus> embedded_io::ErrorType for Usart<B> {
    type Error = UsartError;
}

impl<B: RegisterBus> embedded_io::Write for Usart<B> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_buffer(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Usart::flush(self).map_err(UsartError)
    }
}

impl<B: RegisterBus> embedded_io::Read for Usart<B> {
    /// Block for the first byte, then take whatever else is already waiting
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };
        *first = self.await_byte()?;

        let mut count = 1;
        for slot in rest {
            if !self.read_ready() {
                break;
            }
            *slot = self.read_byte();
            count += 1;
        }
        Ok(count)
    }
}

impl<B: RegisterBus> embedded_io::ReadReady for Usart<B> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(Usart::read_ready(self))
    }
}

impl<B: RegisterBus> lodestone_hal::uart::UartTx for Usart<B> {
    type Error = Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Error> {
        self.write_buffer(data)
    }

    fn flush(&mut self) -> Result<(), Error> {
        Usart::flush(self)
    }
}

impl<B: RegisterBus> lodestone_hal::uart::UartRx for Usart<B> {
    type Error = Error;

    fn read_ready(&mut self) -> Result<bool, Error> {
        Ok(Usart::read_ready(self))
    }

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        for slot in buf.iter_mut() {
            *slot = self.await_byte()?;
        }
        Ok(buf.len())
    }
}

// `write!` / `writeln!` straight onto the console
impl<B: RegisterBus> fmt::Write for Usart<B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_buffer(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockConfig, ClockTree};
    use crate::map::{gpio as gpio_map, rcc as rcc_map};
    use crate::sim::SimBus;

    const USART3_TDR: usize = usart::USART3 + usart::TDR;

    fn sent(sim: &SimBus) -> Vec<u8> {
        sim.writes()
            .iter()
            .filter(|&&(addr, _)| addr == USART3_TDR)
            .map(|&(_, value)| value as u8)
            .collect()
    }

    #[test]
    fn test_baud_divisor() {
        assert_eq!(baud_divisor(100_000_000, 115_200), 868);
        // 125 MHz APB1 at the default clock config
        assert_eq!(baud_divisor(125_000_000, 115_200), 1085);
        // Truncates rather than rounds: 125e6 / 9600 = 13020.83
        assert_eq!(baud_divisor(125_000_000, 9_600), 13_020);
    }

    #[test]
    fn test_unsupported_instance_touches_nothing() {
        let sim = SimBus::new();
        let uart4 = Instance::from_base(0x4000_4C00);
        let result = Usart::init(&sim, uart4, &config::CLOCKS, 115_200);
        assert!(matches!(result, Err(Error::UnsupportedInstance)));
        assert!(sim.writes().is_empty());
    }

    #[test]
    fn test_zero_baud_touches_nothing() {
        let sim = SimBus::new();
        let result = Usart::init(&sim, Instance::USART2, &config::CLOCKS, 0);
        assert!(matches!(result, Err(Error::InvalidBaudRate)));
        assert!(sim.writes().is_empty());
    }

    #[test]
    fn test_baud_outside_brr_range_touches_nothing() {
        let sim = SimBus::new();
        // 125e6 / 1200 = 104166 does not fit the 16-bit BRR
        let slow = Usart::init(&sim, Instance::USART3, &config::CLOCKS, 1_200);
        assert!(matches!(slow, Err(Error::InvalidBaudRate)));
        // Divisor below 16
        let fast = Usart::init(&sim, Instance::USART3, &config::CLOCKS, 10_000_000);
        assert!(matches!(fast, Err(Error::InvalidBaudRate)));
        assert!(sim.writes().is_empty());
    }

    #[test]
    fn test_divisor_follows_running_clocks() {
        let sim = SimBus::new();
        let clocks = ClockTree::with_config(&sim, ClockConfig::SMPS)
            .unwrap()
            .init()
            .unwrap();
        assert_eq!(clocks.pclk1_hz, 100_000_000);

        UsartPort::new(&sim, Instance::USART3)
            .init(&clocks, 115_200)
            .unwrap();
        assert_eq!(sim.peek(usart::USART3 + usart::BRR), 868);
    }

    #[test]
    fn test_init_sequence() {
        let sim = SimBus::new();
        let usart = Usart::init(&sim, Instance::USART3, &config::CLOCKS, 115_200).unwrap();
        assert_eq!(usart.instance(), Instance::USART3);

        // Clock on the right APB1 bit, GPIOD clock for the pins
        assert_eq!(sim.peek(rcc_map::BASE + rcc_map::APB1LENR), 1 << 18);
        assert_eq!(sim.peek(rcc_map::BASE + rcc_map::AHB2ENR), 1 << 3);

        // PD8 / PD9 in AF7
        let bank_d = gpio_map::BASE + 3 * gpio_map::BANK_STRIDE;
        assert_eq!(sim.peek(bank_d + gpio_map::MODER), 0b1010 << 16);
        assert_eq!(sim.peek(bank_d + gpio_map::AFR + 4), 0x77);

        let divisor = baud_divisor(config::CLOCKS.pclk1_hz, 115_200);
        assert_eq!(
            sim.writes_in(usart::USART3, 0x400),
            [
                (usart::USART3 + usart::CR1, 0),
                (usart::USART3 + usart::BRR, divisor),
                (usart::USART3 + usart::CR1, usart::CR1_RE | usart::CR1_TE),
                (
                    usart::USART3 + usart::CR1,
                    usart::CR1_RE | usart::CR1_TE | usart::CR1_UE
                ),
            ]
        );
    }

    #[test]
    fn test_usart1_uses_apb2() {
        let sim = SimBus::new();
        Usart::init(&sim, Instance::USART1, &config::CLOCKS, 115_200).unwrap();
        assert_eq!(sim.peek(rcc_map::BASE + rcc_map::APB2ENR), 1 << 14);
        assert_eq!(
            sim.peek(usart::USART1 + usart::BRR),
            baud_divisor(config::CLOCKS.pclk2_hz, 115_200)
        );
    }

    #[test]
    fn test_write_buffer_and_fmt() {
        use core::fmt::Write as _;

        let sim = SimBus::new();
        let mut usart = Usart::init(&sim, Instance::USART3, &config::CLOCKS, 115_200).unwrap();
        usart.write_buffer(b"OK\n").unwrap();
        write!(usart, "{}", 42).unwrap();
        assert_eq!(sent(&sim), b"OK\n42");
    }

    #[test]
    fn test_stuck_transmitter_times_out() {
        let sim = SimBus::new();
        sim.stall(usart::USART3 + usart::ISR, usart::ISR_TXE);
        let mut usart = Usart::init(&sim, Instance::USART3, &config::CLOCKS, 115_200)
            .unwrap()
            .with_spin_budget(SpinBudget::Iterations(8));

        assert_eq!(
            usart.write_byte(b'x'),
            Err(Error::Timeout(Flag::UsartTxEmpty))
        );
        // The byte itself was still handed over
        assert_eq!(sent(&sim), b"x");
    }

    #[test]
    fn test_flush_waits_for_transmission_complete() {
        use embedded_io::Write as _;

        let sim = SimBus::new();
        let mut usart = Usart::init(&sim, Instance::USART3, &config::CLOCKS, 115_200).unwrap();
        usart.write_all(b"bye").unwrap();
        assert_eq!(embedded_io::Write::flush(&mut usart), Ok(()));
        assert_eq!(sent(&sim), b"bye");
    }

    #[test]
    fn test_flush_times_out_on_stuck_shifter() {
        use lodestone_hal::uart::UartTx;

        let sim = SimBus::new();
        sim.stall(usart::USART3 + usart::ISR, usart::ISR_TC);
        let mut usart = Usart::init(&sim, Instance::USART3, &config::CLOCKS, 115_200)
            .unwrap()
            .with_spin_budget(SpinBudget::Iterations(4));

        // The data register still drains, only the shifter is stuck
        usart.write_byte(b'x').unwrap();
        assert_eq!(
            embedded_io::Write::flush(&mut usart),
            Err(UsartError(Error::Timeout(Flag::UsartTxComplete)))
        );
        assert_eq!(
            UartTx::flush(&mut usart),
            Err(Error::Timeout(Flag::UsartTxComplete))
        );
    }

    #[test]
    fn test_receive() {
        let sim = SimBus::new();
        let mut usart = Usart::init(&sim, Instance::USART3, &config::CLOCKS, 115_200).unwrap();
        assert!(!usart.read_ready());

        sim.poke(usart::USART3 + usart::RDR, 0x1_41);
        sim.poke(usart::USART3 + usart::ISR, usart::ISR_RXNE);
        assert!(usart.read_ready());
        assert_eq!(usart.read_byte(), b'A');
    }

    #[test]
    fn test_embedded_io_read_without_data_times_out() {
        use embedded_io::{Error as _, ErrorKind, Read};

        let sim = SimBus::new();
        let mut usart = Usart::init(&sim, Instance::USART3, &config::CLOCKS, 115_200)
            .unwrap()
            .with_spin_budget(SpinBudget::Iterations(4));

        let mut buf = [0u8; 4];
        let err = usart.read(&mut buf).unwrap_err();
        assert_eq!(err, UsartError(Error::Timeout(Flag::UsartRxNotEmpty)));
        assert_eq!(err.kind(), ErrorKind::TimedOut);
        assert_eq!(usart.read(&mut [0u8; 0]), Ok(0));
    }

    #[test]
    fn test_debug_console_instance() {
        let sim = SimBus::new();
        let usart = Usart::debug(&sim, &config::CLOCKS, 115_200).unwrap();
        assert_eq!(usart.instance(), config::DEBUG_UART);
    }
}
