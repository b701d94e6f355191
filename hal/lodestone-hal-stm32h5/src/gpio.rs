//! GPIO control for STM32H5
//!
//! Pins are addressed by packed [`Pin`] identifiers and programmed field by
//! field with read-modify-writes, so configuring one pin never disturbs the
//! other fifteen in its bank. Output levels go through BSRR, which sets or
//! resets bits in a single store.

use core::convert::Infallible;

use crate::bus::{bit, field, RegisterBus};
use crate::map::gpio;
use crate::pin::Pin;
use crate::rcc::{self, Gate};

/// Pin mode (MODER)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Input = 0,
    Output = 1,
    Alternate = 2,
    Analog = 3,
}

/// Output driver (OTYPER)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputType {
    PushPull = 0,
    OpenDrain = 1,
}

/// Slew rate (OSPEEDR)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    Low = 0,
    Medium = 1,
    High = 2,
    VeryHigh = 3,
}

/// Pull resistor (PUPDR)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None = 0,
    Up = 1,
    Down = 2,
}

impl Mode {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Mode::Input,
            1 => Mode::Output,
            2 => Mode::Alternate,
            _ => Mode::Analog,
        }
    }
}

impl OutputType {
    const fn from_bits(bits: u32) -> Self {
        if bits & 1 == 0 {
            OutputType::PushPull
        } else {
            OutputType::OpenDrain
        }
    }
}

impl Speed {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Speed::Low,
            1 => Speed::Medium,
            2 => Speed::High,
            _ => Speed::VeryHigh,
        }
    }
}

impl Pull {
    /// `0b11` is reserved; it reads back as no pull
    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            1 => Pull::Up,
            2 => Pull::Down,
            _ => Pull::None,
        }
    }
}

/// Full electrical configuration of one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    pub mode: Mode,
    pub output_type: OutputType,
    pub speed: Speed,
    pub pull: Pull,
    /// Alternate-function selector, 0-15
    pub alternate: u8,
}

impl PinConfig {
    /// Floating input
    pub const INPUT: Self = Self {
        mode: Mode::Input,
        output_type: OutputType::PushPull,
        speed: Speed::High,
        pull: Pull::None,
        alternate: 0,
    };

    /// Push-pull output
    pub const OUTPUT: Self = Self {
        mode: Mode::Output,
        ..Self::INPUT
    };

    /// Push-pull, high speed, no pull, routed to alternate function `af`
    pub const fn alternate(af: u8) -> Self {
        Self {
            mode: Mode::Alternate,
            alternate: af,
            ..Self::INPUT
        }
    }

    pub const fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    pub const fn with_pull(mut self, pull: Pull) -> Self {
        self.pull = pull;
        self
    }

    pub const fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = output_type;
        self
    }
}

#[inline]
fn bank_base(pin: Pin) -> usize {
    gpio::BASE + gpio::BANK_STRIDE * pin.bank() as usize
}

/// Program `pin`; shared by every driver that claims pins
///
/// The bank clock goes on first. Mode is written last so the pin never
/// drives the line before its driver type, slew rate and pull are in place.
pub(crate) fn configure<B: RegisterBus>(bus: B, pin: Pin, config: PinConfig) {
    let base = bank_base(pin);
    let n = pin.number() as u32;

    rcc::enable(bus, Gate::GpioBank(pin.bank()));

    let (mask, value) = field(n, 1, config.output_type as u32);
    bus.modify(base + gpio::OTYPER, mask, value);

    let (mask, value) = field(n, 2, config.speed as u32);
    bus.modify(base + gpio::OSPEEDR, mask, value);

    let (mask, value) = field(n, 2, config.pull as u32);
    bus.modify(base + gpio::PUPDR, mask, value);

    // AFRL holds pins 0-7, AFRH pins 8-15
    let afr = base + gpio::AFR + 4 * (n as usize >> 3);
    let (mask, value) = field(n & 7, 4, config.alternate as u32);
    bus.modify(afr, mask, value);

    let (mask, value) = field(n, 2, config.mode as u32);
    bus.modify(base + gpio::MODER, mask, value);
}

fn read_input<B: RegisterBus>(bus: B, pin: Pin) -> bool {
    bus.read(bank_base(pin) + gpio::IDR) & bit(pin.number() as u32) != 0
}

fn read_latch<B: RegisterBus>(bus: B, pin: Pin) -> bool {
    bus.read(bank_base(pin) + gpio::ODR) & bit(pin.number() as u32) != 0
}

fn write_level<B: RegisterBus>(bus: B, pin: Pin, high: bool) {
    let mask = bit(pin.number() as u32);
    bus.write(bank_base(pin) + gpio::BSRR, if high { mask } else { mask << 16 });
}

/// All GPIO banks
///
/// Pins are not validated: a bank past `I` or a number past 15 programs
/// whatever lives at the computed address.
pub struct Gpio<B> {
    bus: B,
}

impl<B: RegisterBus> Gpio<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Enable the bank clock and program every field of `pin`, mode last
    pub fn configure(&mut self, pin: Pin, config: PinConfig) {
        configure(self.bus, pin, config);
    }

    /// Floating push-pull input, high speed
    pub fn set_input(&mut self, pin: Pin) {
        self.configure(pin, PinConfig::INPUT);
    }

    /// Push-pull output, high speed, no pull
    pub fn set_output(&mut self, pin: Pin) {
        self.configure(pin, PinConfig::OUTPUT);
    }

    /// Current configuration of `pin`, decoded from the registers
    pub fn config(&self, pin: Pin) -> PinConfig {
        let base = bank_base(pin);
        let n = pin.number() as u32;
        let afr = self.bus.read(base + gpio::AFR + 4 * (n as usize >> 3));

        PinConfig {
            mode: Mode::from_bits(self.bus.read(base + gpio::MODER) >> (n * 2)),
            output_type: OutputType::from_bits(self.bus.read(base + gpio::OTYPER) >> n),
            speed: Speed::from_bits(self.bus.read(base + gpio::OSPEEDR) >> (n * 2)),
            pull: Pull::from_bits(self.bus.read(base + gpio::PUPDR) >> (n * 2)),
            alternate: ((afr >> ((n & 7) * 4)) & 0xF) as u8,
        }
    }

    /// Sample the input data register
    pub fn read(&self, pin: Pin) -> bool {
        read_input(self.bus, pin)
    }

    /// Set or clear the output through BSRR
    pub fn write(&mut self, pin: Pin, high: bool) {
        write_level(self.bus, pin, high);
    }

    /// Drive the opposite of the current output latch
    pub fn toggle(&mut self, pin: Pin) {
        let high = read_latch(self.bus, pin);
        write_level(self.bus, pin, !high);
    }

    /// Configure `pin` as a push-pull output and hand out a handle for it
    pub fn output(&mut self, pin: Pin) -> Flex<B> {
        self.set_output(pin);
        Flex { bus: self.bus, pin }
    }

    /// Configure `pin` as a floating input and hand out a handle for it
    pub fn input(&mut self, pin: Pin) -> Flex<B> {
        self.set_input(pin);
        Flex { bus: self.bus, pin }
    }
}

/// Single configured pin
///
/// Reads go through IDR and writes through BSRR regardless of mode, so a
/// push-pull output can also sample its own level.
pub struct Flex<B> {
    bus: B,
    pin: Pin,
}

impl<B: RegisterBus> Flex<B> {
    pub fn pin(&self) -> Pin {
        self.pin
    }
}

impl<B: RegisterBus> lodestone_hal::gpio::OutputPin for Flex<B> {
    fn set_high(&mut self) {
        write_level(self.bus, self.pin, true);
    }

    fn set_low(&mut self) {
        write_level(self.bus, self.pin, false);
    }

    fn toggle(&mut self) {
        let high = read_latch(self.bus, self.pin);
        write_level(self.bus, self.pin, !high);
    }

    fn is_set_high(&self) -> bool {
        read_latch(self.bus, self.pin)
    }
}

impl<B: RegisterBus> lodestone_hal::gpio::InputPin for Flex<B> {
    fn is_high(&self) -> bool {
        read_input(self.bus, self.pin)
    }
}

impl<B: RegisterBus> embedded_hal::digital::ErrorType for Flex<B> {
    type Error = Infallible;
}

impl<B: RegisterBus> embedded_hal::digital::OutputPin for Flex<B> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        write_level(self.bus, self.pin, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        write_level(self.bus, self.pin, true);
        Ok(())
    }
}

impl<B: RegisterBus> embedded_hal::digital::StatefulOutputPin for Flex<B> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(read_latch(self.bus, self.pin))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!read_latch(self.bus, self.pin))
    }
}

impl<B: RegisterBus> embedded_hal::digital::InputPin for Flex<B> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(read_input(self.bus, self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!read_input(self.bus, self.pin))
    }
}
