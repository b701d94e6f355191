//! Lodestone Hardware Abstraction Layer
//!
//! This crate defines the chip-agnostic traits that the register-level
//! bring-up HAL implements, so board code (LED blinkers, console loggers,
//! MAC address seeding) can be written against the trait instead of a
//! concrete chip.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Board / application code               │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lodestone-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!         ┌───────────────────────┐
//!         │ lodestone-hal-stm32h5 │
//!         └───────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`uart::UartTx`], [`uart::UartRx`] - Blocking serial communication
//! - [`rng::RandomSource`] - Hardware entropy

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod rng;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, IoPin, OutputPin};
pub use rng::RandomSource;
pub use uart::{Uart, UartRx, UartTx};
