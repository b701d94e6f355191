//! GPIO pin abstractions
//!
//! Digital input and output pins as seen by board code. The chip HAL
//! provides the register manipulation underneath.

/// Digital output pin
///
/// Setting a level must not glitch the other pins of the same bank.
pub trait OutputPin {
    /// Drive the pin high (logic 1)
    fn set_high(&mut self);

    /// Drive the pin low (logic 0)
    fn set_low(&mut self);

    /// Invert the driven level
    fn toggle(&mut self);

    /// Drive the pin to a specific level
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the output latch is currently high
    fn is_set_high(&self) -> bool;

    /// Check if the output latch is currently low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// Pin that can be both driven and sampled
///
/// A push-pull output reads back its own level through the input stage,
/// which is how a bring-up test confirms a pin is actually wired.
pub trait IoPin: OutputPin + InputPin {}

// Blanket implementation for types that implement both traits
impl<T: OutputPin + InputPin> IoPin for T {}
