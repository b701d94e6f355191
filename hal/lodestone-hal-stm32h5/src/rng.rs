//! True random number generator
//!
//! Clocked from pll1_q_ck, so [`ClockTree::init`](crate::ClockTree::init)
//! must have run first. No health-test or seed-error handling: a stuck
//! generator simply never raises DRDY.

use lodestone_hal::rng::RandomSource;

use crate::bus::RegisterBus;
use crate::error::{Error, Flag};
use crate::map::rng;
use crate::rcc::{self, Gate};
use crate::wait::{await_ready, SpinBudget};

/// RNG block handle
pub struct Rng<B> {
    bus: B,
    budget: SpinBudget,
}

impl<B: RegisterBus> Rng<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            budget: SpinBudget::Unbounded,
        }
    }

    /// Bound the wait for each random word
    pub fn with_spin_budget(mut self, budget: SpinBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Select the kernel clock, gate it on and start the generator
    pub fn init(&mut self) {
        rcc::select_rng_clock(self.bus);
        rcc::enable(self.bus, Gate::Rng);
        self.bus.set_bits(rng::BASE + rng::CR, rng::CR_RNGEN);
        debug!("rng: enabled");
    }

    /// Wait for the next 32-bit word
    pub fn read(&mut self) -> Result<u32, Error> {
        let bus = self.bus;
        await_ready(self.budget, || bus.bits_set(rng::BASE + rng::SR, rng::SR_DRDY))
            .map_err(|_| Error::Timeout(Flag::RngDataReady))?;
        Ok(bus.read(rng::BASE + rng::DR))
    }
}

impl<B: RegisterBus> RandomSource for Rng<B> {
    type Error = Error;

    fn next_u32(&mut self) -> Result<u32, Error> {
        self.read()
    }
}
