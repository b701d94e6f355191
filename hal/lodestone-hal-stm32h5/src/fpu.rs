//! Floating-point unit access

use crate::bus::RegisterBus;
use crate::map::scb;

/// Coprocessor access control for CP10/CP11
pub struct Fpu<B> {
    bus: B,
}

impl<B: RegisterBus> Fpu<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Grant full FPU access to privileged and unprivileged code
    ///
    /// Must run before the first floating-point instruction.
    pub fn enable(&mut self) {
        self.bus.set_bits(scb::CPACR, scb::CPACR_FPU_FULL);
        barrier();
    }

    pub fn is_enabled(&self) -> bool {
        self.bus.bits_set(scb::CPACR, scb::CPACR_FPU_FULL)
    }
}

// CPACR must be visible before the next instruction fetch
#[cfg(all(target_arch = "arm", target_os = "none"))]
fn barrier() {
    cortex_m::asm::dsb();
    cortex_m::asm::isb();
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
fn barrier() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}
