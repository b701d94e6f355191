//! Power controller (PWR)
//!
//! Only the supply-configuration status this HAL needs: whether the package
//! runs from the internal LDO, which decides the voltage scale the clock
//! tree may select.

use crate::bus::RegisterBus;
use crate::map::pwr;

/// PWR block handle
pub struct Power<B> {
    bus: B,
}

impl<B: RegisterBus> Power<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// `true` when the internal LDO regulator is enabled (`PWR_SCCR.LDOEN`)
    pub fn ldo_is_on(&self) -> bool {
        ldo_enabled(self.bus)
    }
}

pub(crate) fn ldo_enabled<B: RegisterBus>(bus: B) -> bool {
    bus.bits_set(pwr::BASE + pwr::SCCR, pwr::SCCR_LDOEN)
}
