//! Register access
//!
//! Every driver in this crate talks to hardware through [`RegisterBus`],
//! never through raw pointers of its own. On the target the bus is [`Mmio`],
//! which performs volatile 32-bit accesses at the RM0481 addresses; under
//! test it is the simulated bus in `sim`.

/// 32-bit register access at absolute addresses
///
/// Implemented for zero-sized hardware handles and for shared references
/// to simulated buses, so driver handles can copy it freely.
pub trait RegisterBus: Copy {
    /// Read the 32-bit register at `addr`
    fn read(&self, addr: usize) -> u32;

    /// Write `value` to the 32-bit register at `addr`
    fn write(&self, addr: usize, value: u32);

    /// Read-modify-write: clear the bits in `clear`, then set the bits in `set`
    ///
    /// Not atomic with respect to interrupt handlers touching the same
    /// register.
    #[inline]
    fn modify(&self, addr: usize, clear: u32, set: u32) {
        let value = self.read(addr);
        self.write(addr, (value & !clear) | set);
    }

    /// Set the bits in `mask`, leaving the rest untouched
    #[inline]
    fn set_bits(&self, addr: usize, mask: u32) {
        self.modify(addr, 0, mask);
    }

    /// Check whether every bit of `mask` is set
    #[inline]
    fn bits_set(&self, addr: usize, mask: u32) -> bool {
        self.read(addr) & mask == mask
    }
}

/// Volatile memory-mapped I/O on the real chip
///
/// Holding an `Mmio` is permission to touch any peripheral register, so it
/// can only be created through [`Mmio::steal`] or
/// [`Peripherals::take`](crate::Peripherals::take).
#[derive(Debug, Clone, Copy)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Create a hardware bus handle
    ///
    /// # Safety
    ///
    /// The caller must be running on an STM32H563 and must make sure no
    /// other code programs the same registers concurrently. Drivers built on
    /// this handle do not validate addresses.
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Mmio {
    #[inline(always)]
    fn read(&self, addr: usize) -> u32 {
        // SAFETY: `Mmio` only exists on the target (see `steal`), where
        // every address handed in by this crate is an aligned peripheral
        // register.
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    #[inline(always)]
    fn write(&self, addr: usize, value: u32) {
        // SAFETY: as for `read`.
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }
}

/// Single-bit mask
#[inline(always)]
pub(crate) const fn bit(n: u32) -> u32 {
    1 << n
}

/// Mask and value for a `width`-bit field repeated once per pin
///
/// `field(pin, 2, 3)` addresses bits 6..8, the layout of MODER, OSPEEDR and
/// PUPDR.
#[inline(always)]
pub(crate) const fn field(index: u32, width: u32, value: u32) -> (u32, u32) {
    let shift = index * width;
    let mask = ((1 << width) - 1) << shift;
    (mask, (value << shift) & mask)
}
