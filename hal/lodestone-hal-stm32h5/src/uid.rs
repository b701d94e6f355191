//! 96-bit unique device ID and the MAC address derived from it

use crate::bus::RegisterBus;
use crate::map::uid;

/// Unique ID region handle
pub struct UniqueId<B> {
    bus: B,
}

impl<B: RegisterBus> UniqueId<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// The three ID words, lowest address first
    ///
    /// The region only tolerates 32-bit reads, which is all the bus does.
    pub fn words(&self) -> [u32; 3] {
        [
            self.bus.read(uid::BASE),
            self.bus.read(uid::BASE + 4),
            self.bus.read(uid::BASE + 8),
        ]
    }

    /// Board MAC address, see [`locally_administered_mac`]
    pub fn mac_address(&self) -> [u8; 6] {
        locally_administered_mac(self.words())
    }
}

/// Locally administered unicast MAC built from the unique ID
///
/// The first octet is fixed at `0x02`; the rest are bytes picked out of the
/// ID words. Two chips can collide, so treat it as a default, not a
/// guarantee.
pub const fn locally_administered_mac(words: [u32; 3]) -> [u8; 6] {
    let [w0, w1, w2] = words;
    [
        0x02,
        w0 as u8,
        (w0 >> 10) as u8,
        (w0 >> 19) as u8,
        w1 as u8,
        w2 as u8,
    ]
}
