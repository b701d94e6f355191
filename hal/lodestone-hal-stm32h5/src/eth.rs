//! Ethernet wiring
//!
//! Routes the RMII pins of the NUCLEO-H563ZI to the MAC, unmasks the ETH
//! interrupt, selects RMII in the system configuration block and gates the
//! MAC clocks on. MAC and DMA programming belong to the network stack.

use crate::bus::RegisterBus;
use crate::gpio::{self, PinConfig, Speed};
use crate::map::{irq, nvic, sbs};
use crate::pin::Pin;
use crate::rcc::{self, Gate};

/// Alternate function of the Ethernet pins
pub const AF_ETH: u8 = 11;

/// RMII signals on the NUCLEO-H563ZI
pub const RMII_PINS: [Pin; 9] = [
    Pin::new('A', 1),  // REF_CLK
    Pin::new('A', 2),  // MDIO
    Pin::new('A', 7),  // CRS_DV
    Pin::new('B', 15), // TXD1
    Pin::new('C', 1),  // MDC
    Pin::new('C', 4),  // RXD0
    Pin::new('C', 5),  // RXD1
    Pin::new('G', 11), // TX_EN
    Pin::new('G', 13), // TXD0
];

const PIN_CONFIG: PinConfig = PinConfig::alternate(AF_ETH).with_speed(Speed::VeryHigh);

/// Ethernet wiring handle
pub struct Ethernet<B> {
    bus: B,
}

impl<B: RegisterBus> Ethernet<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Pins, interrupt, RMII selection and MAC clocks, in that order
    pub fn init(&mut self) {
        let bus = self.bus;
        for pin in RMII_PINS {
            gpio::configure(bus, pin, PIN_CONFIG);
        }

        unmask_irq(bus, irq::ETH);

        rcc::enable(bus, Gate::Sbs);
        bus.modify(
            sbs::BASE + sbs::PMCR,
            sbs::PMCR_ETH_SEL_PHY_MASK,
            sbs::PMCR_ETH_SEL_PHY_RMII,
        );

        rcc::enable(bus, Gate::Ethernet);
        debug!("eth: RMII wired, irq {} unmasked", irq::ETH);
    }
}

/// Set-enable an interrupt in the NVIC
///
/// ISER is write-one-to-set, so a plain store leaves other lines alone.
fn unmask_irq<B: RegisterBus>(bus: B, irq: u16) {
    let word = (irq / 32) as usize;
    bus.write(nvic::ISER + 4 * word, 1u32 << (irq % 32));
}
