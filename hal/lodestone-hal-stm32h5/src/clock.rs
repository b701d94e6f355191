//! Clock tree bring-up
//!
//! Takes the chip from its reset clock (HSI / 2 = 32 MHz) to PLL1 driving
//! SYSCLK. The sequence is a fixed list of [`Step`]s; each one programs its
//! registers and is then held until its post-condition reads true:
//!
//! | # | Step | Writes | Ready when |
//! | - | ---- | ------ | ---------- |
//! | 1 | [`Step::FlashLatency`] | `FLASH_ACR` LATENCY, WRHIGHFREQ | LATENCY reads back |
//! | 2 | [`Step::VoltageScaling`] | `PWR_VOSCR` VOS0 (LDO) or VOS1 | `PWR_VOSSR.ACTVOSRDY` |
//! | 3 | [`Step::Hsi`] | `RCC_CR = HSION` | `RCC_CR.HSIRDY` |
//! | 4 | [`Step::BusPrescalers`] | `RCC_CFGR2` | prescalers read back |
//! | 5 | [`Step::Pll1`] | `RCC_PLL1DIVR`, `RCC_PLL1CFGR`, `RCC_CR.PLL1ON` | `RCC_CR.PLL1RDY` |
//! | 6 | [`Step::SysclkSwitch`] | `RCC_CFGR1.SW = PLL1` | `RCC_CFGR1.SWS = PLL1` |
//!
//! Flash timing has to be relaxed before the frequency goes up, the core
//! voltage has to be raised before PLL1 locks at speed, and PLL1 has to be
//! locked before SYSCLK moves onto it. There is no fallback clock path: with
//! the default unbounded budget a step that never becomes ready hangs boot.

use crate::bus::RegisterBus;
use crate::error::Error;
use crate::map::{flash, pwr, rcc};
use crate::power;
use crate::wait::{await_ready, SpinBudget};

/// Maximum SYSCLK, HCLK and PCLKx in voltage scale 0
pub const MAX_SYSCLK_HZ: u32 = 250_000_000;

/// Build-time clock tree parameters
///
/// PLL1 runs from HSI: `sysclk = hsi / m * n / p`. The prescaler fields hold
/// raw `RCC_CFGR2` selector values: HPRE 0-7 means /1, 8-15 /2 to /512;
/// PPREx 0-3 means /1, 4-7 /2 to /16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    pub hsi_hz: u32,
    pub pll1_m: u32,
    pub pll1_n: u32,
    pub pll1_p: u32,
    pub hpre: u32,
    pub ppre1: u32,
    pub ppre2: u32,
    pub ppre3: u32,
}

impl ClockConfig {
    /// 250 MHz SYSCLK, APB buses at 125 MHz. Needs VOS0, so the package must
    /// run from the internal LDO.
    pub const LDO: Self = Self {
        hsi_hz: 64_000_000,
        pll1_m: 32,
        pll1_n: 250,
        pll1_p: 2,
        hpre: 7,
        ppre1: 4,
        ppre2: 4,
        ppre3: 4,
    };

    /// 200 MHz SYSCLK for SMPS-supplied packages, capped by VOS1
    pub const SMPS: Self = Self {
        pll1_n: 200,
        ..Self::LDO
    };

    /// Check the plan against the PLL1 ranges and the 250 MHz bus ceiling
    ///
    /// Divider fields are checked before any frequency is derived, so an
    /// out-of-range M or P is reported rather than dividing by zero.
    pub const fn validate(&self) -> Result<(), Error> {
        if self.pll1_m < 1 || self.pll1_m > 63 {
            return Err(Error::InvalidClockConfig);
        }
        if self.pll1_n < 4 || self.pll1_n > 512 {
            return Err(Error::InvalidClockConfig);
        }
        if self.pll1_p < 2 || self.pll1_p > 128 || self.pll1_p % 2 != 0 {
            return Err(Error::InvalidClockConfig);
        }
        if self.hpre > 15 || self.ppre1 > 7 || self.ppre2 > 7 || self.ppre3 > 7 {
            return Err(Error::InvalidClockConfig);
        }

        // PLL1CFGR is programmed for the 1-2 MHz input range
        let reference = self.pll1_ref_hz();
        if reference < 1_000_000 || reference > 2_000_000 {
            return Err(Error::InvalidClockConfig);
        }
        let vco = self.pll1_vco_hz();
        if vco < 192_000_000 || vco > 836_000_000 {
            return Err(Error::InvalidClockConfig);
        }

        let clocks = self.clocks();
        if clocks.sysclk_hz > MAX_SYSCLK_HZ
            || clocks.hclk_hz > MAX_SYSCLK_HZ
            || clocks.pclk1_hz > MAX_SYSCLK_HZ
            || clocks.pclk2_hz > MAX_SYSCLK_HZ
            || clocks.pclk3_hz > MAX_SYSCLK_HZ
        {
            return Err(Error::InvalidClockConfig);
        }
        Ok(())
    }

    /// PLL1 reference clock after the M divider
    pub const fn pll1_ref_hz(&self) -> u32 {
        self.hsi_hz / self.pll1_m
    }

    pub const fn pll1_vco_hz(&self) -> u32 {
        self.pll1_ref_hz() * self.pll1_n
    }

    pub const fn sysclk_hz(&self) -> u32 {
        self.pll1_vco_hz() / self.pll1_p
    }

    /// Derived bus frequencies
    pub const fn clocks(&self) -> Clocks {
        let sysclk_hz = self.sysclk_hz();
        let hclk_hz = sysclk_hz / ahb_divisor(self.hpre);
        Clocks {
            sysclk_hz,
            hclk_hz,
            pclk1_hz: hclk_hz / apb_divisor(self.ppre1),
            pclk2_hz: hclk_hz / apb_divisor(self.ppre2),
            pclk3_hz: hclk_hz / apb_divisor(self.ppre3),
        }
    }

    /// Flash wait states and WRHIGHFREQ for this HCLK (RM0481 table 37)
    ///
    /// Frequencies VOS1 can run use the VOS1 column, which is also safe under
    /// VOS0; faster ones fall back to the VOS0 column.
    pub const fn flash_timing(&self) -> FlashTiming {
        let hclk_mhz = self.clocks().hclk_hz / 1_000_000;
        // Upper HCLK bound per wait state, in MHz
        let steps: [u32; 6] = if hclk_mhz <= 200 {
            [34, 68, 102, 136, 170, 200]
        } else {
            [42, 84, 126, 168, 210, 250]
        };

        let mut latency = 0;
        while latency < steps.len() && hclk_mhz > steps[latency] {
            latency += 1;
        }
        let latency = latency as u32;
        FlashTiming {
            latency,
            wrhighfreq: latency / 2,
        }
    }

    /// `RCC_CFGR2` value with all four prescalers
    pub const fn cfgr2(&self) -> u32 {
        (self.ppre3 << rcc::CFGR2_PPRE3_POS)
            | (self.ppre2 << rcc::CFGR2_PPRE2_POS)
            | (self.ppre1 << rcc::CFGR2_PPRE1_POS)
            | (self.hpre << rcc::CFGR2_HPRE_POS)
    }

    /// `RCC_PLL1DIVR` value: P and N, both stored minus one
    pub const fn pll1divr(&self) -> u32 {
        ((self.pll1_p - 1) << rcc::PLL1DIVR_P_POS) | ((self.pll1_n - 1) << rcc::PLL1DIVR_N_POS)
    }

    /// `RCC_PLL1CFGR` value: P and Q outputs on, M divider, HSI source,
    /// wide VCO, 1-2 MHz input range
    pub const fn pll1cfgr(&self) -> u32 {
        rcc::PLL1CFGR_QEN
            | rcc::PLL1CFGR_PEN
            | (self.pll1_m << rcc::PLL1CFGR_M_POS)
            | rcc::PLL1CFGR_SRC_HSI
    }
}

const fn ahb_divisor(hpre: u32) -> u32 {
    match hpre {
        0..=7 => 1,
        8..=11 => 1 << (hpre - 7),
        // /32 is skipped: 12 selects /64
        _ => 1 << (hpre - 6),
    }
}

const fn apb_divisor(ppre: u32) -> u32 {
    if ppre < 4 {
        1
    } else {
        1 << (ppre - 3)
    }
}

/// Flash read timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashTiming {
    /// Wait states (`FLASH_ACR.LATENCY`)
    pub latency: u32,
    /// Programming delay (`FLASH_ACR.WRHIGHFREQ`)
    pub wrhighfreq: u32,
}

/// Frozen bus frequencies after bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    pub sysclk_hz: u32,
    /// AHB
    pub hclk_hz: u32,
    /// APB1: USART2, USART3
    pub pclk1_hz: u32,
    /// APB2: USART1
    pub pclk2_hz: u32,
    /// APB3: SBS
    pub pclk3_hz: u32,
}

/// One stage of clock bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    FlashLatency,
    VoltageScaling,
    Hsi,
    BusPrescalers,
    Pll1,
    SysclkSwitch,
}

impl Step {
    /// Bring-up order; each step relies on the state left by the previous one
    pub const SEQUENCE: [Step; 6] = [
        Step::FlashLatency,
        Step::VoltageScaling,
        Step::Hsi,
        Step::BusPrescalers,
        Step::Pll1,
        Step::SysclkSwitch,
    ];
}

/// RCC, PWR and FLASH handle for clock bring-up
pub struct ClockTree<B> {
    bus: B,
    config: ClockConfig,
    budget: SpinBudget,
}

impl<B: RegisterBus> ClockTree<B> {
    /// Clock tree using the build-time [`config::CLOCK`](crate::config::CLOCK)
    pub fn new(bus: B) -> Self {
        // Checked at compile time in `config`
        Self {
            bus,
            config: crate::config::CLOCK,
            budget: SpinBudget::Unbounded,
        }
    }

    /// Clock tree for a runtime plan, rejected if [`ClockConfig::validate`]
    /// fails
    pub fn with_config(bus: B, config: ClockConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            bus,
            config,
            budget: SpinBudget::Unbounded,
        })
    }

    /// Bound every ready-flag wait instead of spinning forever
    pub fn with_spin_budget(mut self, budget: SpinBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Run the whole bring-up sequence and return the resulting frequencies
    ///
    /// Stops at the first step whose post-condition never holds.
    pub fn init(&mut self) -> Result<Clocks, Error> {
        for step in Step::SEQUENCE {
            self.run_step(step)?;
        }
        let clocks = self.config.clocks();
        info!("clock: SYSCLK {} Hz", clocks.sysclk_hz);
        Ok(clocks)
    }

    /// Program one step and wait for its post-condition
    pub fn run_step(&mut self, step: Step) -> Result<(), Error> {
        trace!("clock: {}", step);
        self.apply(step);
        await_ready(self.budget, || self.is_ready(step)).map_err(|_| {
            warn!("clock: {} never became ready", step);
            Error::ClockStalled(step)
        })
    }

    fn apply(&mut self, step: Step) {
        let bus = self.bus;
        match step {
            Step::FlashLatency => {
                let timing = self.config.flash_timing();
                bus.modify(
                    flash::BASE + flash::ACR,
                    flash::ACR_LATENCY_MASK | flash::ACR_WRHIGHFREQ_MASK,
                    timing.latency | (timing.wrhighfreq << flash::ACR_WRHIGHFREQ_POS),
                );
            }
            Step::VoltageScaling => {
                let vos = if power::ldo_enabled(bus) {
                    pwr::VOSCR_VOS0
                } else {
                    pwr::VOSCR_VOS1
                };
                bus.write(pwr::BASE + pwr::VOSCR, vos);
                // Dummy read-back so the write has reached the PWR block
                // before VOSSR is sampled
                let _ = bus.read(pwr::BASE + pwr::VOSCR);
            }
            Step::Hsi => {
                // Full write: also resets HSIDIV to /1, giving 64 MHz
                bus.write(rcc::BASE + rcc::CR, rcc::CR_HSION);
            }
            Step::BusPrescalers => {
                bus.write(rcc::BASE + rcc::CFGR2, self.config.cfgr2());
            }
            Step::Pll1 => {
                bus.write(rcc::BASE + rcc::PLL1DIVR, self.config.pll1divr());
                bus.write(rcc::BASE + rcc::PLL1CFGR, self.config.pll1cfgr());
                bus.set_bits(rcc::BASE + rcc::CR, rcc::CR_PLL1ON);
            }
            Step::SysclkSwitch => {
                bus.set_bits(rcc::BASE + rcc::CFGR1, rcc::CFGR1_SW_PLL1);
            }
        }
    }

    /// Post-condition of `step`
    pub fn is_ready(&self, step: Step) -> bool {
        let bus = self.bus;
        match step {
            Step::FlashLatency => {
                let latency = bus.read(flash::BASE + flash::ACR) & flash::ACR_LATENCY_MASK;
                latency == self.config.flash_timing().latency
            }
            Step::VoltageScaling => bus.bits_set(pwr::BASE + pwr::VOSSR, pwr::VOSSR_ACTVOSRDY),
            Step::Hsi => bus.bits_set(rcc::BASE + rcc::CR, rcc::CR_HSIRDY),
            Step::BusPrescalers => {
                const PRESCALERS: u32 = 0x7 << 12 | 0x7 << 8 | 0x7 << 4 | 0xF;
                bus.read(rcc::BASE + rcc::CFGR2) & PRESCALERS == self.config.cfgr2()
            }
            Step::Pll1 => bus.bits_set(rcc::BASE + rcc::CR, rcc::CR_PLL1RDY),
            Step::SysclkSwitch => {
                bus.read(rcc::BASE + rcc::CFGR1) & rcc::CFGR1_SWS_MASK == rcc::CFGR1_SWS_PLL1
            }
        }
    }
}
