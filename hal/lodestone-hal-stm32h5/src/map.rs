//! STM32H563 memory map (RM0481, non-secure aliases)
//!
//! Only the registers and fields this crate programs are listed. Offsets are
//! relative to the block base; field constants are already shifted into
//! position unless named `*_POS`.

use crate::bus::bit;

pub mod gpio {
    /// GPIOA; banks B..I follow at `BANK_STRIDE` intervals
    pub const BASE: usize = 0x4202_0000;
    pub const BANK_STRIDE: usize = 0x400;

    pub const MODER: usize = 0x00;
    pub const OTYPER: usize = 0x04;
    pub const OSPEEDR: usize = 0x08;
    pub const PUPDR: usize = 0x0C;
    pub const IDR: usize = 0x10;
    pub const ODR: usize = 0x14;
    pub const BSRR: usize = 0x18;
    /// AFRL at 0x20 covers pins 0-7, AFRH at 0x24 pins 8-15
    pub const AFR: usize = 0x20;

    /// Banks A through I
    pub const BANK_COUNT: u8 = 9;
}

pub mod rcc {
    use super::bit;

    pub const BASE: usize = 0x4402_0C00;

    pub const CR: usize = 0x000;
    pub const CR_HSION: u32 = bit(0);
    pub const CR_HSIRDY: u32 = bit(1);
    pub const CR_PLL1ON: u32 = bit(24);
    pub const CR_PLL1RDY: u32 = bit(25);

    pub const CFGR1: usize = 0x01C;
    pub const CFGR1_SW_MASK: u32 = 0b11;
    pub const CFGR1_SW_PLL1: u32 = 0b11;
    pub const CFGR1_SWS_MASK: u32 = 0b111 << 3;
    pub const CFGR1_SWS_PLL1: u32 = 0b011 << 3;

    pub const CFGR2: usize = 0x020;
    pub const CFGR2_HPRE_POS: u32 = 0;
    pub const CFGR2_PPRE1_POS: u32 = 4;
    pub const CFGR2_PPRE2_POS: u32 = 8;
    pub const CFGR2_PPRE3_POS: u32 = 12;

    pub const PLL1CFGR: usize = 0x028;
    pub const PLL1CFGR_SRC_HSI: u32 = 0b01;
    pub const PLL1CFGR_M_POS: u32 = 8;
    pub const PLL1CFGR_PEN: u32 = bit(16);
    pub const PLL1CFGR_QEN: u32 = bit(17);

    pub const PLL1DIVR: usize = 0x034;
    pub const PLL1DIVR_N_POS: u32 = 0;
    pub const PLL1DIVR_P_POS: u32 = 9;

    pub const AHB1ENR: usize = 0x088;
    pub const AHB1ENR_ETHEN: u32 = bit(19);
    pub const AHB1ENR_ETHTXEN: u32 = bit(20);
    pub const AHB1ENR_ETHRXEN: u32 = bit(21);

    /// GPIOxEN occupy bits 0..=8, one per bank
    pub const AHB2ENR: usize = 0x08C;
    pub const AHB2ENR_RNGEN: u32 = bit(18);

    pub const APB1LENR: usize = 0x09C;
    pub const APB1LENR_USART2EN: u32 = bit(17);
    pub const APB1LENR_USART3EN: u32 = bit(18);

    pub const APB2ENR: usize = 0x0A4;
    pub const APB2ENR_USART1EN: u32 = bit(14);

    pub const APB3ENR: usize = 0x0A8;
    pub const APB3ENR_SBSEN: u32 = bit(1);

    pub const CCIPR5: usize = 0x0E8;
    pub const CCIPR5_RNGSEL_MASK: u32 = 0b11 << 4;
    /// RNGSEL = 01: pll1_q_ck
    pub const CCIPR5_RNGSEL_PLL1Q: u32 = 0b01 << 4;
}

pub mod pwr {
    use super::bit;

    pub const BASE: usize = 0x4402_0800;

    pub const VOSCR: usize = 0x10;
    pub const VOSCR_VOS1: u32 = 0b10 << 4;
    pub const VOSCR_VOS0: u32 = 0b11 << 4;

    pub const VOSSR: usize = 0x14;
    pub const VOSSR_ACTVOSRDY: u32 = bit(13);

    pub const SCCR: usize = 0x30;
    pub const SCCR_LDOEN: u32 = bit(8);
}

pub mod flash {
    pub const BASE: usize = 0x4002_2000;

    pub const ACR: usize = 0x00;
    pub const ACR_LATENCY_MASK: u32 = 0xF;
    pub const ACR_WRHIGHFREQ_POS: u32 = 4;
    pub const ACR_WRHIGHFREQ_MASK: u32 = 0b11 << 4;
}

pub mod usart {
    use super::bit;

    pub const USART1: usize = 0x4001_3800;
    pub const USART2: usize = 0x4000_4400;
    pub const USART3: usize = 0x4000_4800;

    pub const CR1: usize = 0x00;
    pub const CR1_UE: u32 = bit(0);
    pub const CR1_RE: u32 = bit(2);
    pub const CR1_TE: u32 = bit(3);

    pub const BRR: usize = 0x0C;

    pub const ISR: usize = 0x1C;
    pub const ISR_RXNE: u32 = bit(5);
    /// Transmission complete: shift register and data register both empty
    pub const ISR_TC: u32 = bit(6);
    /// TXE (TXFNF with the FIFO enabled): data register can take a byte
    pub const ISR_TXE: u32 = bit(7);

    pub const RDR: usize = 0x24;
    pub const TDR: usize = 0x28;
}

pub mod rng {
    use super::bit;

    pub const BASE: usize = 0x420C_0800;

    pub const CR: usize = 0x00;
    pub const CR_RNGEN: u32 = bit(2);

    pub const SR: usize = 0x04;
    pub const SR_DRDY: u32 = bit(0);

    pub const DR: usize = 0x08;
}

pub mod sbs {
    pub const BASE: usize = 0x4400_0400;

    pub const PMCR: usize = 0x100;
    pub const PMCR_ETH_SEL_PHY_MASK: u32 = 0b111 << 21;
    pub const PMCR_ETH_SEL_PHY_RMII: u32 = 0b100 << 21;
}

pub mod nvic {
    /// ISER0; ISERn follow every 4 bytes
    pub const ISER: usize = 0xE000_E100;
}

pub mod scb {
    pub const CPACR: usize = 0xE000_ED88;
    /// Full access for coprocessors CP10 and CP11
    pub const CPACR_FPU_FULL: u32 = (0b11 << 20) | (0b11 << 22);
}

pub mod uid {
    /// 96-bit unique device identifier, word reads only
    pub const BASE: usize = 0x08FF_F800;
}

/// Interrupt numbers used by this crate
pub mod irq {
    pub const ETH: u16 = 106;
}
