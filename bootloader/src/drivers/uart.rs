// i.MX UART driver for the early console
// Polled transmit only; the boot ROM leaves the pads and clock root to us.

use bitflags::bitflags;
use moduline_api::RegisterAccess;

const UTXD: usize = 0x40;
const UCR1: usize = 0x80;
const UCR2: usize = 0x84;
const UCR3: usize = 0x88;
const UCR4: usize = 0x8c;
const UFCR: usize = 0x90;
const UESC: usize = 0x9c;
const UTIM: usize = 0xa0;
const UBIR: usize = 0xa4;
const UBMR: usize = 0xa8;
const UTS: usize = 0xb4;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ucr2: u32 {
        const SRST = 1 << 0;
        const RXEN = 1 << 1;
        const TXEN = 1 << 2;
        const WS = 1 << 5;
        const IRTS = 1 << 14;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Uts: u32 {
        const TXEMPTY = 1 << 6;
        const TXFULL = 1 << 4;
    }
}

const UCR1_UARTEN: u32 = 1 << 0;
const UCR3_RXDMUXSEL: u32 = 1 << 2;
const UCR3_DSR: u32 = 1 << 10;
const UCR3_DCD: u32 = 1 << 9;
const UCR3_RI: u32 = 1 << 8;
const UCR3_ADNIMP: u32 = 1 << 7;
const UCR4_CTSTL_32: u32 = 32 << 10;

// RFDIV = divide by 1, TX threshold 2, RX threshold 1
const UFCR_DEFAULT: u32 = (0b101 << 7) | (2 << 10) | 1;

/// Polled i.MX UART
pub struct ImxUart<R: RegisterAccess> {
    regs: R,
    base: usize,
}

impl<R: RegisterAccess> ImxUart<R> {
    pub fn new(regs: R, base: usize) -> Self {
        Self { regs, base }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Configure for 8N1 at `baud` from a `ref_clk_hz` module clock
    pub fn setup(&mut self, ref_clk_hz: u32, baud: u32) {
        let base = self.base;
        self.regs.write32(base + UCR1, 0);
        self.regs.write32(base + UCR2, 0);
        self.regs.write32(base + UCR2, (Ucr2::IRTS | Ucr2::WS | Ucr2::TXEN | Ucr2::RXEN | Ucr2::SRST).bits());
        self.regs.write32(base + UCR3, UCR3_DSR | UCR3_DCD | UCR3_RI | UCR3_ADNIMP | UCR3_RXDMUXSEL);
        self.regs.write32(base + UCR4, UCR4_CTSTL_32);
        self.regs.write32(base + UFCR, UFCR_DEFAULT);
        self.regs.write32(base + UESC, 0x2b);
        self.regs.write32(base + UTIM, 0);
        self.regs.write32(base + UBIR, 0xf);
        self.regs.write32(base + UBMR, Self::ubmr(ref_clk_hz, baud));
        self.regs.write32(base + UCR1, UCR1_UARTEN);
    }

    /// Bit-rate modulator for UBIR = 15: `ref / baud - 1`
    pub const fn ubmr(ref_clk_hz: u32, baud: u32) -> u32 {
        ref_clk_hz / baud - 1
    }

    pub fn putc(&mut self, byte: u8) {
        while Uts::from_bits_truncate(self.regs.read32(self.base + UTS)).contains(Uts::TXFULL) {
            core::hint::spin_loop();
        }
        self.regs.write32(self.base + UTXD, byte as u32);
    }

    pub fn flush(&mut self) {
        while !Uts::from_bits_truncate(self.regs.read32(self.base + UTS)).contains(Uts::TXEMPTY) {
            core::hint::spin_loop();
        }
    }
}
