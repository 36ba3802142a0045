//! STM32F303 bindings: DMA1 channel 1 as the transfer engine, EXTI line 0
//! (the user button on PA0) as the trigger line.
//!
//! On this DMA the channel enable bit doubles as the software trigger: a
//! memory-to-memory channel starts moving data the moment `EN` is set. The
//! [`TransferEngine`] mapping therefore uses [`enable`](TransferEngine::enable)
//! to flush stale status flags and
//! [`software_trigger`](TransferEngine::software_trigger) to set `EN`.

use cortex_m::asm;
use embedded_hal::delay::DelayNs;
use stm32f3::stm32f303 as pac;

use crate::descriptor::{ElementWidth, TransferDescriptor};
use crate::engine::{IrqStatus, TransferEngine, TriggerLine};
use crate::ConfigError;

/// DMA1 channel 1 in memory-to-memory mode.
pub struct CopyChannel {
    dma: pac::DMA1,
}

impl CopyChannel {
    /// Takes ownership of the DMA peripheral and switches its clock on.
    pub fn new(dma: pac::DMA1, rcc: &pac::RCC) -> Self {
        rcc.ahbenr.modify(|_, w| w.dma1en().enabled());
        Self { dma }
    }

    /// Handle for use inside the `DMA1_CH1` interrupt handler.
    ///
    /// # Safety
    ///
    /// The returned handle aliases the DMA1 register block owned by the
    /// foreground [`CopyChannel`]. It must only be used from the
    /// `DMA1_CH1` interrupt handler, and only for
    /// [`masked_irq_status`](TransferEngine::masked_irq_status) and
    /// [`clear_irq`](TransferEngine::clear_irq); the channel configuration
    /// registers stay under foreground control.
    pub unsafe fn isr_handle() -> Self {
        Self {
            dma: pac::Peripherals::steal().DMA1,
        }
    }
}

impl TransferEngine for CopyChannel {
    fn init_channel(&mut self) -> Result<(), ConfigError> {
        // Memory-to-memory with both addresses incrementing. The "source"
        // rides the peripheral side of the channel. Completion and error
        // interrupts unmasked; anything else observed in the handler is a
        // protocol fault.
        self.dma.ch1.cr.write(|w| {
            w.dir().from_peripheral();
            w.pinc().enabled();
            w.minc().enabled();
            w.mem2mem().enabled();
            w.tcie().set_bit();
            w.teie().set_bit()
        });
        Ok(())
    }

    fn set_descriptor(&mut self, descriptor: &TransferDescriptor) -> Result<(), ConfigError> {
        self.dma.ch1.cr.modify(|_, w| match descriptor.width() {
            ElementWidth::Bits8 => w.psize().bits8().msize().bits8(),
            ElementWidth::Bits16 => w.psize().bits16().msize().bits16(),
            ElementWidth::Bits32 => w.psize().bits32().msize().bits32(),
        });
        self.dma
            .ch1
            .par
            .write(|w| w.pa().bits(descriptor.source_addr() as u32));
        self.dma
            .ch1
            .mar
            .write(|w| w.ma().bits(descriptor.destination_addr() as u32));
        // Validated against MAX_COUNT when the descriptor was built.
        self.dma
            .ch1
            .ndtr
            .write(|w| w.ndt().bits(descriptor.count() as u16));
        Ok(())
    }

    fn enable(&mut self) {
        // Flush stale channel events so the upcoming transfer starts from
        // a clean status word.
        self.dma.ifcr.write(|w| w.cgif1().set_bit());
    }

    fn disable(&mut self) {
        self.dma.ch1.cr.modify(|_, w| w.en().disabled());
    }

    fn software_trigger(&mut self) -> Result<(), ConfigError> {
        self.dma.ch1.cr.modify(|_, w| w.en().enabled());
        Ok(())
    }

    fn masked_irq_status(&mut self) -> IrqStatus {
        let isr = self.dma.isr.read();
        let cr = self.dma.ch1.cr.read();
        let mut bits = 0;
        if isr.tcif1().bit_is_set() && cr.tcie().bit_is_set() {
            bits |= IrqStatus::COMPLETION.bits();
        }
        if isr.teif1().bit_is_set() && cr.teie().bit_is_set() {
            bits |= IrqStatus::TRANSFER_ERROR.bits();
        }
        IrqStatus::from_bits(bits)
    }

    fn clear_irq(&mut self, status: IrqStatus) {
        self.dma.ifcr.write(|w| {
            if status.contains(IrqStatus::COMPLETION) {
                w.ctcif1().set_bit();
            }
            if status.contains(IrqStatus::TRANSFER_ERROR) {
                w.cteif1().set_bit();
            }
            w
        });
    }
}

/// EXTI line 0, wired to the user button on PA0.
pub struct ButtonLine {
    exti: pac::EXTI,
}

impl ButtonLine {
    /// Takes ownership of the EXTI peripheral.
    ///
    /// The caller is responsible for routing PA0 to EXTI line 0 via
    /// `SYSCFG_EXTICR1` before edges are expected.
    pub fn new(exti: pac::EXTI) -> Self {
        Self { exti }
    }

    /// Selects the rising edge and unmasks the line.
    pub fn listen_rising_edge(&mut self) {
        self.exti.rtsr1.modify(|_, w| w.tr0().set_bit());
        self.exti.imr1.modify(|_, w| w.mr0().set_bit());
    }

    /// Handle for use inside the `EXTI0` interrupt handler.
    ///
    /// # Safety
    ///
    /// The returned handle aliases the EXTI register block owned by the
    /// foreground [`ButtonLine`]. It must only be used from the `EXTI0`
    /// interrupt handler, and only for
    /// [`clear_edge`](TriggerLine::clear_edge).
    pub unsafe fn isr_handle() -> Self {
        Self {
            exti: pac::Peripherals::steal().EXTI,
        }
    }
}

impl TriggerLine for ButtonLine {
    fn clear_edge(&mut self) {
        // Write-one-to-clear. Leaving the latch set re-fires the interrupt
        // endlessly.
        self.exti.pr1.write(|w| w.pr0().set_bit());
    }
}

/// Busy-wait delay for the poll loop, counted in core clock cycles.
pub struct CycleDelay {
    sysclk_hz: u32,
}

impl CycleDelay {
    pub const fn new(sysclk_hz: u32) -> Self {
        Self { sysclk_hz }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (u64::from(ns) * u64::from(self.sysclk_hz)).div_ceil(1_000_000_000);
        asm::delay(cycles as u32);
    }
}
