//! Button-triggered DMA memory copy on the STM32F303.
//!
//! Each press of the user button (PA0) copies a 32-word pattern from one
//! SRAM buffer to another through DMA1 channel 1 and prints the verified
//! destination over semihosting. Any fault halts with a panic message.
//!
//! Runs on the reset clock (8 MHz HSI); no clock tree setup required.

#![no_std]
#![no_main]

use core::ptr::addr_of_mut;

use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use cortex_m_semihosting::{hprint, hprintln};
use panic_semihosting as _;
use stm32f3::stm32f303 as pac;
use stm32f3::stm32f303::interrupt;

use dma_memcopy::handlers;
use dma_memcopy::stm32f303::{ButtonLine, CopyChannel, CycleDelay};
use dma_memcopy::{ControllerConfig, CycleReport, TransferController, TransferSignals};

const SYSCLK_HZ: u32 = 8_000_000;

const WORDS: usize = 32;

#[rustfmt::skip]
static SRC: [u32; WORDS] = [
    0x1000_0000, 0x1000_0001, 0x1000_0002, 0x1000_0003,
    0x1000_0004, 0x1000_0005, 0x1000_0006, 0x1000_0007,
    0x1000_0008, 0x1000_0009, 0x1000_000A, 0x1000_000B,
    0x1000_000C, 0x1000_000D, 0x1000_000E, 0x1000_000F,
    0x2000_0000, 0x2000_0001, 0x2000_0002, 0x2000_0003,
    0x2000_0004, 0x2000_0005, 0x2000_0006, 0x2000_0007,
    0x2000_0008, 0x2000_0009, 0x2000_000A, 0x2000_000B,
    0x2000_000C, 0x2000_000D, 0x2000_000E, 0x2000_000F,
];

static mut DST: [u32; WORDS] = [0; WORDS];

static SIGNALS: TransferSignals = TransferSignals::new();

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();

    hprintln!("DMA memory-to-memory copy").unwrap();

    // Route PA0 to EXTI line 0 and arm the button interrupt.
    dp.RCC.ahbenr.modify(|_, w| w.iopaen().enabled());
    dp.RCC.apb2enr.modify(|_, w| w.syscfgen().enabled());
    dp.SYSCFG
        .exticr1
        .modify(|_, w| unsafe { w.exti0().bits(0b000) });
    let mut button = ButtonLine::new(dp.EXTI);
    // Drop any edge latched before we were listening.
    button.clear_edge();
    button.listen_rising_edge();

    let engine = CopyChannel::new(dp.DMA1, &dp.RCC);
    let dst = unsafe { &mut *addr_of_mut!(DST) };

    let mut controller = match TransferController::new(
        engine,
        &SRC,
        dst,
        &SIGNALS,
        CycleDelay::new(SYSCLK_HZ),
        ControllerConfig::default(),
    ) {
        Ok(controller) => controller,
        Err(err) => panic!("setup failed: {}", err),
    };

    NVIC::unpend(pac::Interrupt::EXTI0);
    NVIC::unpend(pac::Interrupt::DMA1_CH1);
    unsafe {
        NVIC::unmask(pac::Interrupt::EXTI0);
        NVIC::unmask(pac::Interrupt::DMA1_CH1);
    }

    hprintln!("press the user button to start a transfer").unwrap();

    let err = match controller.run(print_cycle) {
        Ok(never) => match never {},
        Err(err) => err,
    };
    panic!("transfer fault: {}", err);
}

fn print_cycle(cycle: &CycleReport<'_>) {
    hprintln!("transfer of {} words verified, destination:", cycle.elements()).unwrap();
    for (idx, chunk) in cycle.destination.chunks_exact(4).enumerate() {
        let word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if idx % 4 == 3 {
            hprintln!("0x{:08X}", word).unwrap();
        } else {
            hprint!("0x{:08X} ", word).unwrap();
        }
    }
    hprintln!("press the user button for the next transfer").unwrap();
}

#[interrupt]
fn EXTI0() {
    // Safety: touches only the EXTI pending register; the foreground does
    // not.
    let mut line = unsafe { ButtonLine::isr_handle() };
    handlers::on_trigger_edge(&mut line, &SIGNALS);
}

#[interrupt]
fn DMA1_CH1() {
    // Safety: touches only the DMA status and clear registers; the channel
    // configuration stays with the foreground.
    let mut channel = unsafe { CopyChannel::isr_handle() };
    handlers::on_engine_irq(&mut channel, &SIGNALS);
}
