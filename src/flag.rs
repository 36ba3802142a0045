//! Interrupt-to-foreground signalling.
//!
//! Each flag has exactly one writer and one reader: the interrupt handler
//! sets, the control loop reads and clears. `set` publishes with `Release`
//! and `read` observes with `Acquire`, so everything the handler wrote
//! before setting the flag is visible to the loop once it sees the flag.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;

use crate::engine::IrqStatus;

/// One-bit event channel between an interrupt handler and the control loop.
pub struct EventFlag(AtomicBool);

impl EventFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Marks the event as pending. Interrupt side.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns whether the event is pending, without consuming it.
    pub fn read(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Resets the flag. Control loop side only.
    pub fn clear(&self) {
        // Ordering against a trigger write that follows is the caller's
        // business; the controller fences before starting the engine.
        self.0.store(false, Ordering::Relaxed);
    }

    /// Spins until the flag is set, sleeping `poll_interval_us` between
    /// polls so the bus is not hammered. There is no timeout; a flag that
    /// never arrives blocks forever.
    pub fn wait_with_backoff<D: DelayNs>(&self, delay: &mut D, poll_interval_us: u32) {
        while !self.read() {
            delay.delay_us(poll_interval_us);
        }
    }
}

impl Default for EventFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Latches an anomalous interrupt cause for the control loop to pick up.
///
/// Interrupt handlers must not panic, so a handler that observes a cause it
/// does not understand records it here instead. The record is sticky until
/// taken; the control loop turns it into a fatal error.
pub struct FaultCell {
    status: AtomicU32,
    raised: AtomicBool,
}

impl FaultCell {
    pub const fn new() -> Self {
        Self {
            status: AtomicU32::new(0),
            raised: AtomicBool::new(false),
        }
    }

    /// Records `status` as a fault. Interrupt side.
    pub fn raise(&self, status: IrqStatus) {
        self.status.store(status.bits(), Ordering::Relaxed);
        // Publish the payload before the raised bit.
        self.raised.store(true, Ordering::Release);
    }

    /// Takes the recorded fault, if any, clearing the cell.
    pub fn take(&self) -> Option<IrqStatus> {
        if self.raised.load(Ordering::Acquire) {
            self.raised.store(false, Ordering::Relaxed);
            Some(IrqStatus::from_bits(self.status.load(Ordering::Relaxed)))
        } else {
            None
        }
    }
}

impl Default for FaultCell {
    fn default() -> Self {
        Self::new()
    }
}

/// The shared state between the two interrupt handlers and the control loop.
///
/// Lives in a `static` so the handlers can reach it:
///
/// ```ignore
/// static SIGNALS: TransferSignals = TransferSignals::new();
/// ```
pub struct TransferSignals {
    /// A button edge was observed and a transfer should run.
    pub trigger: EventFlag,
    /// The in-flight transfer finished with the expected cause.
    pub complete: EventFlag,
    /// An interrupt fired with a cause the handler did not expect.
    pub fault: FaultCell,
}

impl TransferSignals {
    pub const fn new() -> Self {
        Self {
            trigger: EventFlag::new(),
            complete: EventFlag::new(),
            fault: FaultCell::new(),
        }
    }
}
