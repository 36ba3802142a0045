//! Interrupt handler bodies.
//!
//! The `#[interrupt]` entry points in the firmware are one-line shims that
//! delegate here, so the handler logic itself is plain code that host tests
//! can drive directly. Handlers never panic and never block; anything
//! unexpected is latched in the fault cell for the control loop to act on.

use crate::engine::{IrqStatus, TransferEngine, TriggerLine};
use crate::flag::TransferSignals;

/// Body of the button edge interrupt.
///
/// Acknowledges the latched edge first, then marks a transfer as requested.
/// Edges arriving while a transfer is already pending or in flight only
/// re-set the flag; they do not queue.
pub fn on_trigger_edge<L: TriggerLine>(line: &mut L, signals: &TransferSignals) {
    line.clear_edge();
    signals.trigger.set();
}

/// Body of the transfer engine interrupt.
///
/// The masked cause must be exactly [`IrqStatus::COMPLETION`]. Completion
/// plus any extra bit, a different cause, or no cause at all means the
/// engine is in a state this protocol does not understand, and the cycle
/// must not be reported as done; the cause is latched as a fault instead
/// and the completion flag stays untouched.
pub fn on_engine_irq<E: TransferEngine>(engine: &mut E, signals: &TransferSignals) {
    let status = engine.masked_irq_status();
    if status == IrqStatus::COMPLETION {
        engine.clear_irq(IrqStatus::COMPLETION);
        signals.complete.set();
    } else {
        signals.fault.raise(status);
    }
}
