//! The seam between the transfer protocol and the hardware.
//!
//! The control loop and the interrupt handlers only ever talk to these two
//! traits. The real implementation for the STM32F303 lives in
//! [`stm32f303`](crate::stm32f303); tests substitute scripted fakes.

use core::fmt;

use crate::descriptor::TransferDescriptor;
use crate::ConfigError;

/// Masked interrupt cause bits reported by a transfer engine.
///
/// [`COMPLETION`](Self::COMPLETION) is the only cause the protocol knows;
/// an engine may report further implementation-specific bits, and any status
/// other than exactly `COMPLETION` is treated as a fault. A status of
/// [`NONE`](Self::NONE) means the interrupt fired with no cause at all,
/// which is just as much a fault.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IrqStatus(u32);

impl IrqStatus {
    /// No cause bits set.
    pub const NONE: Self = Self(0);
    /// The in-flight transfer ran to completion.
    pub const COMPLETION: Self = Self(1 << 0);
    /// The engine aborted the transfer, e.g. on a bus error.
    pub const TRANSFER_ERROR: Self = Self(1 << 1);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for IrqStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A memory-to-memory transfer engine.
///
/// The fallible operations reject bad configuration with a
/// [`ConfigError`]; the caller treats any rejection as fatal.
pub trait TransferEngine {
    /// One-time channel setup: transfer direction, address increment mode
    /// and interrupt unmasking. Called once before the first transfer.
    fn init_channel(&mut self) -> Result<(), ConfigError>;

    /// Installs the descriptor for the next transfer. Must not be called
    /// while a transfer is in flight.
    fn set_descriptor(&mut self, descriptor: &TransferDescriptor) -> Result<(), ConfigError>;

    /// Makes the channel ready to accept a trigger. No data moves yet.
    fn enable(&mut self);

    /// Stops the channel. Safe to call at any time, including when no
    /// transfer is in flight.
    fn disable(&mut self);

    /// Kicks off the transfer described by the installed descriptor.
    fn software_trigger(&mut self) -> Result<(), ConfigError>;

    /// Interrupt cause bits, masked to the causes that are unmasked on the
    /// channel. Interrupt context.
    fn masked_irq_status(&mut self) -> IrqStatus;

    /// Acknowledges the cause bits in `status` so the interrupt does not
    /// re-fire. Interrupt context.
    fn clear_irq(&mut self, status: IrqStatus);
}

/// The edge-triggered line a human pokes to request a transfer.
pub trait TriggerLine {
    /// Acknowledges the latched edge. Without this the interrupt re-fires
    /// forever. Interrupt context.
    fn clear_edge(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_a_single_bit() {
        assert_eq!(IrqStatus::COMPLETION.bits(), 1);
        assert_ne!(IrqStatus::COMPLETION, IrqStatus::TRANSFER_ERROR);
    }

    #[test]
    fn contains_checks_all_bits() {
        let both = IrqStatus::from_bits(0b11);
        assert!(both.contains(IrqStatus::COMPLETION));
        assert!(both.contains(IrqStatus::TRANSFER_ERROR));
        assert!(!IrqStatus::COMPLETION.contains(both));
        // Exact equality is what the completion handler checks, and a
        // superset of COMPLETION must not pass it.
        assert_ne!(both, IrqStatus::COMPLETION);
    }
}
