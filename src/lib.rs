//! Interrupt-driven memory-to-memory copies with verified results.
//!
//! A button edge requests a transfer, a DMA engine moves the data, and the
//! completion interrupt reports back; the control loop in between owns all
//! the state and checks every copy against its source before declaring it
//! done. Any deviation the hardware reports becomes a typed [`Error`]
//! handed to the caller, which is expected to halt rather than retry.
//!
//! The hardware is reached only through the [`TransferEngine`] and
//! [`TriggerLine`] traits, so the whole protocol runs unmodified against
//! scripted engines on the host. [`stm32f303`] binds it to real hardware.

#![no_std]

use core::fmt;

mod controller;
mod descriptor;
mod engine;
mod flag;
pub mod handlers;
pub mod stm32f303;
mod traits;
mod verify;

pub use controller::{ControllerConfig, CycleReport, TransferController};
pub use descriptor::{ElementWidth, TransferDescriptor};
pub use engine::{IrqStatus, TransferEngine, TriggerLine};
pub use flag::{EventFlag, FaultCell, TransferSignals};
pub use traits::{CopyTarget, DestinationBuffer, SourceBuffer};
pub use verify::verify;

/// A fatal transfer fault.
///
/// Nothing in here is recoverable by this crate's lights: configuration was
/// wrong, the hardware did something the protocol does not understand, or
/// the copied data is provably bad. The supervisor that receives one of
/// these halts the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The engine or the descriptor rejected the requested configuration.
    Config(ConfigError),
    /// The engine interrupt fired with a cause other than exactly
    /// "transfer complete".
    UnexpectedIrq(IrqStatus),
    /// Verification found the destination differing from the source.
    Mismatch {
        /// Element index of the first difference.
        index: usize,
    },
}

/// Reasons a transfer configuration is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Source and destination regions share bytes.
    RegionsOverlap,
    /// The destination cannot hold the source.
    DestinationTooSmall { needed: usize, actual: usize },
    /// The source region is empty.
    EmptyTransfer,
    /// More elements than a channel transfer counter can hold.
    CountTooLarge { count: usize },
    /// A region does not start on an element boundary.
    Misaligned { addr: usize },
    /// The source length is not a whole number of elements.
    RaggedLength { len: usize },
    /// The engine refused the operation with an implementation-specific
    /// code.
    Rejected { code: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(err) => write!(f, "configuration rejected: {}", err),
            Error::UnexpectedIrq(status) => {
                write!(f, "unexpected transfer interrupt cause {}", status)
            }
            Error::Mismatch { index } => {
                write!(f, "destination differs from source at element {}", index)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::RegionsOverlap => write!(f, "source and destination overlap"),
            ConfigError::DestinationTooSmall { needed, actual } => {
                write!(
                    f,
                    "destination too small: need {} bytes, have {}",
                    needed, actual
                )
            }
            ConfigError::EmptyTransfer => write!(f, "nothing to transfer"),
            ConfigError::CountTooLarge { count } => {
                write!(f, "element count {} exceeds the channel counter", count)
            }
            ConfigError::Misaligned { addr } => {
                write!(f, "region at {:#010x} is not element-aligned", addr)
            }
            ConfigError::RaggedLength { len } => {
                write!(
                    f,
                    "length of {} bytes is not a whole number of elements",
                    len
                )
            }
            ConfigError::Rejected { code } => {
                write!(f, "engine rejected the operation (code {:#x})", code)
            }
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;
